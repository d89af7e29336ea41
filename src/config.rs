use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::optimizer::SearchConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub solver: SolverConfig,
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            solver: SolverConfig::from_env(),
            batch: BatchConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const HOST_VAR: &'static str = "KNAPSACK2D_API_HOST";
    const PORT_VAR: &'static str = "KNAPSACK2D_API_PORT";
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        Self::from_values(env_string(Self::HOST_VAR), env_string(Self::PORT_VAR))
    }

    /// Builds the configuration from raw host and port values.
    ///
    /// Missing or unusable values fall back to `0.0.0.0:8080`.
    fn from_values(host: Option<String>, port: Option<String>) -> Self {
        let (bind_ip, display_host) = host
            .and_then(|raw| parse_host(&raw).map(|ip| (ip, raw)))
            .unwrap_or_else(|| {
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            });
        let port = port
            .and_then(|raw| parse_port(&raw))
            .unwrap_or(Self::DEFAULT_PORT);

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Host as configured, used in log hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the server listens on the unspecified address.
    pub fn binds_to_all_interfaces(&self) -> bool {
        self.bind_ip.is_unspecified()
    }

    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

fn parse_host(raw: &str) -> Option<IpAddr> {
    match raw.parse::<IpAddr>() {
        Ok(ip) => Some(ip),
        Err(err) => {
            tracing::warn!(
                "⚠️ {} ('{}') is not an IP address: {}. Using {}.",
                ApiConfig::HOST_VAR,
                raw,
                err,
                ApiConfig::DEFAULT_HOST
            );
            None
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => {
            tracing::warn!(
                "⚠️ {} must not be 0. Using {}.",
                ApiConfig::PORT_VAR,
                ApiConfig::DEFAULT_PORT
            );
            None
        }
        Ok(port) => Some(port),
        Err(err) => {
            tracing::warn!(
                "⚠️ {} ('{}') is not a port number: {}. Using {}.",
                ApiConfig::PORT_VAR,
                raw,
                err,
                ApiConfig::DEFAULT_PORT
            );
            None
        }
    }
}

/// Size limits applied to incoming requests before a search starts.
///
/// The search is exhaustive and grows exponentially with the item count, so
/// the HTTP layer refuses problems above these bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_items: usize,
    pub max_cells: usize,
    pub max_classic_capacity: usize,
}

impl RequestLimits {
    pub const DEFAULT_MAX_ITEMS: usize = 8;
    pub const DEFAULT_MAX_CELLS: usize = 64;
    pub const DEFAULT_MAX_CLASSIC_CAPACITY: usize = 1_000_000;

    /// Checks a shaped problem against the limits.
    pub fn admit_shaped(&self, items: usize, cells: usize) -> Result<(), String> {
        if items > self.max_items {
            return Err(format!(
                "{} items exceed the limit of {}",
                items, self.max_items
            ));
        }
        if cells > self.max_cells {
            return Err(format!(
                "container with {} cells exceeds the limit of {}",
                cells, self.max_cells
            ));
        }
        Ok(())
    }

    /// Checks a classic problem's capacity against the limits.
    pub fn admit_classic(&self, capacity: u64) -> Result<usize, String> {
        match usize::try_from(capacity) {
            Ok(value) if value <= self.max_classic_capacity => Ok(value),
            _ => Err(format!(
                "capacity {} exceeds the limit of {}",
                capacity, self.max_classic_capacity
            )),
        }
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_items: Self::DEFAULT_MAX_ITEMS,
            max_cells: Self::DEFAULT_MAX_CELLS,
            max_classic_capacity: Self::DEFAULT_MAX_CLASSIC_CAPACITY,
        }
    }
}

/// Configuration for the packing search.
#[derive(Clone, Debug, Default)]
pub struct SolverConfig {
    search: SearchConfig,
    limits: RequestLimits,
}

impl SolverConfig {
    const MAX_ITEMS_VAR: &'static str = "KNAPSACK2D_MAX_ITEMS";
    const MAX_CELLS_VAR: &'static str = "KNAPSACK2D_MAX_CELLS";
    const MAX_CLASSIC_CAPACITY_VAR: &'static str = "KNAPSACK2D_MAX_CLASSIC_CAPACITY";
    const ORDERED_CHILDREN_VAR: &'static str = "KNAPSACK2D_ORDERED_CHILDREN";

    fn from_env() -> Self {
        let max_items = load_usize_with_warning(
            Self::MAX_ITEMS_VAR,
            RequestLimits::DEFAULT_MAX_ITEMS,
            |value| value > 0,
            "must be greater than 0",
            "Warning: Raising the item limit can make searches run for a very long time",
        );

        let max_cells = load_usize_with_warning(
            Self::MAX_CELLS_VAR,
            RequestLimits::DEFAULT_MAX_CELLS,
            |value| value > 0,
            "must be greater than 0",
            "Warning: Adjusted container size limit changes the admissible search space",
        );

        let max_classic_capacity = load_usize_with_warning(
            Self::MAX_CLASSIC_CAPACITY_VAR,
            RequestLimits::DEFAULT_MAX_CLASSIC_CAPACITY,
            |value| value > 0,
            "must be greater than 0",
            "Warning: Adjusted classic capacity limit changes the memory bound of /knapsack",
        );

        let ordered_children = env_string(Self::ORDERED_CHILDREN_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ORDERED_CHILDREN_VAR))
            .unwrap_or(SearchConfig::DEFAULT_ORDERED_CHILDREN);

        Self {
            search: SearchConfig::builder()
                .ordered_children(ordered_children)
                .build(),
            limits: RequestLimits {
                max_items,
                max_cells,
                max_classic_capacity,
            },
        }
    }

    /// Returns the configured SearchConfig.
    pub fn search_config(&self) -> SearchConfig {
        self.search
    }

    /// Returns the request admission limits.
    pub fn limits(&self) -> RequestLimits {
        self.limits
    }
}

/// One-shot mode: solve a problem file and exit instead of serving HTTP.
#[derive(Clone, Debug, Default)]
pub struct BatchConfig {
    input_file: Option<PathBuf>,
}

impl BatchConfig {
    const INPUT_FILE_VAR: &'static str = "KNAPSACK2D_INPUT_FILE";

    fn from_env() -> Self {
        Self {
            input_file: env_string(Self::INPUT_FILE_VAR).map(PathBuf::from),
        }
    }

    /// Problem file to solve, if batch mode is requested.
    pub fn input_file(&self) -> Option<&PathBuf> {
        self.input_file.as_ref()
    }
}

/// Filter directive for the tracing subscriber.
pub fn log_filter() -> String {
    env_string("KNAPSACK2D_LOG").unwrap_or_else(|| "info".to_string())
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            tracing::warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name,
                err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            tracing::warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name,
                other
            );
            None
        }
    }
}

fn load_usize_with_warning(
    var_name: &str,
    default: usize,
    validator: impl Fn(usize) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> usize {
    match env_string(var_name) {
        Some(raw) => parse_usize_with_warning(&raw, var_name, default, validator, invalid_hint, warning),
        None => default,
    }
}

fn parse_usize_with_warning(
    raw: &str,
    var_name: &str,
    default: usize,
    validator: impl Fn(usize) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> usize {
    match raw.parse::<usize>() {
        Ok(value) if validator(value) => {
            if value != default {
                tracing::info!("⚠️ {} ({} = {}).", warning, var_name, value);
            }
            value
        }
        Ok(_) => {
            tracing::warn!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name,
                raw,
                invalid_hint,
                default
            );
            default
        }
        Err(err) => {
            tracing::warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        assert_eq!(parse_bool("1", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("true", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("yes", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("y", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("on", "TEST_VAR"), Some(true));

        // Test case insensitivity
        assert_eq!(parse_bool("TRUE", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("On", "TEST_VAR"), Some(true));

        // Test with whitespace
        assert_eq!(parse_bool(" true ", "TEST_VAR"), Some(true));
    }

    #[test]
    fn test_parse_bool_false_values() {
        assert_eq!(parse_bool("0", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("false", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("no", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("n", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("OFF", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("  0  ", "TEST_VAR"), Some(false));
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn numeric_values_fall_back_to_default() {
        let positive = |v: usize| v > 0;
        assert_eq!(parse_usize_with_warning("12", "TEST_VAR", 8, positive, "", ""), 12);
        assert_eq!(parse_usize_with_warning("0", "TEST_VAR", 8, positive, "", ""), 8);
        assert_eq!(parse_usize_with_warning("-3", "TEST_VAR", 8, positive, "", ""), 8);
        assert_eq!(parse_usize_with_warning("many", "TEST_VAR", 8, positive, "", ""), 8);
    }

    #[test]
    fn limits_admit_small_problems() {
        let limits = RequestLimits::default();
        assert!(limits.admit_shaped(3, 12).is_ok());
        assert!(limits.admit_shaped(RequestLimits::DEFAULT_MAX_ITEMS + 1, 12).is_err());
        assert!(limits.admit_shaped(2, RequestLimits::DEFAULT_MAX_CELLS + 1).is_err());
    }

    #[test]
    fn limits_bound_classic_capacity() {
        let limits = RequestLimits {
            max_classic_capacity: 100,
            ..RequestLimits::default()
        };
        assert_eq!(limits.admit_classic(100), Ok(100));
        assert!(limits.admit_classic(101).is_err());
        assert!(limits.admit_classic(u64::MAX).is_err());
    }

    #[test]
    fn api_config_defaults_without_values() {
        let config = ApiConfig::from_values(None, None);
        assert_eq!(config.port(), 8080);
        assert!(config.binds_to_all_interfaces());
        assert!(config.uses_default_host());
    }

    #[test]
    fn api_config_accepts_explicit_host_and_port() {
        let config = ApiConfig::from_values(Some("127.0.0.1".into()), Some("9000".into()));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.display_host(), "127.0.0.1");
        assert!(!config.binds_to_all_interfaces());
    }

    #[test]
    fn api_config_rejects_bad_host_and_zero_port() {
        let config = ApiConfig::from_values(Some("not-an-ip".into()), Some("0".into()));
        assert!(config.uses_default_host());
        assert_eq!(config.port(), 8080);
        assert_eq!(parse_port("70000"), None);
    }
}
