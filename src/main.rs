// src/main.rs
use std::process::ExitCode;

use knapsack2d::analyzer::Analysis;
use knapsack2d::api;
use knapsack2d::config::{self, AppConfig};
use knapsack2d::loader;
use knapsack2d::optimizer::SolutionTree;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> ExitCode {
    let env_result = dotenvy::dotenv();

    fmt()
        .with_env_filter(EnvFilter::new(config::log_filter()))
        .with_target(false)
        .init();

    if let Err(err) = env_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    if let Some(path) = app_config.batch.input_file() {
        return run_batch(path, &app_config);
    }

    tracing::info!("🚀 Knapsack service starting...");
    api::start_api_server(app_config.api.clone(), app_config.solver.clone()).await;
    ExitCode::SUCCESS
}

/// Solves a single problem file and prints the answers as JSON.
fn run_batch(path: &std::path::Path, app_config: &AppConfig) -> ExitCode {
    tracing::info!("📂 Loading problem from {}", path.display());
    let problem = match loader::load_problem(path) {
        Ok(problem) => problem,
        Err(err) => {
            tracing::error!("❌ Could not load {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let tree = match SolutionTree::solve_with_config(
        &problem.container,
        &problem.items,
        app_config.solver.search_config(),
    ) {
        Ok(tree) => tree,
        Err(err) => {
            tracing::error!("❌ Search aborted: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let analysis = Analysis::from_collector(tree.solutions(), problem.container.capacity);
    tracing::info!(
        "📦 {} nodes, {} terminals, best price {:?}",
        tree.node_count(),
        tree.terminal_count(),
        analysis.best_price()
    );

    let response = api::SolveResponse::from_tree(&tree, problem.container.capacity, 0, None);
    match serde_json::to_string_pretty(&response) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("❌ Could not serialize result: {}", err);
            ExitCode::FAILURE
        }
    }
}
