//! REST API for the knapsack solver.
//!
//! Provides HTTP endpoints for solving shaped and classic knapsack problems.
//! Uses Axum as the web framework and supports CORS.

use std::convert::Infallible;
use std::ops::ControlFlow;
use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::analyzer::Analysis;
use crate::config::{ApiConfig, SolverConfig};
use crate::knapsack::{ClassicItem, ClassicSolution, solve_classic};
use crate::loader::{LoadError, parse_problem};
use crate::model::{Container, Item, PackedState, Problem, ValidationError};
use crate::optimizer::{SearchConfig, SearchError, SearchHit, SolutionTree};
use crate::types::{ContainerGrid, ShapeGrid};

#[derive(Clone)]
struct ApiState {
    solver_config: SolverConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>knapsack2d API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Item of a shaped problem.
///
/// `shape` rows use `@` for occupied cells; other characters are empty.
#[derive(Deserialize, Clone, ToSchema)]
pub struct ItemRequest {
    pub weight: u64,
    pub price: u64,
    #[schema(example = json!(["@", "@@"]))]
    pub shape: Vec<String>,
}

/// Request structure for the solve endpoints.
///
/// `container` rows use `_` for free cells; other characters are blocked.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "capacity": 5,
        "container": ["___#", "____"],
        "items": [
            { "weight": 3, "price": 5, "shape": ["@@"] },
            { "weight": 2, "price": 4, "shape": ["@", "@@"] }
        ],
        "search_price": 5
    })
)]
pub struct SolveRequest {
    pub capacity: u64,
    pub container: Vec<String>,
    pub items: Vec<ItemRequest>,
    /// Also list every tree node with exactly this price.
    #[serde(default)]
    #[schema(nullable = true)]
    pub search_price: Option<u64>,
    /// Overrides the configured child ordering for this request.
    #[serde(default)]
    #[schema(nullable = true)]
    pub ordered_children: Option<bool>,
}

impl SolveRequest {
    fn into_problem(self) -> Result<Problem, ValidationError> {
        let container = Container::new(
            ContainerGrid::container_from_lines(&self.container),
            self.capacity,
        )?;
        let items = self
            .items
            .into_iter()
            .map(|item| {
                Item::new(
                    item.weight,
                    item.price,
                    ShapeGrid::shape_from_lines(&item.shape),
                )
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        Ok(Problem { container, items })
    }
}

/// Request structure for the classic knapsack endpoint.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "capacity": 10,
        "items": [
            { "weight": 5, "price": 10 },
            { "weight": 4, "price": 40 },
            { "weight": 3, "price": 50 }
        ]
    })
)]
pub struct ClassicRequest {
    pub capacity: u64,
    pub items: Vec<ClassicItem>,
}

/// A packed container state in the response.
///
/// # Fields
/// * `price` - Total price of the packed items
/// * `weight` - Total weight of the packed items
/// * `free_cells` - Cells still free in the container
/// * `grid` - Container rows; items are drawn with their symbol (`1`, `2`, ...)
#[derive(Serialize, ToSchema)]
pub struct PackedStateResponse {
    pub price: u64,
    pub weight: u64,
    pub free_cells: usize,
    #[schema(example = json!(["11_#", "_22_"]))]
    pub grid: Vec<String>,
}

impl From<&PackedState> for PackedStateResponse {
    fn from(state: &PackedState) -> Self {
        Self {
            price: state.price,
            weight: state.weight,
            free_cells: state.free_cells(),
            grid: state.grid.to_lines(),
        }
    }
}

/// A tree node matching the requested search price.
#[derive(Serialize, ToSchema)]
pub struct SearchHitResponse {
    pub node: usize,
    pub terminal: bool,
    pub state: PackedStateResponse,
}

impl From<&SearchHit> for SearchHitResponse {
    fn from(hit: &SearchHit) -> Self {
        Self {
            node: hit.node,
            terminal: hit.terminal,
            state: PackedStateResponse::from(&hit.state),
        }
    }
}

/// Response structure with every policy answer.
///
/// # Fields
/// * `all_unique` - Every distinct (price, weight) terminal state, ascending
/// * `max_value_under_capacity` - Best price within the weight capacity
/// * `max_value_min_weight` - Lightest state with the overall best price
/// * `max_value_max_fill` - Densest states among `max_value_under_capacity`
#[derive(Serialize, ToSchema)]
pub struct SolveResponse {
    pub capacity: u64,
    pub nodes: usize,
    pub terminals: usize,
    pub elapsed_ms: u64,
    pub all_unique: Vec<PackedStateResponse>,
    pub max_value_under_capacity: Vec<PackedStateResponse>,
    pub max_value_min_weight: Option<PackedStateResponse>,
    pub max_value_max_fill: Vec<PackedStateResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_hits: Option<Vec<SearchHitResponse>>,
}

impl SolveResponse {
    /// Creates a SolveResponse from a finished tree.
    pub fn from_tree(
        tree: &SolutionTree,
        capacity: u64,
        elapsed_ms: u64,
        search_price: Option<u64>,
    ) -> Self {
        let analysis = Analysis::from_collector(tree.solutions(), capacity);
        let to_response = |states: &[PackedState]| -> Vec<PackedStateResponse> {
            states.iter().map(PackedStateResponse::from).collect()
        };

        Self {
            capacity,
            nodes: tree.node_count(),
            terminals: tree.terminal_count(),
            elapsed_ms,
            all_unique: to_response(&analysis.all_unique),
            max_value_under_capacity: to_response(&analysis.max_value_under_capacity),
            max_value_min_weight: analysis
                .max_value_min_weight
                .as_ref()
                .map(PackedStateResponse::from),
            max_value_max_fill: to_response(&analysis.max_value_max_fill),
            search_hits: search_price.map(|price| {
                tree.search(price)
                    .iter()
                    .map(SearchHitResponse::from)
                    .collect()
            }),
        }
    }
}

/// Builds the solution tree for `problem` and derives the answers.
pub fn solve_problem(
    problem: &Problem,
    config: SearchConfig,
    search_price: Option<u64>,
) -> Result<SolveResponse, SearchError> {
    let started = Instant::now();
    let tree = SolutionTree::solve_with_config(&problem.container, &problem.items, config)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    Ok(SolveResponse::from_tree(
        &tree,
        problem.container.capacity,
        elapsed_ms,
        search_price,
    ))
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn load_error(err: LoadError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid problem file",
        err.to_string(),
    )
}

fn limit_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Problem exceeds configured limits",
        details,
    )
}

fn search_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Search aborted",
        details,
    )
}

fn search_failure(err: &SearchError) -> Response {
    match err {
        SearchError::TotalsOverflow { .. } => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Totals exceed the supported range",
            err.to_string(),
        ),
        SearchError::InvariantViolation { .. } | SearchError::Cancelled => {
            search_error(err.to_string())
        }
    }
}

fn admit(state: &ApiState, problem: &Problem) -> Result<(), Response> {
    state
        .solver_config
        .limits()
        .admit_shaped(problem.items.len(), problem.container.cell_count())
        .map_err(limit_error)
}

fn search_config_for(state: &ApiState, ordered_override: Option<bool>) -> SearchConfig {
    let mut config = state.solver_config.search_config();
    if let Some(ordered) = ordered_override {
        config.ordered_children = ordered;
    }
    config
}

fn parse_solve_request(
    payload: Result<Json<SolveRequest>, JsonRejection>,
) -> Result<(Problem, Option<u64>, Option<bool>), Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };
    let search_price = payload.search_price;
    let ordered = payload.ordered_children;
    match payload.into_problem() {
        Ok(problem) => Ok((problem, search_price, ordered)),
        Err(err) => Err(validation_error(err.to_string())),
    }
}

async fn run_solve(problem: Problem, config: SearchConfig, search_price: Option<u64>) -> Response {
    tracing::info!(
        "📥 New solve request: {} items, {}x{} container",
        problem.items.len(),
        problem.container.grid.rows(),
        problem.container.grid.cols()
    );

    let result =
        tokio::task::spawn_blocking(move || solve_problem(&problem, config, search_price)).await;

    match result {
        Ok(Ok(response)) => {
            tracing::info!(
                "📦 Result: {} nodes, {} distinct solutions in {} ms",
                response.nodes,
                response.all_unique.len(),
                response.elapsed_ms
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(err)) => {
            tracing::error!("❌ Search aborted: {err}");
            search_failure(&err)
        }
        Err(err) => {
            tracing::error!("❌ Search task failed: {err}");
            search_error(err.to_string())
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_solve, handle_solve_text, handle_solve_stream, handle_knapsack),
    components(
        schemas(
            SolveRequest,
            ItemRequest,
            SolveResponse,
            PackedStateResponse,
            SearchHitResponse,
            ClassicRequest,
            ClassicItem,
            ClassicSolution,
            ErrorResponse
        )
    ),
    tags((name = "knapsack", description = "Endpoints for knapsack solving"))
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests.
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, solver_config: SolverConfig) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { solver_config };

    let app = Router::new()
        // API endpoints
        .route("/solve", post(handle_solve))
        .route("/solve_text", post(handle_solve_text))
        .route("/solve_stream", post(handle_solve_stream))
        .route("/knapsack", post(handle_knapsack))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    tracing::info!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        tracing::info!("💡 Local access: http://localhost:{}", config.port());
    }
    tracing::info!("📦 API Endpoints: POST /solve, /solve_text, /solve_stream, /knapsack");
    tracing::info!("📑 Documentation: GET /docs, /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /solve endpoint.
///
/// Builds the full solution tree for a JSON problem and returns every
/// policy answer.
#[utoipa::path(
    post,
    path = "/solve",
    request_body = SolveRequest,
    responses(
        (status = 200, description = "Problem solved", body = SolveResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or problem too large",
            body = ErrorResponse
        ),
        (status = INTERNAL_SERVER_ERROR, description = "Search aborted", body = ErrorResponse)
    ),
    tag = "knapsack"
)]
async fn handle_solve(
    State(state): State<ApiState>,
    payload: Result<Json<SolveRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (problem, search_price, ordered) = match parse_solve_request(payload) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };
    if let Err(response) = admit(&state, &problem) {
        return response;
    }

    let config = search_config_for(&state, ordered);
    run_solve(problem, config, search_price).await
}

/// Handler for POST /solve_text endpoint.
///
/// Accepts a problem in the plain text file format.
#[utoipa::path(
    post,
    path = "/solve_text",
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Problem solved", body = SolveResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Malformed problem text or problem too large",
            body = ErrorResponse
        ),
        (status = INTERNAL_SERVER_ERROR, description = "Search aborted", body = ErrorResponse)
    ),
    tag = "knapsack"
)]
async fn handle_solve_text(State(state): State<ApiState>, body: String) -> impl IntoResponse {
    let problem = match parse_problem(&body) {
        Ok(problem) => problem,
        Err(err) => return load_error(err),
    };
    if let Err(response) = admit(&state, &problem) {
        return response;
    }

    let config = search_config_for(&state, None);
    run_solve(problem, config, None).await
}

/// Handler for POST /solve_stream endpoint (SSE).
///
/// Streams search events in real time as Server-Sent Events
/// (text/event-stream). The final event, named `result`, carries the
/// complete solve response.
#[utoipa::path(
    post,
    path = "/solve_stream",
    request_body = SolveRequest,
    responses(
        (
            status = 200,
            description = "Streams search events in real time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or problem too large",
            body = ErrorResponse
        )
    ),
    tag = "knapsack"
)]
async fn handle_solve_stream(
    State(state): State<ApiState>,
    payload: Result<Json<SolveRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (problem, search_price, ordered) = match parse_solve_request(payload) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };
    if let Err(response) = admit(&state, &problem) {
        return response;
    }

    let config = search_config_for(&state, ordered);
    let (tx, rx) = mpsc::channel::<Event>(32);

    tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let result = SolutionTree::solve_with_progress(
            &problem.container,
            &problem.items,
            config,
            |evt| {
                let Ok(json) = serde_json::to_string(evt) else {
                    return ControlFlow::Continue(());
                };
                match tx.blocking_send(Event::default().data(json)) {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(_) => ControlFlow::Break(()),
                }
            },
        );

        let final_event = match result {
            Ok(tree) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let response = SolveResponse::from_tree(
                    &tree,
                    problem.container.capacity,
                    elapsed_ms,
                    search_price,
                );
                serde_json::to_string(&response)
                    .map(|json| Event::default().event("result").data(json))
            }
            Err(SearchError::Cancelled) => {
                tracing::info!("🔌 Stream client disconnected, search stopped");
                return;
            }
            Err(err) => {
                tracing::error!("❌ Streaming search aborted: {err}");
                serde_json::to_string(&ErrorResponse::new("Search aborted", err.to_string()))
                    .map(|json| Event::default().event("error").data(json))
            }
        };
        if let Ok(event) = final_event {
            let _ = tx.blocking_send(event);
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /knapsack endpoint.
///
/// Solves the classic knapsack where only weight and price count.
#[utoipa::path(
    post,
    path = "/knapsack",
    request_body = ClassicRequest,
    responses(
        (status = 200, description = "Problem solved", body = ClassicSolution),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or capacity too large",
            body = ErrorResponse
        )
    ),
    tag = "knapsack"
)]
async fn handle_knapsack(
    State(state): State<ApiState>,
    payload: Result<Json<ClassicRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };
    let capacity = match state.solver_config.limits().admit_classic(request.capacity) {
        Ok(capacity) => capacity,
        Err(details) => return limit_error(details),
    };

    tracing::info!(
        "📥 New classic knapsack request: {} items, capacity {}",
        request.items.len(),
        capacity
    );
    let items = request.items;
    match tokio::task::spawn_blocking(move || solve_classic(capacity, &items)).await {
        Ok(Ok(solution)) => (StatusCode::OK, Json(solution)).into_response(),
        Ok(Err(err)) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Totals exceed the supported range",
            err.to_string(),
        ),
        Err(err) => search_error(err.to_string()),
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
