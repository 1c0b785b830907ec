//! Word count service HTTP interface.

use crate::app_state::{AppState, SharedAppState};
use crate::cli::{CommandLineArgs, Stage};
use crate::error::PipelineError;
use crate::metrics::{metrics_handler, record_response_metrics, request_counter};
use crate::operation::Operation;
use crate::operations;
use crate::validated_json::ValidatedJson;

use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Service that serves the word count pipeline stages.
pub type Service = NormalizePath<Router>;

/// Initialise the application.
///
/// Configures the global Rayon thread pool when CPU-bound work is offloaded to it.
pub fn init(args: &CommandLineArgs) {
    if args.use_rayon {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(thread_limit) = args.thread_limit {
            builder = builder.num_threads(thread_limit);
        }
        if let Err(err) = builder.build_global() {
            tracing::warn!("failed to configure Rayon thread pool: {}", err);
        }
    }
}

/// Returns a [Service] serving the stages enabled in `args`.
///
/// Trailing slashes are trimmed from request paths before routing.
pub fn service(args: &CommandLineArgs) -> Service {
    let state = Arc::new(AppState::new(args));
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Returns a [axum::Router] with a route for each enabled stage plus the health and metrics
/// endpoints.
pub fn router(state: SharedAppState) -> Router {
    let mut router: Router<SharedAppState> = Router::new();
    if state.args.serves(Stage::Split) {
        router = router.route("/split", post(operation_handler::<operations::Split>));
    }
    if state.args.serves(Stage::Map) {
        router = router.route("/map", post(operation_handler::<operations::Map>));
    }
    if state.args.serves(Stage::Reduce) {
        router = router.route("/reduce", post(operation_handler::<operations::Reduce>));
    }
    router
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .layer(
            TraceLayer::new_for_http()
                .on_request(request_counter)
                .on_response(record_response_metrics),
        )
        .with_state(state)
}

/// Liveness probe.
async fn health() -> &'static str {
    "OK"
}

/// Handler for pipeline stage operations
///
/// Executes the stage and returns its summary as JSON.
///
/// # Arguments
///
/// * `state`: Shared application state
/// * `request`: Validated request data
async fn operation_handler<T: Operation + 'static>(
    State(state): State<SharedAppState>,
    ValidatedJson(request): ValidatedJson<T::Request>,
) -> Result<Json<T::Response>, PipelineError> {
    T::execute(&state, request).await.map(Json)
}
