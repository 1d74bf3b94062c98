use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Spanbase endpoints.
pub fn build_router(state: AppState, max_upload_size: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route(
            "/filelist",
            get(handler::get_file_list).post(handler::post_file_list),
        )
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
