pub mod context;
pub mod rpc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router: a single RPC endpoint plus a public health
/// probe (spec §6).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(rpc::health))
        .route("/v1/rpc", post(rpc::rpc))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
