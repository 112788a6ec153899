//! The `health_check` operation (spec §6): service health and counters.
//! Read-only, unauthenticated, and cheap enough to poll frequently.

use sentinel_domain::operation::HealthCheckArgs;
use sentinel_kg::SearchQuery;

use crate::context::ServiceContext;
use crate::response::HealthResponse;

pub async fn health_check(ctx: &ServiceContext, _args: HealthCheckArgs) -> HealthResponse {
    // A zero-limit search is the cheapest round-trip the knowledge graph
    // interface exposes that still exercises the backend (spec §4.11).
    let kg_backend_ok = ctx
        .kg
        .search(SearchQuery {
            limit: 0,
            ..Default::default()
        })
        .await
        .is_ok();

    HealthResponse {
        uptime_secs: ctx.uptime_secs(),
        open_dialectic_sessions: ctx.open_dialectic_session_count(),
        kg_backend_ok,
        extra: serde_json::json!({
            "bound_sessions": ctx.sessions.len(),
        }),
    }
}
