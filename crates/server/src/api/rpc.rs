//! The single RPC endpoint (spec §6): `POST /v1/rpc` takes a tagged
//! [`Request`] body and returns the matching [`Response`] variant, or a
//! structured [`ErrorResponse`] on failure.
//!
//! The session identifier and any explicit credentials travel out-of-band
//! in headers (see [`crate::api::context::caller_context`]) rather than in
//! the body, so the body's shape matches spec §6's argument columns
//! exactly.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};

use sentinel_domain::error::{Error, ErrorCode};
use sentinel_domain::operation::{HealthCheckArgs, Request};
use sentinel_governance::Response;

use crate::api::context::caller_context;
use crate::state::AppState;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidArgument | ErrorCode::ReservedName => StatusCode::BAD_REQUEST,
        ErrorCode::AuthRequired | ErrorCode::SessionMismatch | ErrorCode::NotBound => {
            StatusCode::UNAUTHORIZED
        }
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Busy => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::AgentPaused
        | ErrorCode::UnsafeConditions
        | ErrorCode::WrongPhase
        | ErrorCode::MaxRoundsExceeded => StatusCode::CONFLICT,
        ErrorCode::StorageError | ErrorCode::ServiceUnavailable | ErrorCode::NoReviewerAvailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorCode::DynamicsInstability | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: Error) -> axum::response::Response {
    if err.is_audit_worthy() {
        sentinel_domain::trace::TraceEvent::AuditAuthFailure {
            agent_id: None,
            reason: err.to_string(),
        }
        .emit();
    }
    let body = err.to_response();
    (status_for(body.code), Json(body)).into_response()
}

pub async fn rpc(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<Request>,
) -> axum::response::Response {
    let caller = caller_context(&headers, state.admin_token_hash.as_deref());
    match sentinel_governance::dispatch(&state.governance, &caller, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Public, unauthenticated health probe (no body needed — mirrors the
/// pack's `GET /v1/health`). Internally just the `health_check` operation.
pub async fn health(State(state): State<AppState>) -> axum::response::Response {
    let caller = sentinel_domain::operation::CallerContext::default();
    match sentinel_governance::dispatch(
        &state.governance,
        &caller,
        Request::HealthCheck(HealthCheckArgs {}),
    )
    .await
    {
        Ok(Response::Health(h)) => (StatusCode::OK, Json(h)).into_response(),
        Ok(_) => unreachable!("health_check always returns Response::Health"),
        Err(e) => error_response(e),
    }
}
