//! Routes a [`Request`] to its handler and wraps the typed result into the
//! outer [`Response`] enum (spec §6). The only place in this crate that
//! matches on [`Request`]/[`Response`] variants — every handler module
//! stays ignorant of the envelope.

use sentinel_domain::error::{Error, Result};
use sentinel_domain::operation::{CallerContext, IdentityArgs, Request};

use crate::context::ServiceContext;
use crate::response::{IdentityResponse, Response};
use crate::{dialectic_ops, health, knowledge_ops, lifecycle_ops, metrics, onboard, resume, update};

pub async fn dispatch(ctx: &ServiceContext, caller: &CallerContext, request: Request) -> Result<Response> {
    match request {
        Request::Onboard(args) => onboard::onboard(ctx, args).map(Response::Onboard),
        Request::Identity(args) => identity(ctx, caller, args).map(Response::Identity),
        Request::ProcessUpdate(args) => update::process_update(ctx, caller, args).await.map(Response::ProcessUpdate),
        Request::GetMetrics(args) => metrics::get_metrics(ctx, caller, args).map(Response::GetMetrics),
        Request::GetHistory(args) => metrics::get_history(ctx, caller, args).map(Response::GetHistory),
        Request::DirectResumeIfSafe(args) => resume::direct_resume_if_safe(ctx, caller, args)
            .await
            .map(Response::DirectResumeIfSafe),
        Request::RequestDialecticReview(args) => dialectic_ops::request_dialectic_review(ctx, caller, args)
            .await
            .map(Response::RequestDialecticReview),
        Request::SubmitThesis(args) => dialectic_ops::submit_thesis(ctx, caller, args)
            .await
            .map(Response::DialecticSubmit),
        Request::SubmitAntithesis(args) => dialectic_ops::submit_antithesis(ctx, caller, args)
            .await
            .map(Response::DialecticSubmit),
        Request::SubmitSynthesis(args) => dialectic_ops::submit_synthesis(ctx, caller, args)
            .await
            .map(Response::DialecticSubmit),
        Request::StoreDiscovery(args) => knowledge_ops::store_discovery(ctx, caller, args)
            .await
            .map(Response::Discovery),
        Request::SearchDiscoveries(args) => knowledge_ops::search_discoveries(ctx, args)
            .await
            .map(Response::Discoveries),
        Request::LeaveNote(args) => knowledge_ops::leave_note(ctx, caller, args).await.map(Response::Discovery),
        Request::UpdateDiscoveryStatus(args) => knowledge_ops::update_discovery_status(ctx, caller, args)
            .await
            .map(Response::DiscoveryStatusUpdated),
        Request::ListAgents(args) => lifecycle_ops::list_agents(ctx, caller, args).map(Response::AgentList),
        Request::Archive(args) => lifecycle_ops::archive(ctx, caller, args).await.map(Response::Lifecycle),
        Request::Delete(args) => lifecycle_ops::delete(ctx, caller, args).await.map(Response::Lifecycle),
        Request::UpdateMetadata(args) => lifecycle_ops::update_metadata(ctx, caller, args)
            .await
            .map(Response::Lifecycle),
        Request::HealthCheck(args) => Ok(Response::Health(health::health_check(ctx, args).await)),
    }
}

/// The `identity` operation (spec §6): resolve the agent bound to the
/// caller's session. There is no `agent_id`/`api_key` fallback path here —
/// a caller with no bound session has no agent to ask about yet.
fn identity(ctx: &ServiceContext, caller: &CallerContext, _args: IdentityArgs) -> Result<IdentityResponse> {
    let session_key = caller.session_key.as_deref().ok_or(Error::NotBound)?;
    let uuid = ctx
        .sessions
        .resolve(session_key, ctx.config.identity.session_ttl_secs)
        .ok_or(Error::NotBound)?;
    let persisted = ctx
        .store
        .load(uuid)?
        .ok_or_else(|| Error::NotFound(format!("agent {uuid} not found")))?;

    Ok(IdentityResponse {
        uuid,
        agent_id: persisted.metadata.agent_id,
        display_name: persisted.metadata.label,
        status: persisted.metadata.status,
    })
}
