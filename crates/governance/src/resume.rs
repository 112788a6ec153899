//! The `direct_resume_if_safe` operation (spec §4.6, §6, §8): re-evaluates
//! a paused agent's circuit-breaker thresholds and resumes it if they now
//! pass. Unlike most operations, failing the safety check is not an error
//! — it is the expected, common result, so it is reported as
//! `{resumed: false, reason}` rather than surfaced as `Error::Unsafe`.

use sentinel_domain::error::Result;
use sentinel_domain::operation::{CallerContext, DirectResumeArgs};
use sentinel_domain::trace::TraceEvent;
use sentinel_domain::types::AgentStatus;
use sentinel_store::circuit_breaker::is_safe_to_resume;

use crate::context::ServiceContext;
use crate::identity_resolve::resolve_existing_agent;
use crate::response::ResumeResponse;

const LOCK_OWNER: &str = "sentinel-governance";

pub async fn direct_resume_if_safe(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: DirectResumeArgs,
) -> Result<ResumeResponse> {
    let resolved = resolve_existing_agent(ctx, caller, Some(&args.agent_id), Some(&args.api_key))?;
    let uuid = resolved.uuid;

    let guard = ctx.locks.acquire(uuid, LOCK_OWNER, &ctx.config.store).await?;

    let persisted = ctx.store.load(uuid)?.ok_or_else(|| {
        sentinel_domain::error::Error::NotFound(format!("agent {uuid} not found"))
    })?;
    let mut metadata = persisted.metadata;
    let state = persisted.state;

    if metadata.status != AgentStatus::Paused {
        drop(guard);
        return Ok(ResumeResponse {
            resumed: metadata.status == AgentStatus::Active,
            reason: format!("agent is not paused (status: {})", metadata.status),
        });
    }

    let safe = is_safe_to_resume(state.risk, state.coherence, state.void_active, &ctx.config.store.circuit_breaker);

    if !safe {
        drop(guard);
        return Ok(ResumeResponse {
            resumed: false,
            reason: "current risk/coherence/void metrics still fail the safe-resume check".into(),
        });
    }

    metadata.transition(AgentStatus::Active, "direct_resume_if_safe: thresholds clear");
    ctx.store.save(&metadata, &state)?;
    drop(guard);

    TraceEvent::AgentResumed {
        uuid: uuid.to_string(),
        via: "direct_resume_if_safe".into(),
    }
    .emit();

    Ok(ResumeResponse {
        resumed: true,
        reason: "risk, coherence, and void metrics are within safe-resume bounds".into(),
    })
}
