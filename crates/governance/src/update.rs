//! The `process_update` operation (spec §4.8): the single public contract
//! for advancing an agent one step.

use std::time::Instant;

use chrono::Utc;

use sentinel_domain::config::ParameterProfileConfig;
use sentinel_domain::error::{Error, Result};
use sentinel_domain::operation::{CallerContext, ProcessUpdateArgs};
use sentinel_domain::trace::TraceEvent;
use sentinel_domain::types::{AgentStatus, Verdict};
use sentinel_dynamics::fingerprint;
use sentinel_dynamics::{engine, risk as risk_mod};
use sentinel_kg::SearchQuery;
use sentinel_store::history::HistoryEntry;

use crate::context::ServiceContext;
use crate::identity_resolve::resolve_existing_agent;
use crate::response::{ProcessUpdateResponse, StateSnapshot};

const LOCK_OWNER: &str = "sentinel-governance";

/// Advance one agent by one update (spec §4.8's twelve-step loop).
///
/// `process_update` never implicitly creates an agent — `onboard` is the
/// only creation path; an `agent_id` that doesn't resolve to an existing
/// record is `NotFound`, not a silent onboarding.
pub async fn process_update(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: ProcessUpdateArgs,
) -> Result<ProcessUpdateResponse> {
    let started = Instant::now();

    let resolved = resolve_existing_agent(ctx, caller, args.agent_id.as_deref(), args.api_key.as_deref())?;
    let uuid = resolved.uuid;

    let guard = ctx.locks.acquire(uuid, LOCK_OWNER, &ctx.config.store).await?;

    let persisted = ctx
        .store
        .load(uuid)?
        .ok_or_else(|| Error::NotFound(format!("agent {uuid} not found")))?;
    let mut metadata = persisted.metadata;
    let mut state = persisted.state;

    if metadata.status != AgentStatus::Active {
        return Err(Error::AgentPaused {
            agent_id: metadata.agent_id.clone(),
        });
    }

    let embedding = ctx.embedder.embed(&args.response_text).await?;
    let next_fingerprint =
        fingerprint::extract(&args.parameters, &args.response_text, &embedding, &args.ethical_drift);
    let coherence = state
        .last_fingerprint
        .as_ref()
        .map(|prev| fingerprint::coherence(prev, &next_fingerprint, fingerprint::COHERENCE_SIGMA));

    let profile: &ParameterProfileConfig = &ctx.config.profile;
    let lambda1 = state.governor.lambda1;
    let lambda2 = profile.lambda2_base;
    let step = match engine::step(
        state.dynamics,
        &args.ethical_drift,
        lambda1,
        lambda2,
        args.complexity,
        profile,
        None,
    ) {
        Ok(step) => step,
        Err(e) => {
            // Instability discards the update entirely: nothing derived
            // from `step` has touched `state` yet, so dropping the lock
            // guard here leaves the persisted record exactly as loaded.
            TraceEvent::UpdateProcessed {
                uuid: uuid.to_string(),
                verdict: "instability".into(),
                risk: state.risk,
                coherence,
                duration_ms: started.elapsed().as_millis() as u64,
            }
            .emit();
            return Err(e);
        }
    };

    // void_active is judged against the threshold as it stood *before* this
    // update's V sample rolls into the window, so a spike is never measured
    // against a window that already contains it.
    let void_active = state.void_threshold.is_void(step.state.v);
    state.void_threshold.observe(step.state.v, &profile.risk);

    let risk = risk_mod::compute_risk(coherence, step.state.s, void_active, step.state.v, &profile.risk);

    let new_lambda1 = state.governor.update(void_active, profile);
    TraceEvent::GovernorAdjusted {
        uuid: uuid.to_string(),
        lambda1: new_lambda1,
        void_frequency: state.governor.void_frequency(),
        pi_integral: state.governor.pi_integral,
    }
    .emit();

    let tripped = sentinel_store::circuit_breaker::should_trip(risk, coherence, void_active, &ctx.config.store.circuit_breaker);
    if tripped {
        metadata.transition(AgentStatus::Paused, "circuit breaker tripped");
        TraceEvent::CircuitBreakerTripped {
            uuid: uuid.to_string(),
            risk,
            coherence,
            void_active,
        }
        .emit();
    }

    state.dynamics = step.state;
    state.coherence = coherence;
    state.risk = risk;
    state.void_active = void_active;
    state.last_fingerprint = Some(next_fingerprint);
    state.history.push(HistoryEntry {
        e: step.state.e,
        i: step.state.i,
        s: step.state.s,
        v: step.state.v,
        coherence,
        risk,
        verdict: step.verdict,
        timestamp: Utc::now(),
    });

    save_with_retry(ctx, &metadata, &state)?;
    drop(guard);

    TraceEvent::UpdateProcessed {
        uuid: uuid.to_string(),
        verdict: step.verdict.as_str().into(),
        risk,
        coherence,
        duration_ms: started.elapsed().as_millis() as u64,
    }
    .emit();

    let learning_context = fetch_learning_context(ctx, uuid, &args.response_text).await;

    Ok(ProcessUpdateResponse {
        uuid,
        state: StateSnapshot {
            e: step.state.e,
            i: step.state.i,
            s: step.state.s,
            v: step.state.v,
        },
        coherence,
        risk,
        verdict: step.verdict,
        status: metadata.status,
        guidance: guidance_for(step.verdict, risk, void_active),
        learning_context,
        api_key_hint: None,
    })
}

fn save_with_retry(
    ctx: &ServiceContext,
    metadata: &sentinel_store::agent::AgentMetadata,
    state: &sentinel_store::agent_state::AgentState,
) -> Result<()> {
    match ctx.store.save(metadata, state) {
        Ok(()) => Ok(()),
        Err(Error::Storage(first_err)) => {
            TraceEvent::StorageRetry {
                operation: "process_update.save".into(),
                attempt: 1,
            }
            .emit();
            ctx.store
                .save(metadata, state)
                .map_err(|_| Error::ServiceUnavailable(format!("agent store unavailable: {first_err}")))
        }
        Err(other) => Err(other),
    }
}

/// A short qualitative guidance string for the caller. Not part of any
/// scored metric — purely a human-facing hint alongside the numeric
/// verdict.
fn guidance_for(verdict: Verdict, risk: f64, void_active: bool) -> String {
    if void_active {
        return "void pressure exceeded its adaptive threshold; expect a pause".into();
    }
    match verdict {
        Verdict::Proceed if risk < 0.3 => "healthy; proceed as usual".into(),
        Verdict::Proceed => "proceed, but risk is trending up".into(),
        Verdict::Pause => "objective fell below the proceed threshold".into(),
    }
}

async fn fetch_learning_context(ctx: &ServiceContext, uuid: uuid::Uuid, response_text: &str) -> Vec<String> {
    let query = SearchQuery {
        text: Some(response_text.to_string()),
        tags: None,
        severity: None,
        author: Some(uuid),
        limit: 3,
    };
    match ctx.kg.search(query).await {
        Ok(discoveries) => discoveries.into_iter().map(|d| d.summary).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "learning_context lookup failed; continuing without it");
            Vec::new()
        }
    }
}
