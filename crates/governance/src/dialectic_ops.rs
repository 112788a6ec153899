//! The dialectic-recovery operations (spec §4.9, §4.10, §6):
//! `request_dialectic_review`, `submit_thesis`, `submit_antithesis`,
//! `submit_synthesis`.
//!
//! Locking discipline follows spec §5: both participants' metadata are
//! read *outside* any agent lock while assembling the reviewer pool; only
//! at resolution time does this module briefly take the paused agent's
//! lock to apply the `resume`/`block` decision.

use uuid::Uuid;

use sentinel_dialectic::{
    select_reviewer, DialecticCollaborator, DialecticMessage, DialecticSession, MessageKind, ReviewerCandidate,
};
use sentinel_domain::error::{Error, Result};
use sentinel_domain::operation::{CallerContext, RequestDialecticArgs, ReviewerMode, SubmitMessageArgs};
use sentinel_domain::types::{AgentStatus, DialecticPhase, ResolutionAction};
use sentinel_store::agent::AgentMetadata;

use crate::context::ServiceContext;
use crate::identity_resolve::resolve_existing_agent;
use crate::response::DialecticSubmitResponse;
use crate::response::DialecticReviewResponse;

const LOCK_OWNER: &str = "sentinel-governance";
/// How many active agents are scanned to assemble the reviewer candidate
/// pool before giving up and falling back to LLM-assisted dialectic.
const CANDIDATE_SCAN_LIMIT: usize = 200;

pub async fn request_dialectic_review(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: RequestDialecticArgs,
) -> Result<DialecticReviewResponse> {
    let paused = resolve_existing_agent(ctx, caller, Some(&args.agent_id), None)?;

    if args.reviewer_mode == ReviewerMode::SelfAssisted {
        return start_llm_assisted_session(ctx, paused.uuid).await;
    }

    let pool = build_reviewer_pool(ctx, paused.uuid)?;
    let mut rng = rand::thread_rng();
    match select_reviewer(&pool, &mut rng) {
        Some(reviewer_uuid) => {
            let session = DialecticSession::new(Uuid::new_v4(), paused.uuid, reviewer_uuid);
            let session_id = session.session_id;
            ctx.dialectic_store.save(&session)?;
            ctx.note_session_opened();
            ctx.note_reviewer_assigned(reviewer_uuid);
            Ok(DialecticReviewResponse {
                session_id,
                reviewer_id: Some(reviewer_uuid),
                llm_assisted: false,
            })
        }
        None => start_llm_assisted_session(ctx, paused.uuid).await,
    }
}

async fn start_llm_assisted_session(ctx: &ServiceContext, paused_uuid: Uuid) -> Result<DialecticReviewResponse> {
    // There is no second participant in this variant (spec §4.10), so the
    // session's reviewer slot is filled by the paused agent itself; the
    // dual-author round counters in `DialecticSession` never matter here
    // because `submit_llm_synthesis` bypasses them entirely.
    let session = DialecticSession::new(Uuid::new_v4(), paused_uuid, paused_uuid);
    let session_id = session.session_id;
    ctx.dialectic_store.save(&session)?;
    ctx.note_session_opened();
    ctx.mark_llm_assisted(session_id);
    Ok(DialecticReviewResponse {
        session_id,
        reviewer_id: None,
        llm_assisted: true,
    })
}

/// Eligible reviewers: active, healthy (`risk < 0.40`, `coherence >=
/// 0.50`), not the paused agent, not recently assigned a review (spec
/// §4.9). Reading every candidate's live state requires going outside
/// `sentinel-dialectic`, which has no handle to the agent store.
fn build_reviewer_pool(ctx: &ServiceContext, paused_uuid: Uuid) -> Result<Vec<ReviewerCandidate>> {
    let candidates = ctx
        .store
        .list_agents(Some(AgentStatus::Active), CANDIDATE_SCAN_LIMIT, 0)?;

    let mut pool = Vec::new();
    for meta in candidates {
        if meta.uuid == paused_uuid || ctx.was_recently_reviewer(meta.uuid) {
            continue;
        }
        let Some(persisted) = ctx.store.load(meta.uuid)? else {
            continue;
        };
        let coherence = persisted.state.coherence;
        let risk = persisted.state.risk;
        let eligible = risk < 0.40 && coherence.map(|c| c >= 0.50).unwrap_or(false);
        if !eligible {
            continue;
        }
        let hours_since_update = (chrono::Utc::now() - meta.updated_at).num_seconds().max(0) as f64 / 3600.0;
        pool.push(ReviewerCandidate {
            agent_uuid: meta.uuid,
            health: 1.0 - risk,
            // Historical reviewer reliability and topical closeness are
            // not tracked by this core (spec §9's authority-score weights
            // are documented defaults); both ride at a neutral midpoint
            // until that data exists.
            track_record: 0.5,
            domain_affinity: 0.5,
            freshness: 1.0 / (1.0 + hours_since_update),
        });
    }
    Ok(pool)
}

pub async fn submit_thesis(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: SubmitMessageArgs,
) -> Result<DialecticSubmitResponse> {
    submit(ctx, caller, MessageKind::Thesis, args).await
}

pub async fn submit_antithesis(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: SubmitMessageArgs,
) -> Result<DialecticSubmitResponse> {
    submit(ctx, caller, MessageKind::Antithesis, args).await
}

pub async fn submit_synthesis(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: SubmitMessageArgs,
) -> Result<DialecticSubmitResponse> {
    submit(ctx, caller, MessageKind::Synthesis, args).await
}

async fn submit(
    ctx: &ServiceContext,
    caller: &CallerContext,
    kind: MessageKind,
    args: SubmitMessageArgs,
) -> Result<DialecticSubmitResponse> {
    let session_id: Uuid = args
        .session_id
        .parse()
        .map_err(|_| Error::InvalidArgument("session_id must be a uuid".into()))?;
    let author = resolve_existing_agent(ctx, caller, Some(&args.author), None)?;

    let mut session = ctx
        .dialectic_store
        .load(session_id)?
        .ok_or_else(|| Error::NotFound(format!("dialectic session {session_id} not found")))?;

    let reasoning = if args.concerns.is_empty() {
        args.reasoning
    } else {
        format!("{}\nconcerns: {}", args.reasoning, args.concerns.join("; "))
    };
    let observed_metrics = args.observed_metrics.unwrap_or(serde_json::json!({}));
    let cfg = &ctx.config.dialectic;

    let submit_result = session.submit(
        kind,
        author.uuid,
        reasoning,
        args.proposed_conditions,
        args.root_cause,
        observed_metrics,
        args.agrees,
        ctx.signing_secret(),
        cfg,
    );

    match submit_result {
        Ok(outcome) => {
            // A thesis just opened an LLM-assisted session: there is no
            // second participant to produce the antithesis, so the
            // external collaborator stands in immediately rather than
            // waiting for a `submit_antithesis` call that will never come
            // (spec §4.10).
            if kind == MessageKind::Thesis && ctx.is_llm_assisted(session_id) {
                return run_llm_assisted_remainder(ctx, session, author).await;
            }

            ctx.dialectic_store.save(&session)?;
            if outcome.phase == DialecticPhase::Resolved {
                apply_resolution(ctx, &session).await?;
            }
            Ok(DialecticSubmitResponse {
                session_id,
                phase: outcome.phase,
                converged: outcome.converged,
                rounds: outcome.rounds,
                resolution_action: session.resolution.as_ref().map(|r| r.action),
            })
        }
        Err(Error::MaxRoundsExceeded) => {
            // The session escalated as a side effect of this submission;
            // persist that before surfacing the error to the caller.
            ctx.dialectic_store.save(&session)?;
            ctx.note_session_closed();
            Err(Error::MaxRoundsExceeded)
        }
        Err(other) => Err(other),
    }
}

/// Drive both remaining phases of the LLM-assisted variant (spec §4.10):
/// invoke the collaborator for an antithesis, then for a synthesis, apply
/// the same convergence and safety checks a two-party session would.
async fn run_llm_assisted_remainder(
    ctx: &ServiceContext,
    mut session: DialecticSession,
    paused: crate::identity_resolve::ResolvedAgent,
) -> Result<DialecticSubmitResponse> {
    let thesis = thesis_message(&session)?.clone();
    let thesis_input = sentinel_collab::ThesisInput {
        reasoning: &thesis.reasoning,
        proposed_conditions: &thesis.proposed_conditions,
        root_cause: thesis.root_cause.as_deref(),
    };

    let antithesis = ctx.collaborator.antithesis(thesis_input).await?;
    // Record the antithesis as a normal synthesis-phase transition so the
    // session's message log reads the same as a two-party exchange, even
    // though the "reviewer" here is the external collaborator rather than
    // a second agent.
    session.submit(
        MessageKind::Antithesis,
        paused.uuid,
        format!("(llm-assisted antithesis) concerns: {}", antithesis.concerns.join("; ")),
        antithesis.proposed_conditions.clone(),
        antithesis.root_cause.clone(),
        serde_json::json!({}),
        None,
        ctx.signing_secret(),
        &ctx.config.dialectic,
    )?;

    let synthesis = ctx.collaborator.synthesis(thesis_input, &antithesis).await?;
    let agrees = synthesis.agrees.unwrap_or(false);
    let outcome = session.submit_llm_synthesis(
        "(llm-assisted synthesis)".into(),
        synthesis.proposed_conditions,
        synthesis.root_cause,
        agrees,
        ctx.signing_secret(),
        &ctx.config.dialectic,
    );

    ctx.dialectic_store.save(&session)?;
    ctx.note_session_closed();

    let resolution_action = session.resolution.as_ref().map(|r| r.action);
    if resolution_action == Some(ResolutionAction::Resume) {
        apply_resolution(ctx, &session).await?;
    }

    match outcome {
        Ok(outcome) => Ok(DialecticSubmitResponse {
            session_id: session.session_id,
            phase: outcome.phase,
            converged: outcome.converged,
            rounds: outcome.rounds,
            resolution_action,
        }),
        Err(Error::MaxRoundsExceeded) => Err(Error::MaxRoundsExceeded),
        Err(other) => Err(other),
    }
}

fn thesis_message(session: &DialecticSession) -> Result<&DialecticMessage> {
    session
        .messages
        .iter()
        .find(|m| m.kind == MessageKind::Thesis)
        .ok_or_else(|| Error::Storage("llm-assisted session has no thesis message".into()))
}

/// Apply a resolved `resume` decision to the paused agent's own status
/// (spec §4.9: "the governance loop transitions the target agent to
/// active and records a lifecycle event").
async fn apply_resolution(ctx: &ServiceContext, session: &DialecticSession) -> Result<()> {
    let Some(resolution) = &session.resolution else {
        return Ok(());
    };
    if resolution.action != ResolutionAction::Resume {
        return Ok(());
    }

    let guard = ctx
        .locks
        .acquire(session.paused_agent_id, LOCK_OWNER, &ctx.config.store)
        .await?;
    let persisted = ctx
        .store
        .load(session.paused_agent_id)?
        .ok_or_else(|| Error::NotFound(format!("agent {} not found", session.paused_agent_id)))?;
    let mut metadata: AgentMetadata = persisted.metadata;
    metadata.transition(AgentStatus::Active, "dialectic session resolved: resume");
    ctx.store.save(&metadata, &persisted.state)?;
    drop(guard);
    Ok(())
}
