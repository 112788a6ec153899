//! Lifecycle operations (spec §4.6, §6): `list_agents`, `archive`,
//! `delete`, `update_metadata`.
//!
//! All four are admin-gated (spec §9 "Admin gating" open-question
//! decision, recorded in `DESIGN.md`): a caller's own agent API key is
//! not sufficient, since these operations reach across agents rather than
//! act on the caller's own identity.

use sentinel_domain::error::{Error, Result};
use sentinel_domain::operation::{AgentIdArgs, CallerContext, ListAgentsArgs, UpdateMetadataArgs};
use sentinel_domain::types::AgentStatus;

use crate::context::ServiceContext;
use crate::response::{AgentListResponse, AgentSummary, LifecycleResponse};

const LOCK_OWNER: &str = "sentinel-governance";

fn require_admin(caller: &CallerContext) -> Result<()> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(Error::AuthRequired(
            "this operation requires the admin bearer token".into(),
        ))
    }
}

pub fn list_agents(ctx: &ServiceContext, caller: &CallerContext, args: ListAgentsArgs) -> Result<AgentListResponse> {
    require_admin(caller)?;

    let status = args
        .status
        .map(|s| s.parse::<AgentStatus>())
        .transpose()
        .map_err(|_| Error::InvalidArgument("unknown status filter".into()))?;
    let offset: usize = args
        .cursor
        .as_deref()
        .map(|c| c.parse())
        .transpose()
        .map_err(|_| Error::InvalidArgument("cursor must be an offset integer".into()))?
        .unwrap_or(0);

    let rows = ctx.store.list_agents(status, args.limit, offset)?;
    let next_cursor = if rows.len() == args.limit {
        Some((offset + args.limit).to_string())
    } else {
        None
    };

    Ok(AgentListResponse {
        agents: rows
            .into_iter()
            .map(|m| AgentSummary {
                uuid: m.uuid,
                agent_id: m.agent_id,
                label: m.label,
                status: m.status,
                updated_at: m.updated_at,
            })
            .collect(),
        next_cursor,
    })
}

pub async fn archive(ctx: &ServiceContext, caller: &CallerContext, args: AgentIdArgs) -> Result<LifecycleResponse> {
    require_admin(caller)?;
    transition(ctx, &args.agent_id, AgentStatus::Archived, "archived by admin").await
}

pub async fn delete(ctx: &ServiceContext, caller: &CallerContext, args: AgentIdArgs) -> Result<LifecycleResponse> {
    require_admin(caller)?;
    transition(ctx, &args.agent_id, AgentStatus::Deleted, "deleted by admin").await
}

async fn transition(
    ctx: &ServiceContext,
    agent_id: &str,
    to: AgentStatus,
    reason: &str,
) -> Result<LifecycleResponse> {
    let uuid = ctx
        .store
        .find_uuid_by_agent_id(agent_id)?
        .ok_or_else(|| Error::NotFound(format!("agent_id \"{agent_id}\" not found")))?;

    let guard = ctx.locks.acquire(uuid, LOCK_OWNER, &ctx.config.store).await?;
    let persisted = ctx
        .store
        .load(uuid)?
        .ok_or_else(|| Error::NotFound(format!("agent {uuid} not found")))?;
    let mut metadata = persisted.metadata;
    metadata.transition(to, reason);
    ctx.store.save(&metadata, &persisted.state)?;
    drop(guard);

    Ok(LifecycleResponse {
        uuid,
        agent_id: metadata.agent_id,
        status: metadata.status,
        reason: reason.to_string(),
    })
}

pub async fn update_metadata(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: UpdateMetadataArgs,
) -> Result<LifecycleResponse> {
    require_admin(caller)?;

    let uuid = ctx
        .store
        .find_uuid_by_agent_id(&args.agent_id)?
        .ok_or_else(|| Error::NotFound(format!("agent_id \"{}\" not found", args.agent_id)))?;

    let guard = ctx.locks.acquire(uuid, LOCK_OWNER, &ctx.config.store).await?;
    let persisted = ctx
        .store
        .load(uuid)?
        .ok_or_else(|| Error::NotFound(format!("agent {uuid} not found")))?;
    let mut metadata = persisted.metadata;
    if let Some(tags) = args.tags {
        metadata.tags = tags;
    }
    if let Some(note) = args.notes {
        metadata.notes.push(note);
    }
    metadata.updated_at = chrono::Utc::now();
    ctx.store.save(&metadata, &persisted.state)?;
    drop(guard);

    Ok(LifecycleResponse {
        uuid,
        agent_id: metadata.agent_id,
        status: metadata.status,
        reason: "metadata updated".into(),
    })
}
