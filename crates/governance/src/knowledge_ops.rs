//! The knowledge-graph operations (spec §4.11, §6): `store_discovery`,
//! `search_discoveries`, `leave_note`, `update_discovery_status`.
//!
//! Every write goes through [`identity_resolve::resolve_existing_agent`]
//! first, so a discovery's `author_uuid` is always the caller's own
//! authenticated identity, never an arbitrary string the caller typed in.

use uuid::Uuid;

use sentinel_domain::error::{Error, Result};
use sentinel_domain::operation::{
    CallerContext, LeaveNoteArgs, SearchDiscoveriesArgs, StoreDiscoveryArgs, UpdateDiscoveryStatusArgs,
};
use sentinel_domain::types::{DiscoveryStatus, Severity};
use sentinel_kg::{Discovery, SearchQuery};

use crate::context::ServiceContext;
use crate::identity_resolve::resolve_existing_agent;
use crate::response::{DiscoveryResponse, DiscoveryStatusResponse};

fn to_response(d: Discovery) -> DiscoveryResponse {
    DiscoveryResponse {
        id: d.id,
        author_uuid: d.author_uuid,
        timestamp: d.timestamp,
        severity: d.severity,
        tags: d.tags,
        summary: d.summary,
        details: d.details,
        kind: d.kind,
        status: d.status,
    }
}

pub async fn store_discovery(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: StoreDiscoveryArgs,
) -> Result<DiscoveryResponse> {
    let resolved = resolve_existing_agent(ctx, caller, Some(&args.author), None)?;
    let severity: Severity = args
        .severity
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("unknown severity: {}", args.severity)))?;

    let id = ctx
        .kg
        .store(
            resolved.uuid,
            &args.summary,
            &args.details,
            &args.tags,
            severity,
            &args.discovery_type,
        )
        .await?;

    sentinel_domain::trace::TraceEvent::KnowledgeDiscoveryStored {
        discovery_id: id.to_string(),
        author_uuid: resolved.uuid.to_string(),
    }
    .emit();

    Ok(DiscoveryResponse {
        id,
        author_uuid: resolved.uuid,
        timestamp: chrono::Utc::now(),
        severity,
        tags: args.tags,
        summary: args.summary,
        details: args.details,
        kind: args.discovery_type,
        status: DiscoveryStatus::Open,
    })
}

pub async fn search_discoveries(
    ctx: &ServiceContext,
    args: SearchDiscoveriesArgs,
) -> Result<Vec<DiscoveryResponse>> {
    let severity = args
        .severity
        .map(|s| s.parse::<Severity>())
        .transpose()
        .map_err(|_| Error::InvalidArgument("unknown severity filter".into()))?;
    let author = args
        .author
        .map(|a| a.parse::<Uuid>())
        .transpose()
        .map_err(|_| Error::InvalidArgument("author must be a uuid".into()))?;

    let query = SearchQuery {
        text: args.query,
        tags: if args.tags.is_empty() { None } else { Some(args.tags) },
        severity,
        author,
        limit: args.limit,
    };
    let results = ctx.kg.search(query).await?;
    Ok(results.into_iter().map(to_response).collect())
}

pub async fn leave_note(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: LeaveNoteArgs,
) -> Result<DiscoveryResponse> {
    let resolved = resolve_existing_agent(ctx, caller, Some(&args.author), None)?;
    let id = ctx.kg.leave_note(resolved.uuid, &args.content, &args.tags).await?;

    Ok(DiscoveryResponse {
        id,
        author_uuid: resolved.uuid,
        timestamp: chrono::Utc::now(),
        severity: Severity::Info,
        tags: args.tags,
        summary: args.content.clone(),
        details: args.content,
        kind: "note".into(),
        status: DiscoveryStatus::Open,
    })
}

pub async fn update_discovery_status(
    ctx: &ServiceContext,
    caller: &CallerContext,
    args: UpdateDiscoveryStatusArgs,
) -> Result<DiscoveryStatusResponse> {
    let resolved = resolve_existing_agent(ctx, caller, Some(&args.updater), None)?;
    let discovery_id: Uuid = args
        .discovery_id
        .parse()
        .map_err(|_| Error::InvalidArgument("discovery_id must be a uuid".into()))?;
    let new_status: DiscoveryStatus = args
        .new_status
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("unknown status: {}", args.new_status)))?;

    ctx.kg.update_status(discovery_id, new_status, resolved.uuid).await?;

    Ok(DiscoveryStatusResponse {
        id: discovery_id,
        status: new_status,
        updater_uuid: resolved.uuid,
    })
}
