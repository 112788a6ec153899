//! Resolves which agent a request targets and authenticates the caller
//! against it (spec §4.7 "Session binding", §4.8 "Caller authorization").
//!
//! Every operation that acts on an existing agent goes through
//! [`resolve_existing_agent`] before touching any state: a session key
//! alone is enough once an agent has bound one, but a bare `agent_id`
//! always requires the matching API key, so a caller that merely guesses
//! another agent's id can't drive it.

use sentinel_domain::error::{Error, Result};
use sentinel_domain::operation::CallerContext;
use sentinel_domain::trace::TraceEvent;
use sentinel_domain::types::AgentStatus;
use sentinel_identity::verify_api_key;
use sentinel_store::agent::AgentMetadata;
use sentinel_store::agent_state::AgentState;
use uuid::Uuid;

use crate::context::ServiceContext;

/// An agent resolved and authorized for the current caller.
pub struct ResolvedAgent {
    pub uuid: Uuid,
    pub metadata: AgentMetadata,
    pub state: AgentState,
}

/// Resolve and authorize the target of a self-service operation.
///
/// Resolution order (spec §4.7/§4.8):
/// 1. A live session binding for `caller.session_key` wins outright — once
///    bound, a session doesn't need to keep re-presenting its API key. If
///    the caller also named an explicit `agent_id` that disagrees with the
///    bound agent, that's a `SessionMismatch`, not a silent override.
/// 2. Otherwise an explicit `agent_id` (from the request args or from
///    `caller.agent_id`) must come with a matching API key (from the
///    request args or `caller.api_key`). A present-but-wrong key is
///    `AuthRequired` and is audit-logged — this is the identity-theft path
///    spec §7 calls out.
/// 3. No session and no agent_id/api_key pair at all is `AuthRequired`.
pub fn resolve_existing_agent(
    ctx: &ServiceContext,
    caller: &CallerContext,
    agent_id: Option<&str>,
    api_key: Option<&str>,
) -> Result<ResolvedAgent> {
    let effective_agent_id = agent_id.or(caller.agent_id.as_deref());
    let effective_api_key = api_key.or(caller.api_key.as_deref());

    if let Some(session_key) = caller.session_key.as_deref() {
        if let Some(bound_uuid) = ctx.sessions.resolve(session_key, ctx.config.identity.session_ttl_secs) {
            if let Some(requested_id) = effective_agent_id {
                let requested_uuid = ctx.store.find_uuid_by_agent_id(requested_id)?;
                if requested_uuid != Some(bound_uuid) {
                    TraceEvent::AuditAuthFailure {
                        agent_id: Some(requested_id.to_string()),
                        reason: "session bound to a different agent".into(),
                    }
                    .emit();
                    return Err(Error::SessionMismatch);
                }
            }
            return load_live(ctx, bound_uuid);
        }
    }

    let Some(agent_id) = effective_agent_id else {
        return Err(Error::AuthRequired(
            "no session binding and no agent_id/api_key supplied".into(),
        ));
    };

    let Some(uuid) = ctx.store.find_uuid_by_agent_id(agent_id)? else {
        return Err(Error::NotFound(format!("agent_id \"{agent_id}\" not found")));
    };

    let resolved = load_live(ctx, uuid)?;

    let Some(api_key) = effective_api_key else {
        TraceEvent::AuditAuthFailure {
            agent_id: Some(agent_id.to_string()),
            reason: "no api_key supplied for agent_id lookup".into(),
        }
        .emit();
        return Err(Error::AuthRequired(format!(
            "agent_id \"{agent_id}\" requires api_key"
        )));
    };

    let stored = sentinel_identity::ApiKeyHash::from_stored(&resolved.metadata.api_key_hash)
        .ok_or_else(|| Error::Storage(format!("corrupt api_key_hash for {agent_id}")))?;
    if !verify_api_key(api_key, &stored) {
        TraceEvent::AuditAuthFailure {
            agent_id: Some(agent_id.to_string()),
            reason: "api_key mismatch".into(),
        }
        .emit();
        return Err(Error::AuthRequired(format!(
            "api_key does not match agent_id \"{agent_id}\""
        )));
    }

    if let Some(session_key) = caller.session_key.as_deref() {
        ctx.sessions.bind(session_key, uuid);
    }

    Ok(resolved)
}

/// Load the persisted record for `uuid`, rejecting a deleted agent as not
/// found (spec §4.6: a deleted record is a tombstone, not a live agent).
fn load_live(ctx: &ServiceContext, uuid: Uuid) -> Result<ResolvedAgent> {
    let persisted = ctx
        .store
        .load(uuid)?
        .ok_or_else(|| Error::NotFound(format!("agent {uuid} not found")))?;
    if persisted.metadata.status == AgentStatus::Deleted {
        return Err(Error::NotFound(format!("agent {uuid} not found")));
    }
    Ok(ResolvedAgent {
        uuid,
        metadata: persisted.metadata,
        state: persisted.state,
    })
}
