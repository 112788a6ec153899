//! The `onboard` operation (spec §4.1, §6): mints a new agent identity and
//! its initial dynamics state.

use uuid::Uuid;

use sentinel_domain::error::{Error, Result};
use sentinel_domain::operation::OnboardArgs;
use sentinel_domain::trace::TraceEvent;
use sentinel_identity::{generate_api_key, validate_agent_id};
use sentinel_store::agent::AgentMetadata;
use sentinel_store::agent_state::AgentState;

use crate::context::ServiceContext;
use crate::response::OnboardResponse;

/// Create a new agent. If `args.agent_id` is absent one is derived from
/// the freshly minted UUID, which always passes format validation and
/// can't collide with an existing agent_id (it was just generated).
pub fn onboard(ctx: &ServiceContext, args: OnboardArgs) -> Result<OnboardResponse> {
    let uuid = Uuid::new_v4();
    let agent_id = match args.agent_id {
        Some(requested) => {
            validate_agent_id(&requested, &ctx.config.identity)?;
            if ctx.store.find_uuid_by_agent_id(&requested)?.is_some() {
                return Err(Error::InvalidArgument(format!(
                    "agent_id \"{requested}\" is already in use"
                )));
            }
            requested
        }
        None => uuid.to_string(),
    };

    let (plaintext_key, key_hash) = generate_api_key(&ctx.config.identity);

    let mut metadata = AgentMetadata::new(uuid, agent_id.clone(), args.display_name, key_hash.as_stored());
    // model_hint has no dedicated column; it rides along as a note, visible
    // through get_metrics without a schema change.
    if let Some(model_hint) = args.model_hint {
        metadata.notes.push(format!("model_hint: {model_hint}"));
    }

    let state = AgentState::initial(&ctx.config.profile, ctx.config.store.history_capacity);

    ctx.store.save(&metadata, &state)?;

    TraceEvent::AgentOnboarded {
        uuid: uuid.to_string(),
        agent_id: agent_id.clone(),
    }
    .emit();

    Ok(OnboardResponse {
        uuid,
        agent_id,
        api_key: plaintext_key,
        status: metadata.status,
        created_at: metadata.created_at,
    })
}
