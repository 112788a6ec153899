//! Shared application state passed to every HTTP handler.
//!
//! Grounded on the pack's `AppState` pattern: one `Clone`-able struct built
//! once at startup, everything behind an `Arc`.

use std::sync::Arc;

use sentinel_governance::ServiceContext;

/// Shared application state.
///
/// - `governance` is the single long-lived handle every operation is
///   dispatched through (spec §6).
/// - `admin_token_hash` is read once at startup from the env var named by
///   `config.admin.token_env`; `None` means admin-gated operations are
///   disabled, not silently open (spec §9 "Admin gating" decision, recorded
///   in `DESIGN.md`).
#[derive(Clone)]
pub struct AppState {
    pub governance: Arc<ServiceContext>,
    pub admin_token_hash: Option<Arc<[u8]>>,
}
