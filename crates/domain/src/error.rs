use serde::Serialize;

/// Shared error type used across all sentinel crates.
///
/// Every variant maps to one of the stable error codes in the public API
/// (see [`ErrorCode`]); the mapping is the single place that decides how an
/// internal failure is rendered at the transport boundary.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("reserved name: {0}")]
    ReservedName(String),

    #[error("auth required: {0}")]
    AuthRequired(String),

    #[error("session mismatch: bound agent does not match requested agent_id")]
    SessionMismatch,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not bound: no agent is bound to this session")]
    NotBound,

    #[error("busy: {retry_after_ms}ms")]
    Busy { retry_after_ms: u64 },

    #[error("agent paused: {agent_id}")]
    AgentPaused { agent_id: String },

    #[error("dynamics instability: {0}")]
    DynamicsInstability(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("no reviewer available")]
    NoReviewerAvailable,

    #[error("unsafe conditions: {0}")]
    UnsafeConditions(String),

    #[error("wrong phase: expected {expected}, got {actual}")]
    WrongPhase { expected: String, actual: String },

    #[error("max rounds exceeded")]
    MaxRoundsExceeded,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("http: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Stable, wire-level error code. Never renamed once shipped — clients match
/// on this, not on the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidArgument,
    ReservedName,
    AuthRequired,
    SessionMismatch,
    NotFound,
    NotBound,
    Busy,
    AgentPaused,
    DynamicsInstability,
    StorageError,
    ServiceUnavailable,
    NoReviewerAvailable,
    UnsafeConditions,
    WrongPhase,
    MaxRoundsExceeded,
    Internal,
}

/// A hint pointing the caller at the next operation to try.
#[derive(Debug, Clone, Serialize)]
pub struct Recovery {
    pub operation: String,
    pub note: String,
}

/// The structured error shape returned at the transport boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Recovery>,
}

impl Error {
    /// Convert to the transport-level structured error. This is the only
    /// place that should ever inspect the error variant past this boundary —
    /// callers inside the core propagate `Error` with `?`, never match on it.
    pub fn to_response(&self) -> ErrorResponse {
        let (code, recovery) = match self {
            Error::InvalidArgument(_) => (ErrorCode::InvalidArgument, None),
            Error::ReservedName(_) => (ErrorCode::ReservedName, None),
            Error::AuthRequired(_) => (ErrorCode::AuthRequired, None),
            Error::SessionMismatch => (ErrorCode::SessionMismatch, None),
            Error::NotFound(_) => (ErrorCode::NotFound, None),
            Error::NotBound => (
                ErrorCode::NotBound,
                Some(Recovery {
                    operation: "onboard".into(),
                    note: "no agent is bound to this session yet".into(),
                }),
            ),
            Error::Busy { retry_after_ms } => (
                ErrorCode::Busy,
                Some(Recovery {
                    operation: "retry".into(),
                    note: format!("retry after {retry_after_ms}ms"),
                }),
            ),
            Error::AgentPaused { .. } => (
                ErrorCode::AgentPaused,
                Some(Recovery {
                    operation: "direct_resume_if_safe".into(),
                    note: "or request_dialectic_review if unsafe to auto-resume".into(),
                }),
            ),
            Error::DynamicsInstability(_) => (
                ErrorCode::DynamicsInstability,
                Some(Recovery {
                    operation: "process_update".into(),
                    note: "retry once; state was rolled back".into(),
                }),
            ),
            Error::Storage(_) => (ErrorCode::StorageError, None),
            Error::ServiceUnavailable(_) => (ErrorCode::ServiceUnavailable, None),
            Error::NoReviewerAvailable => (ErrorCode::NoReviewerAvailable, None),
            Error::UnsafeConditions(_) => (ErrorCode::UnsafeConditions, None),
            Error::WrongPhase { .. } => (ErrorCode::WrongPhase, None),
            Error::MaxRoundsExceeded => (ErrorCode::MaxRoundsExceeded, None),
            Error::Http(_) | Error::Timeout(_) => (ErrorCode::ServiceUnavailable, None),
            Error::Io(_) | Error::Json(_) | Error::Config(_) | Error::Other(_) => {
                (ErrorCode::Internal, None)
            }
        };
        ErrorResponse {
            code,
            message: self.to_string(),
            recovery,
        }
    }

    /// Whether this error is security-relevant and must be written to the
    /// audit log (spec §7).
    pub fn is_audit_worthy(&self) -> bool {
        matches!(self, Error::AuthRequired(_) | Error::SessionMismatch)
    }
}
