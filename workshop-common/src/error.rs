// ================================================================
// File: workshop-common/src/error.rs
// ================================================================

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a ledger operation refused to run. Every variant is user-facing, so the
/// messages are written to be shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("insufficient points: need {required}, have {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("out of stock: {product}")]
    OutOfStock { product: String },

    #[error("guests cannot redeem or earn points")]
    GuestForbidden,

    #[error("only student accounts can do this")]
    NotStudent,

    #[error("name already taken: {0}")]
    DuplicateName(String),

    #[error("a submission for this mission is already pending today")]
    DuplicateSubmission,

    #[error("mission already completed today")]
    AlreadyCompletedToday,

    #[error("mission is not active")]
    MissionInactive,

    #[error("expired")]
    MissionExpired,

    #[error("not approved")]
    NotApproved,

    #[error("wish cooldown active until {until}")]
    CooldownActive { until: DateTime<Utc> },

    #[error("no wish cooldown to reset")]
    CooldownNotActive,

    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(Rejection),

    #[error("Not found error: {0}")]
    NotFound(String),

    /// A racing writer invalidated the read set of a transaction.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// True for failures where re-running the enclosing transaction may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Error::PreconditionFailed(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Rejection> for Error {
    fn from(r: Rejection) -> Self {
        Error::PreconditionFailed(r)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Unavailable(e.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}
