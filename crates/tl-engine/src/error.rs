//! Error types for tl-engine

use std::time::Duration;
use thiserror::Error;
use tl_auth::AuthError;
use tl_core::CoreError;
use tl_db::DbError;

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// An identity attribute differs between plan and state (R001)
    #[error("[R001] Cannot change {attribute} of '{resource}' from '{prior}' to '{planned}'")]
    ImmutableAttributeChanged {
        resource: String,
        attribute: &'static str,
        prior: String,
        planned: String,
    },

    /// Resource name not found in config or state (R002)
    #[error("[R002] Unknown resource '{name}'")]
    UnknownResource { name: String },

    /// Operation did not finish within its timeout (R003)
    #[error("[R003] Deadline of {budget:?} exceeded during {during}")]
    DeadlineExceeded { budget: Duration, during: String },

    /// R004: Core error propagation
    #[error("[R004] {0}")]
    Core(#[from] CoreError),

    /// R005: Database error propagation
    #[error("[R005] {0}")]
    Db(DbError),

    /// R006: Credential error propagation
    #[error("[R006] {0}")]
    Auth(AuthError),
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DeadlineExceeded { budget, operation } => EngineError::DeadlineExceeded {
                budget,
                during: operation,
            },
            other => EngineError::Db(other),
        }
    }
}

impl From<AuthError> for EngineError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DeadlineExceeded { budget } => EngineError::DeadlineExceeded {
                budget,
                during: "token acquisition".to_string(),
            },
            other => EngineError::Auth(other),
        }
    }
}
