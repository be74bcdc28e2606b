//! Error types for tl-auth

use crate::status::Status;
use std::time::Duration;
use thiserror::Error;

/// Credential acquisition errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// The service answered with a non-retriable status (A001)
    #[error("[A001] Credential service rejected the request: {0}")]
    Rejected(Status),

    /// Every attempt failed with a retriable status (A002)
    #[error("[A002] Credential service still failing after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: Status },

    /// Deadline passed during an attempt or a backoff sleep (A003)
    #[error("[A003] Deadline of {budget:?} exceeded while acquiring a token")]
    DeadlineExceeded { budget: Duration },

    /// Neither a token nor a service account key is configured (A004)
    #[error("[A004] One of 'token' or 'service_account_key_file' must be specified")]
    NoCredentials,

    /// Service account key could not be read or parsed (A005)
    #[error("[A005] Invalid service account key: {message}")]
    InvalidKey { message: String },
}

/// Result type alias for AuthError
pub type AuthResult<T> = Result<T, AuthError>;

impl From<tl_core::DeadlineExceeded> for AuthError {
    fn from(err: tl_core::DeadlineExceeded) -> Self {
        AuthError::DeadlineExceeded { budget: err.budget }
    }
}
