//! tl-auth - Credential acquisition for Tideline
//!
//! Database connections are authenticated with a token obtained from a
//! credential service. This crate wraps those calls in a bounded,
//! jittered-backoff retry policy and selects credentials from configuration.

pub mod credentials;
pub mod error;
pub mod metadata;
pub mod retry;
pub mod status;
pub mod traits;

pub use credentials::{Credentials, SecretToken, ServiceAccountKey, StaticCredentialService};
pub use error::{AuthError, AuthResult};
pub use metadata::CallMetadata;
pub use retry::{backoff_delay, RetryPolicy, RetryingTransport};
pub use status::{Code, Status};
pub use traits::{CredentialService, TokenSource};
