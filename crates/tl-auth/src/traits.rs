//! Credential service and token source traits

use crate::credentials::SecretToken;
use crate::error::AuthResult;
use crate::metadata::CallMetadata;
use crate::status::Status;
use async_trait::async_trait;
use tl_core::Deadline;

/// The remote service that issues database tokens.
///
/// One call is one attempt; retrying is the transport's job.
#[async_trait]
pub trait CredentialService: Send + Sync {
    async fn create_token(&self, metadata: CallMetadata) -> Result<SecretToken, Status>;
}

/// Something that can hand out a token before a deadline.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self, deadline: &Deadline) -> AuthResult<SecretToken>;
}
