//! Bounded retry with exponential backoff and full jitter

use crate::credentials::SecretToken;
use crate::error::{AuthError, AuthResult};
use crate::metadata::CallMetadata;
use crate::status::{Code, Status};
use crate::traits::{CredentialService, TokenSource};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tl_core::{Deadline, ProviderConfig};
use uuid::Uuid;

/// Default number of attempts per logical call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff base
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(50);

/// Default backoff cap
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(60);

/// How a transport retries failed calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per logical call, first attempt included
    pub max_attempts: u32,
    /// Status codes worth retrying; anything else fails immediately
    pub retriable_codes: Vec<Code>,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    /// Send `x-retry-attempt` on retried attempts
    pub attempt_header: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retriable_codes: vec![Code::Unavailable],
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_cap: DEFAULT_BACKOFF_CAP,
            attempt_header: true,
        }
    }
}

impl RetryPolicy {
    /// Default policy with the attempt budget taken from provider settings.
    pub fn from_provider(provider: &ProviderConfig) -> Self {
        Self {
            max_attempts: provider.max_retries(),
            ..Self::default()
        }
    }

    pub fn is_retriable(&self, code: Code) -> bool {
        self.retriable_codes.contains(&code)
    }

    /// Delay before retry `attempt` (0-based), jitter applied.
    pub fn delay(&self, attempt: u32) -> Duration {
        backoff_delay(self, attempt).mul_f64(rand::random::<f64>())
    }
}

/// Pre-jitter backoff for retry `attempt` (0-based): `min(base * 2^attempt, cap)`.
///
/// Computed in floating point so large attempt numbers saturate at the cap
/// instead of overflowing.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let raw = policy.backoff_base.as_secs_f64() * 2f64.powi(exponent);
    let cap = policy.backoff_cap.as_secs_f64();
    if raw.is_nan() || raw >= cap {
        policy.backoff_cap
    } else {
        Duration::from_secs_f64(raw)
    }
}

fn default_user_agent() -> String {
    format!("tideline/{}", env!("CARGO_PKG_VERSION"))
}

/// Runs credential service calls under a [`RetryPolicy`].
pub struct RetryingTransport<S> {
    service: S,
    policy: RetryPolicy,
    user_agent: String,
}

impl<S> RetryingTransport<S> {
    pub fn new(service: S, policy: RetryPolicy) -> Self {
        Self {
            service,
            policy,
            user_agent: default_user_agent(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run one logical call, retrying retriable failures.
    ///
    /// `op` is invoked once per attempt with that attempt's metadata. All
    /// attempts share one request id. The whole sequence, sleeps included,
    /// is bounded by `deadline`.
    pub async fn call<T, F, Fut>(&self, deadline: &Deadline, mut op: F) -> AuthResult<T>
    where
        F: FnMut(CallMetadata) -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        let request_id = Uuid::new_v4();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let mut metadata = CallMetadata::new(request_id, self.user_agent.clone());
            if attempt > 0 && self.policy.attempt_header {
                metadata = metadata.with_retry_attempt(attempt);
            }

            let status = match deadline.run(op(metadata)).await? {
                Ok(value) => return Ok(value),
                Err(status) => status,
            };

            if !self.policy.is_retriable(status.code) {
                return Err(AuthError::Rejected(status));
            }
            if attempt + 1 >= max_attempts {
                return Err(AuthError::RetryExhausted {
                    attempts: attempt + 1,
                    last: status,
                });
            }

            let delay = self.policy.delay(attempt);
            log::debug!(
                "Credential call {} failed ({}), retry attempt {} in {:?}",
                request_id,
                status,
                attempt + 1,
                delay
            );
            deadline.sleep(delay).await?;
            attempt += 1;
        }
    }
}

impl<S: CredentialService> RetryingTransport<S> {
    /// Ask the credential service for a token.
    pub async fn create_token(&self, deadline: &Deadline) -> AuthResult<SecretToken> {
        self.call(deadline, |metadata| self.service.create_token(metadata))
            .await
    }
}

#[async_trait]
impl<S: CredentialService> TokenSource for RetryingTransport<S> {
    async fn token(&self, deadline: &Deadline) -> AuthResult<SecretToken> {
        self.create_token(deadline).await
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
