//! Per-attempt call metadata

use uuid::Uuid;

/// Header carrying the client request id
pub const REQUEST_ID_HEADER: &str = "x-client-request-id";

/// Header carrying the retry number on retried attempts
pub const RETRY_ATTEMPT_HEADER: &str = "x-retry-attempt";

pub const USER_AGENT_HEADER: &str = "user-agent";

/// Metadata sent with one attempt of a call.
///
/// The request id is generated once per logical call and shared by all of
/// its attempts. `retry_attempt` is set only on retries (1 for the first
/// retry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMetadata {
    pub request_id: Uuid,
    pub retry_attempt: Option<u32>,
    pub user_agent: String,
}

impl CallMetadata {
    pub fn new(request_id: Uuid, user_agent: impl Into<String>) -> Self {
        Self {
            request_id,
            retry_attempt: None,
            user_agent: user_agent.into(),
        }
    }

    pub fn with_retry_attempt(mut self, attempt: u32) -> Self {
        self.retry_attempt = Some(attempt);
        self
    }

    /// Header pairs in send order.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            (USER_AGENT_HEADER, self.user_agent.clone()),
            (REQUEST_ID_HEADER, self.request_id.to_string()),
        ];
        if let Some(attempt) = self.retry_attempt {
            headers.push((RETRY_ATTEMPT_HEADER, attempt.to_string()));
        }
        headers
    }

    /// Value of header `name`, if present.
    pub fn get(&self, name: &str) -> Option<String> {
        self.headers()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_has_no_retry_header() {
        let md = CallMetadata::new(Uuid::new_v4(), "tideline/0.1.0");
        assert_eq!(md.get(RETRY_ATTEMPT_HEADER), None);
        assert_eq!(md.get(USER_AGENT_HEADER).as_deref(), Some("tideline/0.1.0"));
        assert_eq!(md.headers().len(), 2);
    }

    #[test]
    fn test_retry_header() {
        let id = Uuid::new_v4();
        let md = CallMetadata::new(id, "ua").with_retry_attempt(3);
        assert_eq!(md.get(RETRY_ATTEMPT_HEADER).as_deref(), Some("3"));
        assert_eq!(md.get(REQUEST_ID_HEADER), Some(id.to_string()));
    }
}
