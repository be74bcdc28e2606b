use super::*;
use crate::metadata::{REQUEST_ID_HEADER, RETRY_ATTEMPT_HEADER};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Answers from a script of outcomes and records the metadata of every attempt.
struct ScriptedService {
    outcomes: Mutex<VecDeque<Result<SecretToken, Status>>>,
    seen: Mutex<Vec<CallMetadata>>,
}

impl ScriptedService {
    fn new(outcomes: Vec<Result<SecretToken, Status>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn always(status: Status) -> Self {
        Self::new(vec![Err(status); 64])
    }

    fn attempts(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn seen(&self) -> Vec<CallMetadata> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialService for ScriptedService {
    async fn create_token(&self, metadata: CallMetadata) -> Result<SecretToken, Status> {
        self.seen.lock().unwrap().push(metadata);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Status::new(Code::Internal, "script exhausted")))
    }
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff_base: Duration::from_millis(1),
        backoff_cap: Duration::from_millis(5),
        ..RetryPolicy::default()
    }
}

fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(10))
}

#[test]
fn test_default_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.retriable_codes, vec![Code::Unavailable]);
    assert_eq!(policy.backoff_base, Duration::from_millis(50));
    assert_eq!(policy.backoff_cap, Duration::from_secs(60));
    assert!(policy.attempt_header);
}

#[test]
fn test_policy_from_provider() {
    let provider = ProviderConfig {
        max_retries: Some(2),
        ..Default::default()
    };
    assert_eq!(RetryPolicy::from_provider(&provider).max_attempts, 2);
}

#[test]
fn test_backoff_doubles_until_cap() {
    let policy = RetryPolicy::default();
    assert_eq!(backoff_delay(&policy, 0), Duration::from_millis(50));
    assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(100));
    assert_eq!(backoff_delay(&policy, 4), Duration::from_millis(800));
    // 50ms * 2^11 = 102.4s, past the cap
    assert_eq!(backoff_delay(&policy, 11), Duration::from_secs(60));
    assert_eq!(backoff_delay(&policy, 1_000), Duration::from_secs(60));
    assert_eq!(backoff_delay(&policy, u32::MAX), Duration::from_secs(60));
}

#[test]
fn test_jittered_delay_stays_below_raw() {
    let policy = RetryPolicy::default();
    for attempt in 0..8 {
        let raw = backoff_delay(&policy, attempt);
        for _ in 0..50 {
            let delay = policy.delay(attempt);
            assert!(delay <= raw, "{delay:?} > {raw:?} at attempt {attempt}");
        }
    }
}

#[tokio::test]
async fn test_success_on_first_attempt() {
    let service = ScriptedService::new(vec![Ok(SecretToken::new("t1.a.b"))]);
    let transport = RetryingTransport::new(service, fast_policy(5));
    let token = transport.token(&deadline()).await.unwrap();
    assert_eq!(token.expose(), "t1.a.b");
    assert_eq!(transport.service().attempts(), 1);
}

#[tokio::test]
async fn test_retries_unavailable_then_succeeds() {
    let service = ScriptedService::new(vec![
        Err(Status::unavailable("busy")),
        Err(Status::unavailable("busy")),
        Ok(SecretToken::new("t1.a.b")),
    ]);
    let transport = RetryingTransport::new(service, fast_policy(5));
    assert!(transport.token(&deadline()).await.is_ok());
    assert_eq!(transport.service().attempts(), 3);
}

#[tokio::test]
async fn test_exhausted_exactly_at_max_attempts() {
    let transport = RetryingTransport::new(
        ScriptedService::always(Status::unavailable("down")),
        fast_policy(5),
    );
    let err = transport.token(&deadline()).await.unwrap_err();
    match err {
        AuthError::RetryExhausted { attempts, last } => {
            assert_eq!(attempts, 5);
            assert_eq!(last.code, Code::Unavailable);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(transport.service().attempts(), 5);
}

#[tokio::test]
async fn test_non_retriable_fails_after_one_attempt() {
    let transport = RetryingTransport::new(
        ScriptedService::always(Status::new(Code::PermissionDenied, "nope")),
        fast_policy(5),
    );
    let err = transport.token(&deadline()).await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(Status { code: Code::PermissionDenied, .. })));
    assert_eq!(transport.service().attempts(), 1);
}

#[tokio::test]
async fn test_request_id_is_stable_across_retries() {
    let transport = RetryingTransport::new(
        ScriptedService::always(Status::unavailable("down")),
        fast_policy(4),
    );
    let _ = transport.token(&deadline()).await;

    let seen = transport.service().seen();
    assert_eq!(seen.len(), 4);
    let first = seen[0].get(REQUEST_ID_HEADER);
    assert!(first.is_some());
    assert!(seen.iter().all(|md| md.get(REQUEST_ID_HEADER) == first));

    let attempts: Vec<Option<String>> = seen.iter().map(|md| md.get(RETRY_ATTEMPT_HEADER)).collect();
    assert_eq!(
        attempts,
        vec![None, Some("1".into()), Some("2".into()), Some("3".into())]
    );
}

#[tokio::test]
async fn test_separate_calls_get_separate_request_ids() {
    let service = ScriptedService::new(vec![Ok(SecretToken::new("a")), Ok(SecretToken::new("b"))]);
    let transport = RetryingTransport::new(service, fast_policy(5));
    transport.token(&deadline()).await.unwrap();
    transport.token(&deadline()).await.unwrap();

    let seen = transport.service().seen();
    assert_ne!(seen[0].request_id, seen[1].request_id);
}

#[tokio::test]
async fn test_attempt_header_can_be_disabled() {
    let policy = RetryPolicy {
        attempt_header: false,
        ..fast_policy(3)
    };
    let transport = RetryingTransport::new(ScriptedService::always(Status::unavailable("down")), policy);
    let _ = transport.token(&deadline()).await;
    assert!(transport
        .service()
        .seen()
        .iter()
        .all(|md| md.retry_attempt.is_none()));
}

#[tokio::test]
async fn test_deadline_bounds_backoff() {
    let policy = RetryPolicy {
        max_attempts: 10,
        backoff_base: Duration::from_secs(30),
        backoff_cap: Duration::from_secs(60),
        ..RetryPolicy::default()
    };
    let transport = RetryingTransport::new(ScriptedService::always(Status::unavailable("down")), policy);
    let short = Deadline::after(Duration::from_millis(50));

    let started = std::time::Instant::now();
    let err = transport.token(&short).await.unwrap_err();
    assert!(matches!(err, AuthError::DeadlineExceeded { budget } if budget == Duration::from_millis(50)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_deadline_cancels_hanging_attempt() {
    let transport = RetryingTransport::new((), fast_policy(3));
    let short = Deadline::after(Duration::from_millis(20));
    let result: AuthResult<()> = transport
        .call(&short, |_| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
    assert!(matches!(result, Err(AuthError::DeadlineExceeded { .. })));
}

#[tokio::test]
async fn test_call_with_custom_operation() {
    let transport = RetryingTransport::new((), fast_policy(3)).with_user_agent("custom/1.0");
    let calls = Mutex::new(0u32);
    let value = transport
        .call(&deadline(), |md| {
            let n = {
                let mut calls = calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            async move {
                assert_eq!(md.user_agent, "custom/1.0");
                if n < 2 {
                    Err(Status::unavailable("warming up"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
    assert_eq!(value, 2);
}
