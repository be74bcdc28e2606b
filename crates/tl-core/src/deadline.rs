//! Explicit deadlines threaded through every blocking call.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Returned when a future does not finish before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {budget:?} exceeded")]
pub struct DeadlineExceeded {
    pub budget: Duration,
}

/// A point in time by which an operation must complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        let now = Instant::now();
        // Durations too large to add are treated as "effectively never".
        let at = now
            .checked_add(budget)
            .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365));
        Self { at, budget }
    }

    /// The budget this deadline was created with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Fail once the deadline has passed.
    pub fn check(&self) -> Result<(), DeadlineExceeded> {
        if self.is_expired() {
            return Err(DeadlineExceeded {
                budget: self.budget,
            });
        }
        Ok(())
    }

    /// Run `fut`, cancelling it if the deadline passes first.
    ///
    /// `fut` is never polled once the deadline has passed, so work that
    /// completes on its first poll cannot slip through an expired deadline.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, DeadlineExceeded> {
        self.check()?;
        tokio::time::timeout_at(self.at, fut)
            .await
            .map_err(|_| DeadlineExceeded {
                budget: self.budget,
            })
    }

    /// Sleep for `delay`, or fail if the deadline would pass first.
    pub async fn sleep(&self, delay: Duration) -> Result<(), DeadlineExceeded> {
        if delay > self.remaining() {
            tokio::time::sleep_until(self.at).await;
            return Err(DeadlineExceeded {
                budget: self.budget,
            });
        }
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes_within_budget() {
        let deadline = Deadline::after(Duration::from_secs(5));
        assert_eq!(deadline.run(async { 7 }).await, Ok(7));
        assert!(!deadline.is_expired());
        assert!(deadline.remaining() <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_cancels_slow_future() {
        let deadline = Deadline::after(Duration::from_millis(20));
        let result = deadline
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert_eq!(
            result,
            Err(DeadlineExceeded {
                budget: Duration::from_millis(20)
            })
        );
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_expired_deadline_never_polls() {
        let deadline = Deadline::after(Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(deadline.check(), Err(DeadlineExceeded { budget: Duration::from_millis(1) }));

        let mut polled = false;
        let result = deadline
            .run(async {
                polled = true;
            })
            .await;
        assert!(result.is_err());
        assert!(!polled);
    }

    #[tokio::test]
    async fn test_sleep_past_deadline_fails() {
        let deadline = Deadline::after(Duration::from_millis(10));
        assert!(deadline.sleep(Duration::from_secs(5)).await.is_err());

        let roomy = Deadline::after(Duration::from_secs(5));
        assert!(roomy.sleep(Duration::from_millis(1)).await.is_ok());
    }

    #[test]
    fn test_huge_budget_does_not_overflow() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let deadline = Deadline::after(Duration::MAX);
            assert!(!deadline.is_expired());
            assert_eq!(deadline.budget(), Duration::MAX);
        });
    }
}
