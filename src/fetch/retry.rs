//! Retry decisions for dataset requests.
//!
//! The fetch loop asks [`RetryPolicy::next_action`] what to do after every
//! failed attempt. Keeping the decision a pure function of the attempt count
//! and the failure means the backoff schedule is tested without timers.

use std::fmt;
use std::time::Duration;

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with a non-success status.
    Status(u16),
    /// No usable answer: connect error, timeout, broken body.
    Transport(String),
}

impl FetchFailure {
    /// 5xx and transport failures may succeed on a later attempt; anything
    /// else (4xx, unexpected 1xx/3xx) will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchFailure::Status(status) => (500..600).contains(status),
            FetchFailure::Transport(_) => true,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(status) => write!(f, "HTTP {}", status),
            FetchFailure::Transport(message) => write!(f, "{}", message),
        }
    }
}

/// What the fetch loop does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Sleep for `delay`, then attempt again.
    Retry { delay: Duration },
    /// Terminal failure; do not retry.
    GiveUp,
    /// Retryable failure but the attempt budget is spent.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each retry after that.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Decide the next step after `attempts_made` attempts ended in `failure`.
    pub fn next_action(&self, attempts_made: u32, failure: &FetchFailure) -> RetryAction {
        if !failure.is_retryable() {
            return RetryAction::GiveUp;
        }
        if attempts_made >= self.max_attempts {
            return RetryAction::Exhausted;
        }
        RetryAction::Retry {
            delay: self.delay_before_retry(attempts_made),
        }
    }

    /// `base_delay * 2^(attempts_made - 1)`: 1s, 2s, 4s, ... by default.
    pub fn delay_before_retry(&self, attempts_made: u32) -> Duration {
        let exponent = attempts_made.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_terminal() {
        let policy = RetryPolicy::default();
        for status in [400, 401, 403, 404, 429] {
            assert_eq!(
                policy.next_action(1, &FetchFailure::Status(status)),
                RetryAction::GiveUp,
                "status {} should not be retried",
                status
            );
        }
    }

    #[test]
    fn server_errors_back_off_exponentially() {
        let policy = RetryPolicy::default();
        let failure = FetchFailure::Status(503);
        assert_eq!(
            policy.next_action(1, &failure),
            RetryAction::Retry { delay: Duration::from_secs(1) }
        );
        assert_eq!(
            policy.next_action(2, &failure),
            RetryAction::Retry { delay: Duration::from_secs(2) }
        );
        assert_eq!(policy.next_action(3, &failure), RetryAction::Exhausted);
    }

    #[test]
    fn transport_failures_are_retryable() {
        let policy = RetryPolicy::default();
        let failure = FetchFailure::Transport("connection reset".to_string());
        assert!(matches!(policy.next_action(1, &failure), RetryAction::Retry { .. }));
    }

    #[test]
    fn larger_budget_keeps_doubling() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
        };
        assert_eq!(policy.delay_before_retry(4), Duration::from_secs(2));
        assert_eq!(
            policy.next_action(5, &FetchFailure::Status(500)),
            RetryAction::Exhausted
        );
    }

    #[test]
    fn redirect_status_is_terminal() {
        assert!(!FetchFailure::Status(302).is_retryable());
    }
}
