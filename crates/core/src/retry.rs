//! Bounded retry for units of work that lose a concurrency race.
//!
//! The policy only decides. Callers own the loop and the sleeping.

use std::time::Duration;

use crate::ledger::error::LedgerError;

/// Retry policy for [`LedgerError::ConcurrencyConflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` attempts and default delays. At least one
    /// attempt is always made.
    #[must_use]
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Returns true if attempt number `attempt` (1-based) failed with a
    /// retryable error and attempts remain.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, err: &LedgerError) -> bool {
        err.is_retryable() && attempt < self.max_attempts
    }

    /// Delay after attempt number `attempt` (1-based): doubles each time,
    /// capped at `max_delay`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Error to return once the attempts run out on `last`.
    #[must_use]
    pub fn exhausted(&self, last: LedgerError) -> LedgerError {
        if last.is_retryable() {
            LedgerError::RetriesExhausted {
                attempts: self.max_attempts,
            }
        } else {
            last
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_only_conflicts() {
        let policy = RetryPolicy::with_attempts(3);
        assert!(policy.should_retry(1, &LedgerError::ConcurrencyConflict));
        assert!(policy.should_retry(2, &LedgerError::ConcurrencyConflict));
        assert!(!policy.should_retry(3, &LedgerError::ConcurrencyConflict));
        assert!(!policy.should_retry(1, &LedgerError::MissingCounterparty));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
        assert_eq!(policy.backoff(4), Duration::from_millis(80));
        assert_eq!(policy.backoff(10), Duration::from_millis(500));
        assert_eq!(policy.backoff(40), Duration::from_millis(500));
    }

    #[test]
    fn test_with_attempts_makes_at_least_one() {
        assert_eq!(RetryPolicy::with_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_exhausted_wraps_conflicts_only() {
        let policy = RetryPolicy::with_attempts(4);
        assert_eq!(
            policy.exhausted(LedgerError::ConcurrencyConflict),
            LedgerError::RetriesExhausted { attempts: 4 }
        );
        assert_eq!(
            policy.exhausted(LedgerError::CreditLineInactive),
            LedgerError::CreditLineInactive
        );
    }
}
