//! Failure-recovery policy evaluation.
//!
//! Pure decision logic with no I/O: given how a step is configured and which
//! attempt just failed, pick the next action. The step executor owns the
//! sleeping and re-running; this module only decides.

use std::time::Duration;

use sequor_types::sequence::RecoveryAction;

/// Ceiling for the exponential backoff, in seconds.
pub const BACKOFF_CAP_SECS: u64 = 30;

/// Stateless recovery-policy evaluator.
///
/// No internal state; all logic is in associated functions that take the
/// step's configuration as parameters.
pub struct RecoveryPolicy;

impl RecoveryPolicy {
    /// Decide what to do after attempt `attempt` (1-based) of a step failed.
    ///
    /// Precedence: a configured Retry within the budget retries; a Retry
    /// with the budget exhausted escalates to Abort; otherwise the
    /// configured action stands, except that a critical step's Skip becomes
    /// Abort -- a critical step is never silently skipped.
    pub fn decide(
        on_failure: RecoveryAction,
        attempt: u32,
        max_retries: u32,
        critical: bool,
    ) -> RecoveryAction {
        match on_failure {
            RecoveryAction::Retry if attempt <= max_retries => RecoveryAction::Retry,
            RecoveryAction::Retry => RecoveryAction::Abort,
            RecoveryAction::Skip if critical => RecoveryAction::Abort,
            other => other,
        }
    }

    /// Backoff before re-running attempt `attempt + 1`: `min(2^attempt, 30)`
    /// seconds.
    pub fn backoff(attempt: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(attempt).min(BACKOFF_CAP_SECS))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule_doubles_then_caps() {
        let schedule: Vec<u64> = (1..=6)
            .map(|attempt| RecoveryPolicy::backoff(attempt).as_secs())
            .collect();
        assert_eq!(schedule, vec![2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn test_backoff_is_safe_for_huge_attempt_numbers() {
        assert_eq!(RecoveryPolicy::backoff(64).as_secs(), BACKOFF_CAP_SECS);
        assert_eq!(RecoveryPolicy::backoff(u32::MAX).as_secs(), BACKOFF_CAP_SECS);
    }

    #[test]
    fn test_retry_within_budget() {
        for attempt in 1..=3 {
            assert_eq!(
                RecoveryPolicy::decide(RecoveryAction::Retry, attempt, 3, false),
                RecoveryAction::Retry
            );
        }
    }

    #[test]
    fn test_retry_exhausted_escalates_to_abort() {
        assert_eq!(
            RecoveryPolicy::decide(RecoveryAction::Retry, 4, 3, false),
            RecoveryAction::Abort
        );
        // Zero budget: the first failure already exhausts it.
        assert_eq!(
            RecoveryPolicy::decide(RecoveryAction::Retry, 1, 0, false),
            RecoveryAction::Abort
        );
    }

    #[test]
    fn test_critical_overrides_skip_into_abort() {
        assert_eq!(
            RecoveryPolicy::decide(RecoveryAction::Skip, 1, 3, true),
            RecoveryAction::Abort
        );
        assert_eq!(
            RecoveryPolicy::decide(RecoveryAction::Skip, 1, 3, false),
            RecoveryAction::Skip
        );
    }

    #[test]
    fn test_fallback_and_abort_pass_through() {
        assert_eq!(
            RecoveryPolicy::decide(RecoveryAction::Fallback, 1, 3, false),
            RecoveryAction::Fallback
        );
        // Critical does not redirect a configured Fallback; the executor
        // handles a critical fallback failure.
        assert_eq!(
            RecoveryPolicy::decide(RecoveryAction::Fallback, 1, 3, true),
            RecoveryAction::Fallback
        );
        assert_eq!(
            RecoveryPolicy::decide(RecoveryAction::Abort, 1, 3, false),
            RecoveryAction::Abort
        );
    }
}
