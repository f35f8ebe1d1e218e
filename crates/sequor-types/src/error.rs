//! Error types shared across the Sequor engine.
//!
//! Three families, matching how errors propagate: definition validation
//! (fails fast, never retried), remote client failures (absorbed into step
//! attempts by the executor), and registry misuse (surfaced straight to the
//! caller).

use thiserror::Error;
use uuid::Uuid;

use crate::job::JobState;

/// A sequence definition failed validation.
///
/// Carries every violation found, not just the first, so the caller gets one
/// complete report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sequence definition: {}", violations.join("; "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl ValidationError {
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }
}

/// Failure talking to the remote operation service.
///
/// The retry logic treats both variants the same way: the attempt failed.
/// The distinction only matters for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Service unreachable, connection dropped, or request timed out.
    #[error("remote service unreachable: {0}")]
    Transport(String),

    /// Service explicitly refused the job (e.g. bad template).
    #[error("remote service rejected the job: {0}")]
    Rejected(String),
}

/// Control-surface misuse against the job registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Unknown job id.
    #[error("job not found: {0}")]
    NotFound(Uuid),

    /// Operation not valid for the job's current state (e.g. retrying a job
    /// that is not Failed).
    #[error("cannot {action} job {id} in state {state}")]
    InvalidState {
        id: Uuid,
        state: JobState,
        action: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_all_violations() {
        let err = ValidationError::new(vec![
            "sequence has no steps".to_string(),
            "step 'x' has an empty job template".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("invalid sequence definition: "));
        assert!(msg.contains("sequence has no steps"));
        assert!(msg.contains("; step 'x' has an empty job template"));
    }

    #[test]
    fn test_client_error_display() {
        let transport = ClientError::Transport("connection refused".to_string());
        assert_eq!(
            transport.to_string(),
            "remote service unreachable: connection refused"
        );
        let rejected = ClientError::Rejected("unknown adversary profile".to_string());
        assert_eq!(
            rejected.to_string(),
            "remote service rejected the job: unknown adversary profile"
        );
    }

    #[test]
    fn test_registry_error_display() {
        let id = Uuid::now_v7();
        let not_found = RegistryError::NotFound(id);
        assert_eq!(not_found.to_string(), format!("job not found: {id}"));

        let invalid = RegistryError::InvalidState {
            id,
            state: JobState::Running,
            action: "retry",
        };
        assert_eq!(
            invalid.to_string(),
            format!("cannot retry job {id} in state running")
        );
    }
}
