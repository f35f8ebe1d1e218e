//! Event types for the Sequor engine event bus.
//!
//! `EngineEvent` is the unified event type broadcast while jobs execute.
//! All variants are Clone + Send + Sync for use with tokio broadcast
//! channels. The `JobCompleted` payload is the completion event external
//! notification collaborators consume; the runner emits exactly one per job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fact::Fact;
use crate::job::{Job, JobState, StepOutcome};

/// Events emitted during job execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A job has left Pending and begun executing.
    JobStarted {
        job_id: Uuid,
        sequence: String,
        total_steps: usize,
    },

    /// A step has started its first attempt.
    StepStarted {
        job_id: Uuid,
        step_name: String,
        step_index: usize,
    },

    /// A step reached a terminal outcome.
    StepCompleted {
        job_id: Uuid,
        step_name: String,
        step_index: usize,
        outcome: StepOutcome,
        attempts: u32,
        duration_ms: u64,
    },

    /// A job reached a terminal state. Emitted exactly once per job.
    JobCompleted(JobCompletion),
}

impl EngineEvent {
    pub fn job_id(&self) -> Uuid {
        match self {
            EngineEvent::JobStarted { job_id, .. }
            | EngineEvent::StepStarted { job_id, .. }
            | EngineEvent::StepCompleted { job_id, .. } => *job_id,
            EngineEvent::JobCompleted(completion) => completion.job_id,
        }
    }
}

/// The completion event payload for notification/report collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCompletion {
    pub job_id: Uuid,
    pub sequence: String,
    /// Final state: Completed, Failed, or Cancelled.
    pub state: JobState,
    /// Per-step outcomes in execution order.
    pub outcomes: Vec<StepSummary>,
    /// `successful steps / attempted steps`; FallbackUsed counts as
    /// successful.
    pub success_rate: f64,
    pub duration_ms: u64,
    /// Every fact accumulated over the job's lifetime.
    pub facts: Vec<Fact>,
    pub finished_at: DateTime<Utc>,
}

/// One step's outcome inside a completion event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step_name: String,
    pub outcome: StepOutcome,
    pub attempts: u32,
}

impl From<&Job> for JobCompletion {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            sequence: job.definition.name.clone(),
            state: job.state,
            outcomes: job
                .results
                .iter()
                .map(|r| StepSummary {
                    step_name: r.step_name.clone(),
                    outcome: r.outcome,
                    attempts: r.attempts,
                })
                .collect(),
            success_rate: job.success_rate(),
            duration_ms: job.duration_ms(),
            facts: job.facts.clone(),
            finished_at: job.finished_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::StepResult;
    use crate::sequence::SequenceDefinition;

    fn sample_job() -> Job {
        let mut job = Job::new(SequenceDefinition {
            name: "discovery-chain".to_string(),
            description: String::new(),
            steps: vec![],
        });
        job.state = JobState::Completed;
        job.finished_at = Some(Utc::now());
        job.results = vec![
            StepResult {
                step_name: "recon".to_string(),
                outcome: StepOutcome::Success,
                attempts: 1,
                facts: vec![],
                error: None,
                duration_ms: 40,
            },
            StepResult {
                step_name: "harvest".to_string(),
                outcome: StepOutcome::Skipped,
                attempts: 2,
                facts: vec![],
                error: Some("remote operation failed".to_string()),
                duration_ms: 90,
            },
        ];
        job.facts = vec![Fact::new("host.ip", "10.0.0.5")];
        job
    }

    #[test]
    fn test_job_started_serde_roundtrip() {
        let event = EngineEvent::JobStarted {
            job_id: Uuid::now_v7(),
            sequence: "discovery-chain".to_string(),
            total_steps: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"job_started\""));
        let parsed: EngineEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, EngineEvent::JobStarted { total_steps: 3, .. }));
    }

    #[test]
    fn test_step_completed_serde_roundtrip() {
        let event = EngineEvent::StepCompleted {
            job_id: Uuid::now_v7(),
            step_name: "recon".to_string(),
            step_index: 0,
            outcome: StepOutcome::FallbackUsed,
            attempts: 4,
            duration_ms: 1500,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"step_completed\""));
        assert!(json.contains("\"outcome\":\"fallback_used\""));
        let parsed: EngineEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, EngineEvent::StepCompleted { attempts: 4, .. }));
    }

    #[test]
    fn test_job_completion_from_job() {
        let job = sample_job();
        let completion = JobCompletion::from(&job);
        assert_eq!(completion.job_id, job.id);
        assert_eq!(completion.sequence, "discovery-chain");
        assert_eq!(completion.state, JobState::Completed);
        assert_eq!(completion.outcomes.len(), 2);
        assert_eq!(completion.outcomes[0].outcome, StepOutcome::Success);
        assert_eq!(completion.outcomes[1].attempts, 2);
        assert!((completion.success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(completion.facts.len(), 1);
    }

    #[test]
    fn test_job_completed_serde_roundtrip() {
        let event = EngineEvent::JobCompleted(JobCompletion::from(&sample_job()));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"job_completed\""));
        let parsed: EngineEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, EngineEvent::JobCompleted(_)));
    }

    #[test]
    fn test_job_id_accessor_covers_all_variants() {
        let id = Uuid::now_v7();
        let mut job = sample_job();
        job.id = id;
        let events = vec![
            EngineEvent::JobStarted {
                job_id: id,
                sequence: "s".to_string(),
                total_steps: 1,
            },
            EngineEvent::StepStarted {
                job_id: id,
                step_name: "a".to_string(),
                step_index: 0,
            },
            EngineEvent::StepCompleted {
                job_id: id,
                step_name: "a".to_string(),
                step_index: 0,
                outcome: StepOutcome::Success,
                attempts: 1,
                duration_ms: 5,
            },
            EngineEvent::JobCompleted(JobCompletion::from(&job)),
        ];
        for event in events {
            assert_eq!(event.job_id(), id, "expected id for {event:?}");
        }
    }
}
