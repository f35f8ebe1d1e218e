//! Job execution tracking types for Sequor.
//!
//! A `Job` is the runtime instance of one sequence execution. The owning
//! runner is the only writer; everyone else reads cloned snapshots published
//! through the registry, so these types are plain data with no interior
//! mutability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fact::Fact;
use crate::sequence::SequenceDefinition;

// ---------------------------------------------------------------------------
// States and outcomes
// ---------------------------------------------------------------------------

/// Lifecycle state of a job.
///
/// `Pending -> Running -> {Completed | Failed | Cancelled}`. The three
/// terminal states accept no further execution but remain queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one attempted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Success,
    Failed,
    Skipped,
    FallbackUsed,
}

impl StepOutcome {
    /// Success and FallbackUsed both count toward the success rate and both
    /// contribute output facts.
    pub fn is_successful(&self) -> bool {
        matches!(self, StepOutcome::Success | StepOutcome::FallbackUsed)
    }

    /// Whether a retried job has to re-run this step. Skipped steps stay
    /// skipped; only Failed steps are re-attempted.
    pub fn needs_rerun(&self) -> bool {
        matches!(self, StepOutcome::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Success => "success",
            StepOutcome::Failed => "failed",
            StepOutcome::Skipped => "skipped",
            StepOutcome::FallbackUsed => "fallback_used",
        }
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Step Result
// ---------------------------------------------------------------------------

/// Record of one attempted step, appended exactly once per step index the
/// runner actually reached. Steps after an abort have no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub outcome: StepOutcome,
    /// Total executions of this step, the fallback run included.
    pub attempts: u32,
    /// Output facts; populated only for Success / FallbackUsed.
    #[serde(default)]
    pub facts: Vec<Fact>,
    /// Diagnostic from the last failed attempt, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent on the step across all attempts.
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// The runtime instance of one sequence execution.
///
/// Snapshots of this struct are what the control surface hands out;
/// `current_step` only ever increases and `facts` only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// UUIDv7 assigned at start.
    pub id: Uuid,
    /// The immutable definition this job executes.
    pub definition: SequenceDefinition,
    pub state: JobState,
    /// Index of the step currently (or next) being executed.
    pub current_step: usize,
    /// Step index this job began at: 0 for fresh jobs, the resume index for
    /// retried ones.
    #[serde(default)]
    pub first_step: usize,
    /// One entry per step attempted so far, in execution order.
    #[serde(default)]
    pub results: Vec<StepResult>,
    /// Accumulated facts from all successful steps, raw and unfiltered.
    #[serde(default)]
    pub facts: Vec<Fact>,
    /// Total retries performed across all steps of this job (executions
    /// beyond each step's first attempt).
    #[serde(default)]
    pub retry_count: u32,
    /// The failed job this one was created from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_of: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Terminal diagnostic for Failed jobs (abort reason, timeout).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Create a fresh Pending job for a definition.
    pub fn new(definition: SequenceDefinition) -> Self {
        Self {
            id: Uuid::now_v7(),
            definition,
            state: JobState::Pending,
            current_step: 0,
            first_step: 0,
            results: Vec::new(),
            facts: Vec::new(),
            retry_count: 0,
            retry_of: None,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }

    /// Create a Pending job that resumes a failed one: same definition,
    /// execution starting at `resume_index`, carrying the failed job's
    /// accumulated facts as the starting set.
    pub fn resuming(failed: &Job) -> Self {
        let resume_index = failed.resume_index();
        Self {
            id: Uuid::now_v7(),
            definition: failed.definition.clone(),
            state: JobState::Pending,
            current_step: resume_index,
            first_step: resume_index,
            results: Vec::new(),
            facts: failed.facts.clone(),
            retry_count: 0,
            retry_of: Some(failed.id),
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }

    /// First step index that did not reach Success/Skipped/FallbackUsed.
    ///
    /// For a job whose every recorded step settled (e.g. one interrupted
    /// before the next step produced a result), this is the index right
    /// after the last recorded step.
    pub fn resume_index(&self) -> usize {
        match self.results.iter().position(|r| r.outcome.needs_rerun()) {
            Some(pos) => self.first_step + pos,
            None => self.first_step + self.results.len(),
        }
    }

    /// Fraction of attempted steps that reached Success or FallbackUsed.
    /// 0.0 when no step was attempted.
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let successful = self
            .results
            .iter()
            .filter(|r| r.outcome.is_successful())
            .count();
        successful as f64 / self.results.len() as f64
    }

    /// Wall-clock duration; still ticking for non-terminal jobs.
    pub fn duration_ms(&self) -> u64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0) as u64
    }
}
