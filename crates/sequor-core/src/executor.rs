//! Single-step execution against the remote operation service.
//!
//! `StepExecutor` runs one step of a sequence: it computes the step's input
//! facts, starts the remote operation, polls until a terminal state, and
//! applies the step's failure policy (retry with exponential backoff,
//! fallback template, skip, abort). Cancellation is cooperative and checked
//! between waits; an in-flight remote operation gets a best-effort cancel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sequor_types::config::EngineConfig;
use sequor_types::fact::Fact;
use sequor_types::job::{StepOutcome, StepResult};
use sequor_types::sequence::{JobTemplate, RecoveryAction, StepDefinition};
use tokio_util::sync::CancellationToken;

use crate::client::{OperationClient, RemoteJobId, RemoteState};
use crate::fact::filter_facts;
use crate::policy::RecoveryPolicy;

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// What one step execution left behind.
#[derive(Debug)]
pub enum StepVerdict {
    /// The step ran to a terminal outcome. `abort` tells the runner to stop
    /// the sequence after recording the result.
    Done { result: StepResult, abort: bool },
    /// Cancellation was observed before the step reached an outcome. No
    /// result is recorded.
    Cancelled,
}

/// What one attempt (primary or fallback template) left behind.
enum AttemptOutcome {
    Success(Vec<Fact>),
    Failure(String),
    Cancelled,
}

// ---------------------------------------------------------------------------
// StepExecutor
// ---------------------------------------------------------------------------

/// Executes one step at a time on behalf of a job runner.
pub struct StepExecutor<C> {
    client: Arc<C>,
    max_retries: u32,
    step_timeout: Duration,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl<C: OperationClient> StepExecutor<C> {
    pub fn new(client: Arc<C>, config: &EngineConfig, cancel: CancellationToken) -> Self {
        Self {
            client,
            max_retries: config.max_retries,
            step_timeout: Duration::from_secs(config.step_timeout_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            cancel,
        }
    }

    /// Run one step to a terminal outcome or a cancellation checkpoint.
    ///
    /// `accumulated` is the job's fact set as of this step. Input facts are
    /// drawn from it only when the step inherits facts, gated by the step's
    /// glob filters. Output facts of a successful run are returned raw on
    /// the `StepResult`; merging them into the job is the runner's business.
    pub async fn execute(&self, step: &StepDefinition, accumulated: &[Fact]) -> StepVerdict {
        let input_facts = if step.inherit_facts {
            filter_facts(accumulated, &step.fact_filters)
        } else {
            Vec::new()
        };

        let started = Instant::now();
        let mut attempt: u32 = 1;

        loop {
            if self.cancel.is_cancelled() {
                return StepVerdict::Cancelled;
            }

            tracing::debug!(step = step.name.as_str(), attempt, "starting attempt");
            let error = match self.run_attempt(&step.job_template, &input_facts).await {
                AttemptOutcome::Success(facts) => {
                    return StepVerdict::Done {
                        result: self.result(step, StepOutcome::Success, attempt, facts, None, started),
                        abort: false,
                    };
                }
                AttemptOutcome::Cancelled => return StepVerdict::Cancelled,
                AttemptOutcome::Failure(error) => error,
            };

            tracing::warn!(
                step = step.name.as_str(),
                attempt,
                error = error.as_str(),
                "attempt failed"
            );

            match RecoveryPolicy::decide(step.on_failure, attempt, self.max_retries, step.critical) {
                RecoveryAction::Retry => {
                    let delay = RecoveryPolicy::backoff(attempt);
                    tracing::info!(
                        step = step.name.as_str(),
                        attempt,
                        delay_secs = delay.as_secs(),
                        "retrying after backoff"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return StepVerdict::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                RecoveryAction::Fallback => {
                    return self.run_fallback(step, &input_facts, attempt, started, error).await;
                }
                RecoveryAction::Skip => {
                    return StepVerdict::Done {
                        result: self.result(
                            step,
                            StepOutcome::Skipped,
                            attempt,
                            Vec::new(),
                            Some(error),
                            started,
                        ),
                        abort: false,
                    };
                }
                RecoveryAction::Abort => {
                    return StepVerdict::Done {
                        result: self.result(
                            step,
                            StepOutcome::Failed,
                            attempt,
                            Vec::new(),
                            Some(error),
                            started,
                        ),
                        abort: true,
                    };
                }
            }
        }
    }

    /// Run the step's fallback template once. Fallbacks are not retried; a
    /// fallback failure fails the step, aborting the sequence only when the
    /// step is critical.
    async fn run_fallback(
        &self,
        step: &StepDefinition,
        input_facts: &[Fact],
        attempt: u32,
        started: Instant,
        primary_error: String,
    ) -> StepVerdict {
        let Some(template) = step.fallback_job_template.as_ref() else {
            // Validation rejects this shape up front; if a definition slips
            // through anyway, fail the step instead of panicking mid-job.
            return StepVerdict::Done {
                result: self.result(
                    step,
                    StepOutcome::Failed,
                    attempt,
                    Vec::new(),
                    Some(primary_error),
                    started,
                ),
                abort: true,
            };
        };

        let attempt = attempt + 1;
        tracing::info!(step = step.name.as_str(), "running fallback template");

        match self.run_attempt(template, input_facts).await {
            AttemptOutcome::Success(facts) => StepVerdict::Done {
                result: self.result(step, StepOutcome::FallbackUsed, attempt, facts, None, started),
                abort: false,
            },
            AttemptOutcome::Cancelled => StepVerdict::Cancelled,
            AttemptOutcome::Failure(error) => StepVerdict::Done {
                result: self.result(
                    step,
                    StepOutcome::Failed,
                    attempt,
                    Vec::new(),
                    Some(format!("{primary_error}; fallback failed: {error}")),
                    started,
                ),
                abort: step.critical,
            },
        }
    }

    /// One attempt: start the operation, then poll under the per-attempt
    /// timeout. Client errors on start or poll fail the attempt rather than
    /// the engine.
    async fn run_attempt(&self, template: &JobTemplate, input_facts: &[Fact]) -> AttemptOutcome {
        let remote_id = match self.client.start(template, input_facts).await {
            Ok(id) => id,
            Err(err) => return AttemptOutcome::Failure(err.to_string()),
        };
        tracing::debug!(remote_id = %remote_id, "operation started");

        match tokio::time::timeout(self.step_timeout, self.poll_until_terminal(&remote_id)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.cancel_remote(&remote_id).await;
                AttemptOutcome::Failure(format!(
                    "operation timed out after {}s",
                    self.step_timeout.as_secs()
                ))
            }
        }
    }

    async fn poll_until_terminal(&self, remote_id: &RemoteJobId) -> AttemptOutcome {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.cancel_remote(remote_id).await;
                    return AttemptOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let status = match self.client.poll(remote_id).await {
                Ok(status) => status,
                Err(err) => return AttemptOutcome::Failure(err.to_string()),
            };

            // Cancellation checkpoint after each poll returns.
            if self.cancel.is_cancelled() {
                self.cancel_remote(remote_id).await;
                return AttemptOutcome::Cancelled;
            }

            match status.state {
                RemoteState::Running => {}
                RemoteState::Succeeded => return AttemptOutcome::Success(status.facts),
                RemoteState::Failed => {
                    return AttemptOutcome::Failure("remote operation failed".to_string());
                }
            }
        }
    }

    /// Best-effort remote cancel; failures are logged and swallowed.
    async fn cancel_remote(&self, remote_id: &RemoteJobId) {
        if let Err(err) = self.client.cancel(remote_id).await {
            tracing::warn!(
                remote_id = %remote_id,
                error = %err,
                "best-effort remote cancel failed"
            );
        }
    }

    fn result(
        &self,
        step: &StepDefinition,
        outcome: StepOutcome,
        attempts: u32,
        facts: Vec<Fact>,
        error: Option<String>,
        started: Instant,
    ) -> StepResult {
        StepResult {
            step_name: step.name.clone(),
            outcome,
            attempts,
            facts,
            error,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
