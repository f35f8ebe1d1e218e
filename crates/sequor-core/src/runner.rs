//! Whole-sequence execution.
//!
//! `SequenceRunner` owns one job from Running to its terminal state. It
//! drives steps in order through a `StepExecutor`, merges output facts into
//! the job's accumulated set, publishes a fresh snapshot after every
//! transition, and emits lifecycle events on the bus. Exactly one
//! `JobCompleted` event is published per job, whatever the terminal state.
//!
//! Snapshots go out through a `tokio::sync::watch` channel: readers always
//! see the latest complete `Job` value without locking the runner.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sequor_types::config::EngineConfig;
use sequor_types::event::{EngineEvent, JobCompletion};
use sequor_types::job::{Job, JobState};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::OperationClient;
use crate::event::EventBus;
use crate::executor::{StepExecutor, StepVerdict};

/// How a pass over the remaining steps ended.
enum RunEnd {
    /// Every remaining step reached an outcome and none aborted.
    Completed,
    /// A step outcome demanded the sequence stop early.
    Aborted { error: String },
    /// Cancellation was observed at a checkpoint.
    Cancelled,
}

/// Drives one job to completion.
pub struct SequenceRunner<C> {
    client: Arc<C>,
    config: EngineConfig,
    events: EventBus,
    cancel: CancellationToken,
    snapshot: watch::Sender<Job>,
}

impl<C: OperationClient> SequenceRunner<C> {
    pub fn new(
        client: Arc<C>,
        config: EngineConfig,
        events: EventBus,
        cancel: CancellationToken,
        snapshot: watch::Sender<Job>,
    ) -> Self {
        Self {
            client,
            config,
            events,
            cancel,
            snapshot,
        }
    }

    /// Run the job to a terminal state and return its final form.
    pub async fn run(self, mut job: Job) -> Job {
        // A job cancelled while still Pending goes straight to Cancelled
        // without starting anything.
        if self.cancel.is_cancelled() {
            job.state = JobState::Cancelled;
            return self.finish(job);
        }

        job.state = JobState::Running;
        self.events.publish(EngineEvent::JobStarted {
            job_id: job.id,
            sequence: job.definition.name.clone(),
            total_steps: job.definition.steps.len(),
        });
        self.publish_snapshot(&job);
        tracing::info!(
            job_id = %job.id,
            sequence = job.definition.name.as_str(),
            first_step = job.first_step,
            "starting sequence execution"
        );

        let end = match self.config.sequence_timeout_secs.map(Duration::from_secs) {
            Some(limit) => {
                let job_id = job.id;
                let run = self.run_steps(&mut job);
                tokio::pin!(run);
                tokio::select! {
                    end = &mut run => end,
                    _ = tokio::time::sleep(limit) => {
                        tracing::warn!(
                            job_id = %job_id,
                            limit_secs = limit.as_secs(),
                            "sequence timeout reached, cancelling"
                        );
                        self.cancel.cancel();
                        // Let the in-flight step unwind through its
                        // cancellation checkpoints before relabelling.
                        let _ = run.await;
                        RunEnd::Aborted {
                            error: format!("sequence timed out after {}s", limit.as_secs()),
                        }
                    }
                }
            }
            None => self.run_steps(&mut job).await,
        };

        match end {
            RunEnd::Completed => job.state = JobState::Completed,
            RunEnd::Aborted { error } => {
                job.state = JobState::Failed;
                job.error = Some(error);
            }
            RunEnd::Cancelled => job.state = JobState::Cancelled,
        }
        self.finish(job)
    }

    /// Execute steps from `current_step` to the end of the definition.
    async fn run_steps(&self, job: &mut Job) -> RunEnd {
        let executor = StepExecutor::new(
            Arc::clone(&self.client),
            &self.config,
            self.cancel.clone(),
        );
        let total = job.definition.steps.len();

        while job.current_step < total {
            if self.cancel.is_cancelled() {
                return RunEnd::Cancelled;
            }

            let index = job.current_step;
            let step = &job.definition.steps[index];
            self.events.publish(EngineEvent::StepStarted {
                job_id: job.id,
                step_name: step.name.clone(),
                step_index: index,
            });
            tracing::info!(
                job_id = %job.id,
                step = step.name.as_str(),
                step_index = index,
                "executing step"
            );

            let verdict = executor.execute(step, &job.facts).await;
            match verdict {
                StepVerdict::Cancelled => return RunEnd::Cancelled,
                StepVerdict::Done { result, abort } => {
                    job.retry_count += result.attempts.saturating_sub(1);
                    if result.outcome.is_successful() {
                        job.facts.extend(result.facts.iter().cloned());
                    }
                    self.events.publish(EngineEvent::StepCompleted {
                        job_id: job.id,
                        step_name: result.step_name.clone(),
                        step_index: index,
                        outcome: result.outcome,
                        attempts: result.attempts,
                        duration_ms: result.duration_ms,
                    });
                    let abort_error = if abort { result.error.clone() } else { None };
                    job.results.push(result);
                    job.current_step = index + 1;
                    self.publish_snapshot(job);

                    if abort {
                        return RunEnd::Aborted {
                            error: abort_error
                                .unwrap_or_else(|| "critical step failed".to_string()),
                        };
                    }
                }
            }
        }
        RunEnd::Completed
    }

    /// Seal the job, emit the one `JobCompleted` event, and publish the
    /// final snapshot.
    fn finish(&self, mut job: Job) -> Job {
        job.finished_at = Some(Utc::now());
        tracing::info!(
            job_id = %job.id,
            state = %job.state,
            steps = job.results.len(),
            retries = job.retry_count,
            "sequence finished"
        );
        // Snapshot first: a consumer reacting to the completion event must
        // already see the terminal state when it reads the snapshot.
        self.publish_snapshot(&job);
        self.events
            .publish(EngineEvent::JobCompleted(JobCompletion::from(&job)));
        job
    }

    fn publish_snapshot(&self, job: &Job) {
        self.snapshot.send_replace(job.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
