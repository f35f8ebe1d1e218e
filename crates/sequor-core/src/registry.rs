//! Concurrent job registry and control surface.
//!
//! `JobRegistry` owns every job the engine has started: one background task
//! per running job, one `watch` snapshot channel per job for lock-free
//! status reads, and a shared event bus for lifecycle notifications. All
//! operations are safe under concurrent callers; the map itself is a
//! `DashMap`, so each operation's critical section is one shard lock.
//!
//! Jobs are never mutated from the outside. Callers read snapshots; the only
//! writer is the job's own runner. Cancellation is requested through the
//! job's token and observed cooperatively.

use std::sync::Arc;

use dashmap::DashMap;
use sequor_types::config::EngineConfig;
use sequor_types::error::{RegistryError, ValidationError};
use sequor_types::event::EngineEvent;
use sequor_types::job::{Job, JobState};
use sequor_types::sequence::SequenceDefinition;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::OperationClient;
use crate::event::EventBus;
use crate::runner::SequenceRunner;
use crate::sequence::validate_definition;

/// Event bus capacity for job lifecycle events.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

struct JobEntry {
    snapshot: watch::Receiver<Job>,
    cancel: CancellationToken,
}

/// Tracks every started job and exposes the start/status/list/cancel/retry
/// surface.
pub struct JobRegistry<C> {
    client: Arc<C>,
    config: EngineConfig,
    events: EventBus,
    jobs: DashMap<Uuid, JobEntry>,
}

impl<C: OperationClient + 'static> JobRegistry<C> {
    pub fn new(client: Arc<C>, config: EngineConfig) -> Self {
        Self {
            client,
            config,
            events: EventBus::new(DEFAULT_EVENT_CAPACITY),
            jobs: DashMap::new(),
        }
    }

    /// Validate a definition and launch it as a new job. Returns the job id
    /// immediately; execution proceeds in a background task.
    pub fn start_sequence(&self, definition: SequenceDefinition) -> Result<Uuid, ValidationError> {
        validate_definition(&definition)?;
        let job = Job::new(definition);
        tracing::info!(
            job_id = %job.id,
            sequence = job.definition.name.as_str(),
            "starting sequence job"
        );
        Ok(self.spawn(job))
    }

    /// Create and launch a new job resuming a Failed one from its first
    /// unsettled step, carrying the accumulated facts forward.
    pub fn retry_job(&self, id: Uuid) -> Result<Uuid, RegistryError> {
        let failed = self.get_status(id)?;
        if failed.state != JobState::Failed {
            return Err(RegistryError::InvalidState {
                id,
                state: failed.state,
                action: "retry",
            });
        }
        let job = Job::resuming(&failed);
        tracing::info!(
            job_id = %job.id,
            retry_of = %id,
            first_step = job.first_step,
            "retrying failed job"
        );
        Ok(self.spawn(job))
    }

    fn spawn(&self, job: Job) -> Uuid {
        let id = job.id;
        let cancel = CancellationToken::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(job.clone());
        // Insert before spawning so the id resolves the moment we return.
        self.jobs.insert(
            id,
            JobEntry {
                snapshot: snapshot_rx,
                cancel: cancel.clone(),
            },
        );
        let runner = SequenceRunner::new(
            Arc::clone(&self.client),
            self.config.clone(),
            self.events.clone(),
            cancel,
            snapshot_tx,
        );
        tokio::spawn(async move {
            runner.run(job).await;
        });
        id
    }

    /// Latest snapshot of one job.
    pub fn get_status(&self, id: Uuid) -> Result<Job, RegistryError> {
        match self.jobs.get(&id) {
            Some(entry) => Ok(entry.snapshot.borrow().clone()),
            None => Err(RegistryError::NotFound(id)),
        }
    }

    /// Snapshots of every known job, most recently started first.
    pub fn list_jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .map(|entry| entry.snapshot.borrow().clone())
            .collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        jobs
    }

    /// Request cooperative cancellation. A no-op on already-terminal jobs,
    /// so repeated cancels always succeed.
    pub fn cancel_job(&self, id: Uuid) -> Result<Job, RegistryError> {
        let entry = self.jobs.get(&id).ok_or(RegistryError::NotFound(id))?;
        let job = entry.snapshot.borrow().clone();
        if job.state.is_terminal() {
            return Ok(job);
        }
        tracing::info!(job_id = %id, "cancellation requested");
        entry.cancel.cancel();
        Ok(job)
    }

    /// Drop a terminal job from the registry. Running jobs must be cancelled
    /// first.
    pub fn evict_job(&self, id: Uuid) -> Result<Job, RegistryError> {
        let job = self.get_status(id)?;
        if !job.state.is_terminal() {
            return Err(RegistryError::InvalidState {
                id,
                state: job.state,
                action: "evict",
            });
        }
        self.jobs.remove(&id);
        tracing::info!(job_id = %id, "job evicted");
        Ok(job)
    }

    /// Subscribe to lifecycle events for all jobs.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
