//! Remote operation service contract.
//!
//! The external adversary-emulation service runs operations; the engine only
//! ever starts one, polls its state, and cancels it. This module defines that
//! narrow contract as a trait. The HTTP implementation lives in
//! `sequor-infra`; tests use the scripted mock at the bottom of this file.

use sequor_types::error::ClientError;
use sequor_types::fact::Fact;
use sequor_types::sequence::JobTemplate;

// ---------------------------------------------------------------------------
// Remote identifiers and states
// ---------------------------------------------------------------------------

/// Identifier the remote service assigns to a started operation. Opaque to
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteJobId(String);

impl RemoteJobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RemoteJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RemoteJobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// State of a remote operation as seen by one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Running,
    Succeeded,
    Failed,
}

/// One poll's answer: the state plus the output facts the service reported.
/// Facts are populated once the operation has Succeeded.
#[derive(Debug, Clone)]
pub struct OperationStatus {
    pub state: RemoteState,
    pub facts: Vec<Fact>,
}

// ---------------------------------------------------------------------------
// OperationClient trait
// ---------------------------------------------------------------------------

/// Adapter over the remote service's start/poll/cancel contract.
///
/// Uses RPITIT (return-position `impl Trait` in traits) for async methods,
/// consistent with the project's Rust 2024 edition approach. `poll` is one
/// non-blocking check; the step executor owns the polling loop and interval.
/// `cancel` is best-effort and idempotent -- a remote job that no longer
/// exists is not an error.
pub trait OperationClient: Send + Sync {
    /// Start an operation from an opaque template plus the step's input
    /// facts.
    fn start(
        &self,
        template: &JobTemplate,
        input_facts: &[Fact],
    ) -> impl std::future::Future<Output = Result<RemoteJobId, ClientError>> + Send;

    /// Check a started operation's state once.
    fn poll(
        &self,
        remote_id: &RemoteJobId,
    ) -> impl std::future::Future<Output = Result<OperationStatus, ClientError>> + Send;

    /// Ask the remote service to stop an operation.
    fn cancel(
        &self,
        remote_id: &RemoteJobId,
    ) -> impl std::future::Future<Output = Result<(), ClientError>> + Send;
}

// ---------------------------------------------------------------------------
// Scripted mock for engine tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::mock::{MockClient, Script};
    use super::*;

    fn template(key: &str) -> JobTemplate {
        JobTemplate(serde_json::json!({ "op": key }))
    }

    #[tokio::test]
    async fn unscripted_start_succeeds_immediately() {
        let client = MockClient::new();
        let id = client.start(&template("a"), &[]).await.unwrap();
        let status = client.poll(&id).await.unwrap();
        assert_eq!(status.state, RemoteState::Succeeded);
        assert_eq!(client.start_count("a"), 1);
    }

    #[tokio::test]
    async fn scripted_failure_after_running_polls() {
        let client = MockClient::new();
        client.script("a", Script::Fail { polls: 2 });
        let id = client.start(&template("a"), &[]).await.unwrap();
        assert_eq!(client.poll(&id).await.unwrap().state, RemoteState::Running);
        assert_eq!(client.poll(&id).await.unwrap().state, RemoteState::Running);
        assert_eq!(client.poll(&id).await.unwrap().state, RemoteState::Failed);
    }

    #[tokio::test]
    async fn rejected_start_surfaces_client_error() {
        let client = MockClient::new();
        client.script("a", Script::Reject);
        let err = client.start(&template("a"), &[]).await.unwrap_err();
        assert!(matches!(err, sequor_types::error::ClientError::Rejected(_)));
    }

    #[tokio::test]
    async fn cancel_records_and_is_idempotent() {
        let client = MockClient::new();
        let id = client.start(&template("a"), &[]).await.unwrap();
        client.cancel(&id).await.unwrap();
        client.cancel(&id).await.unwrap();
        assert_eq!(client.cancelled_ids().len(), 2);
    }
}
