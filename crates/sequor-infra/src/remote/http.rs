//! HttpOperationClient -- concrete [`OperationClient`] over the emulation
//! service's REST API.
//!
//! The service's vocabulary: an operation is created with a POST whose body
//! is the step's opaque job template (plus the inherited facts), its state
//! is read with a GET, its collected facts come from the operation report,
//! and it is stopped by PATCHing its state to `finished`.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use sequor_core::client::{OperationClient, OperationStatus, RemoteJobId, RemoteState};
use sequor_types::config::RemoteConfig;
use sequor_types::error::ClientError;
use sequor_types::fact::Fact;
use sequor_types::sequence::JobTemplate;

use super::wire::{OperationCreated, OperationRecord, OperationReport};

/// Timeout for one HTTP round trip. Operation runtimes are bounded by the
/// engine's own per-attempt timeout, not here.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// REST client for the remote operation service.
pub struct HttpOperationClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpOperationClient {
    pub fn new(config: &RemoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().map(SecretString::from),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(key) = &self.api_key {
            builder = builder.header("KEY", key.expose_secret());
        }
        builder
    }

    /// Send a request, mapping connectivity failures to `Transport` and any
    /// non-success status to `Rejected`.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected(format!("HTTP {status}: {body}")));
        }
        Ok(response)
    }

    /// The request body for operation creation: the opaque template with the
    /// inherited facts injected alongside it.
    fn start_body(template: &JobTemplate, input_facts: &[Fact]) -> serde_json::Value {
        let mut body = template.0.clone();
        if !input_facts.is_empty() {
            if let Some(map) = body.as_object_mut() {
                let facts = input_facts
                    .iter()
                    .map(|f| serde_json::json!({ "trait": f.name, "value": f.value }))
                    .collect();
                map.insert("facts".to_string(), serde_json::Value::Array(facts));
            }
        }
        body
    }

    /// Output facts come from the operation report. A report that cannot be
    /// fetched or parsed degrades to no facts rather than failing the step.
    async fn fetch_report_facts(&self, remote_id: &RemoteJobId) -> Vec<Fact> {
        let path = format!("/api/v2/operations/{remote_id}/report");
        let report = match self.send(self.request(Method::GET, &path)).await {
            Ok(response) => response
                .json::<OperationReport>()
                .await
                .map_err(|e| ClientError::Rejected(format!("malformed report: {e}"))),
            Err(err) => Err(err),
        };
        match report {
            Ok(report) => report.facts,
            Err(err) => {
                tracing::warn!(
                    remote_id = %remote_id,
                    error = %err,
                    "failed to fetch operation report"
                );
                Vec::new()
            }
        }
    }
}

/// Map the service's operation states onto the engine's three. `finished`
/// and `cleanup` count as success; `out_of_time` and `run_one_link`
/// (operator intervention required) count as failure; anything else is
/// still running.
fn remote_state(state: &str) -> RemoteState {
    match state {
        "finished" | "cleanup" => RemoteState::Succeeded,
        "out_of_time" | "run_one_link" => RemoteState::Failed,
        _ => RemoteState::Running,
    }
}

impl OperationClient for HttpOperationClient {
    async fn start(
        &self,
        template: &JobTemplate,
        input_facts: &[Fact],
    ) -> Result<RemoteJobId, ClientError> {
        let body = Self::start_body(template, input_facts);
        let response = self
            .send(self.request(Method::POST, "/api/v2/operations").json(&body))
            .await?;
        let created: OperationCreated = response
            .json()
            .await
            .map_err(|e| ClientError::Rejected(format!("malformed create response: {e}")))?;
        tracing::debug!(remote_id = created.id.as_str(), "operation created");
        Ok(RemoteJobId::new(created.id))
    }

    async fn poll(&self, remote_id: &RemoteJobId) -> Result<OperationStatus, ClientError> {
        let path = format!("/api/v2/operations/{remote_id}");
        let response = self.send(self.request(Method::GET, &path)).await?;
        let record: OperationRecord = response
            .json()
            .await
            .map_err(|e| ClientError::Rejected(format!("malformed status response: {e}")))?;

        let state = remote_state(&record.state);
        let facts = if state == RemoteState::Succeeded {
            self.fetch_report_facts(remote_id).await
        } else {
            Vec::new()
        };
        Ok(OperationStatus { state, facts })
    }

    async fn cancel(&self, remote_id: &RemoteJobId) -> Result<(), ClientError> {
        let path = format!("/api/v2/operations/{remote_id}");
        let response = self
            .request(Method::PATCH, &path)
            .json(&serde_json::json!({ "state": "finished" }))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        // A vanished remote operation is fine; cancel is idempotent.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected(format!("HTTP {status}: {body}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_client(base_url: &str) -> HttpOperationClient {
        HttpOperationClient::new(&RemoteConfig {
            base_url: base_url.to_string(),
            api_key: None,
        })
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = make_client("http://localhost:8888/");
        assert_eq!(
            client.url("/api/v2/operations"),
            "http://localhost:8888/api/v2/operations"
        );
    }

    #[test]
    fn with_base_url_overrides() {
        let client = make_client("http://localhost:8888")
            .with_base_url("https://emulation.internal:8443/".to_string());
        assert_eq!(client.url("/x"), "https://emulation.internal:8443/x");
    }

    #[test]
    fn start_body_injects_facts_into_template() {
        let template = JobTemplate(serde_json::json!({
            "name": "discovery",
            "adversary": { "adversary_id": "abc" },
            "group": "red"
        }));
        let facts = vec![Fact::new("host.ip", "10.0.0.5")];

        let body = HttpOperationClient::start_body(&template, &facts);

        assert_eq!(body["adversary"]["adversary_id"], "abc");
        assert_eq!(body["facts"][0]["trait"], "host.ip");
        assert_eq!(body["facts"][0]["value"], "10.0.0.5");
    }

    #[test]
    fn start_body_without_facts_is_the_bare_template() {
        let template = JobTemplate(serde_json::json!({ "adversary_id": "abc" }));
        let body = HttpOperationClient::start_body(&template, &[]);
        assert_eq!(body, template.0);
        assert!(body.get("facts").is_none());
    }

    #[test]
    fn remote_state_mapping() {
        assert_eq!(remote_state("finished"), RemoteState::Succeeded);
        assert_eq!(remote_state("cleanup"), RemoteState::Succeeded);
        assert_eq!(remote_state("out_of_time"), RemoteState::Failed);
        assert_eq!(remote_state("run_one_link"), RemoteState::Failed);
        assert_eq!(remote_state("running"), RemoteState::Running);
        assert_eq!(remote_state("paused"), RemoteState::Running);
        assert_eq!(remote_state(""), RemoteState::Running);
    }
}
