//! Wire types for the remote operation service's REST API.
//!
//! Only the fields the engine reads are modelled; everything else in the
//! service's responses is ignored.

use serde::Deserialize;
use sequor_types::fact::Fact;

/// Response body from `POST /api/v2/operations`.
#[derive(Debug, Deserialize)]
pub(crate) struct OperationCreated {
    pub id: String,
}

/// Status subset of `GET /api/v2/operations/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct OperationRecord {
    #[serde(default)]
    pub state: String,
}

/// Report subset of `GET /api/v2/operations/{id}/report`; the engine only
/// harvests the facts.
#[derive(Debug, Deserialize)]
pub(crate) struct OperationReport {
    #[serde(default)]
    pub facts: Vec<Fact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_record_tolerates_extra_fields() {
        let json = r#"{"id": "abc", "state": "running", "chain": [], "host_group": []}"#;
        let record: OperationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.state, "running");
    }

    #[test]
    fn operation_report_parses_trait_keyed_facts() {
        let json = r#"{"name": "op", "facts": [{"trait": "host.ip", "value": "10.0.0.5"}]}"#;
        let report: OperationReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.facts, vec![Fact::new("host.ip", "10.0.0.5")]);
    }

    #[test]
    fn operation_report_defaults_to_no_facts() {
        let report: OperationReport = serde_json::from_str("{}").unwrap();
        assert!(report.facts.is_empty());
    }
}
