//! Sequence definition types for Sequor.
//!
//! A `SequenceDefinition` is the declarative description of a campaign
//! sequence: an ordered list of steps, each wrapping an opaque job template
//! for the remote emulation service plus the fact-inheritance and
//! failure-recovery settings the engine acts on. Definitions are immutable
//! once loaded; validation lives in `sequor-core`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sequence Definition
// ---------------------------------------------------------------------------

/// A named, ordered list of steps chaining remote operations.
///
/// YAML sequence files deserialize into this struct. All fields default so
/// that a structurally incomplete document still parses and validation can
/// report every violation at once instead of stopping at the first missing
/// field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDefinition {
    /// Human-readable sequence name.
    #[serde(default)]
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: String,
    /// Ordered list of steps. Executed strictly in order, never in parallel.
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

// ---------------------------------------------------------------------------
// Step Definition
// ---------------------------------------------------------------------------

/// A single step in a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// User-defined step name. Unique within a sequence.
    #[serde(default)]
    pub name: String,
    /// Opaque payload handed to the remote service when starting the
    /// operation (adversary profile reference, execution group, planner id,
    /// whatever the service's schema requires). The engine never interprets
    /// it.
    #[serde(default)]
    pub job_template: JobTemplate,
    /// Whether accumulated facts from earlier steps feed into this one.
    #[serde(default)]
    pub inherit_facts: bool,
    /// Glob patterns (e.g. `"host.*"`) selecting which inherited facts this
    /// step receives. Empty means all facts pass through.
    #[serde(default)]
    pub fact_filters: Vec<String>,
    /// What to do when the step's final attempt fails.
    #[serde(default)]
    pub on_failure: RecoveryAction,
    /// Alternate template used once when `on_failure` is `Fallback`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_job_template: Option<JobTemplate>,
    /// A critical step's final failure aborts the whole sequence regardless
    /// of `on_failure`.
    #[serde(default)]
    pub critical: bool,
}

/// Failure-recovery action for a step, both as configured and as decided by
/// the policy evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Re-run the same template after an exponential backoff.
    #[default]
    Retry,
    /// Run the fallback template exactly once.
    Fallback,
    /// Record the step as skipped and continue the sequence.
    Skip,
    /// Stop the whole sequence.
    Abort,
}

// ---------------------------------------------------------------------------
// Job Template
// ---------------------------------------------------------------------------

/// Opaque job payload owned by the remote service's schema.
///
/// The engine passes it through verbatim; the only inspection it ever
/// performs is the emptiness check during validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobTemplate(pub serde_json::Value);

impl JobTemplate {
    /// True when the template carries no payload at all (null, empty string,
    /// or empty mapping).
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.trim().is_empty(),
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_definition_deserialize_defaults() {
        let yaml_ish = serde_json::json!({ "name": "recon" });
        let step: StepDefinition = serde_json::from_value(yaml_ish).unwrap();
        assert_eq!(step.name, "recon");
        assert!(step.job_template.is_empty());
        assert!(!step.inherit_facts);
        assert!(step.fact_filters.is_empty());
        assert_eq!(step.on_failure, RecoveryAction::Retry);
        assert!(step.fallback_job_template.is_none());
        assert!(!step.critical);
    }

    #[test]
    fn test_recovery_action_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&RecoveryAction::Fallback).unwrap(),
            "\"fallback\""
        );
        let parsed: RecoveryAction = serde_json::from_str("\"abort\"").unwrap();
        assert_eq!(parsed, RecoveryAction::Abort);
    }

    #[test]
    fn test_job_template_is_empty() {
        assert!(JobTemplate(serde_json::Value::Null).is_empty());
        assert!(JobTemplate(serde_json::json!("")).is_empty());
        assert!(JobTemplate(serde_json::json!("   ")).is_empty());
        assert!(JobTemplate(serde_json::json!({})).is_empty());
        assert!(!JobTemplate(serde_json::json!("profile-7")).is_empty());
        assert!(!JobTemplate(serde_json::json!({"adversary_id": "x"})).is_empty());
    }

    #[test]
    fn test_sequence_definition_serde_roundtrip() {
        let def = SequenceDefinition {
            name: "discovery-chain".to_string(),
            description: "Host discovery then credential harvest".to_string(),
            steps: vec![
                StepDefinition {
                    name: "recon".to_string(),
                    job_template: JobTemplate(serde_json::json!({"adversary_id": "a-1"})),
                    inherit_facts: false,
                    fact_filters: vec![],
                    on_failure: RecoveryAction::Abort,
                    fallback_job_template: None,
                    critical: true,
                },
                StepDefinition {
                    name: "harvest".to_string(),
                    job_template: JobTemplate(serde_json::json!({"adversary_id": "a-2"})),
                    inherit_facts: true,
                    fact_filters: vec!["host.*".to_string()],
                    on_failure: RecoveryAction::Fallback,
                    fallback_job_template: Some(JobTemplate(
                        serde_json::json!({"adversary_id": "a-2-alt"}),
                    )),
                    critical: false,
                },
            ],
        };
        let json = serde_json::to_string(&def).unwrap();
        let parsed: SequenceDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, def);
    }

    #[test]
    fn test_fallback_template_omitted_when_absent() {
        let step = StepDefinition {
            name: "s".to_string(),
            job_template: JobTemplate(serde_json::json!({"a": 1})),
            inherit_facts: false,
            fact_filters: vec![],
            on_failure: RecoveryAction::Retry,
            fallback_job_template: None,
            critical: false,
        };
        let json = serde_json::to_string(&step).unwrap();
        assert!(!json.contains("fallback_job_template"));
    }
}
