//! Fact types for Sequor.
//!
//! A fact is one piece of result data harvested from a finished remote
//! operation: a dot-namespaced trait name (e.g. `host.hostname`) and a string
//! value. Facts are append-only within a job; later steps consume filtered
//! snapshots and never mutate what earlier steps produced.

use serde::{Deserialize, Serialize};

/// One trait/value pair from a remote operation's report.
///
/// The wire key for the trait name is `trait` (the remote service's
/// vocabulary); the Rust field is `name` since `trait` is a keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Dot-namespaced trait name, e.g. `host.ip` or `user.password`.
    #[serde(rename = "trait")]
    pub name: String,
    /// Collected value, always carried as a string.
    pub value: String,
}

impl Fact {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_wire_key_is_trait() {
        let fact = Fact::new("host.ip", "10.0.0.5");
        let json = serde_json::to_string(&fact).unwrap();
        assert_eq!(json, r#"{"trait":"host.ip","value":"10.0.0.5"}"#);
        let parsed: Fact = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, fact);
    }

    #[test]
    fn test_fact_display() {
        let fact = Fact::new("user.name", "svc-backup");
        assert_eq!(fact.to_string(), "user.name=svc-backup");
    }
}
