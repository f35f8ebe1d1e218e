//! Global configuration types for Sequor.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! engine timing/retry defaults and the remote service connection. All
//! fields have sensible defaults so an absent or empty file still yields a
//! working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the sequencing engine.
///
/// Loaded from `<data-dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    /// Directory holding sequence YAML files. Defaults to
    /// `<data-dir>/sequences` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequences_dir: Option<PathBuf>,
}

/// Retry and timing knobs for step execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Retry budget per step (attempts beyond the first).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-attempt timeout: how long one attempt's polling loop may run
    /// before the attempt counts as failed.
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// Interval between status polls of a running remote operation.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Optional bound on a whole sequence run; unset means unbounded (a
    /// sequence with many retries can run arbitrarily long).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_timeout_secs: Option<u64>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_step_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            step_timeout_secs: default_step_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            sequence_timeout_secs: None,
        }
    }
}

/// Connection settings for the remote adversary-emulation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote service's REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent on every request. Also settable via `SEQUOR_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8888".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.step_timeout_secs, 300);
        assert_eq!(config.poll_interval_secs, 5);
        assert!(config.sequence_timeout_secs.is_none());
    }

    #[test]
    fn test_global_config_deserialize_empty() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.engine.max_retries, 3);
        assert_eq!(config.remote.base_url, "http://localhost:8888");
        assert!(config.remote.api_key.is_none());
        assert!(config.sequences_dir.is_none());
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
sequences_dir = "/srv/sequor/sequences"

[engine]
max_retries = 5
step_timeout_secs = 120
sequence_timeout_secs = 7200

[remote]
base_url = "https://caldera.internal:8443"
api_key = "ADMIN123"
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.max_retries, 5);
        assert_eq!(config.engine.step_timeout_secs, 120);
        assert_eq!(config.engine.poll_interval_secs, 5);
        assert_eq!(config.engine.sequence_timeout_secs, Some(7200));
        assert_eq!(config.remote.base_url, "https://caldera.internal:8443");
        assert_eq!(config.remote.api_key.as_deref(), Some("ADMIN123"));
        assert_eq!(
            config.sequences_dir,
            Some(PathBuf::from("/srv/sequor/sequences"))
        );
    }

    #[test]
    fn test_global_config_serde_roundtrip() {
        let config = GlobalConfig {
            engine: EngineConfig {
                max_retries: 2,
                step_timeout_secs: 60,
                poll_interval_secs: 1,
                sequence_timeout_secs: Some(600),
            },
            remote: RemoteConfig {
                base_url: "http://127.0.0.1:8888".to_string(),
                api_key: Some("KEY".to_string()),
            },
            sequences_dir: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: GlobalConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.engine.max_retries, 2);
        assert_eq!(parsed.engine.sequence_timeout_secs, Some(600));
        assert_eq!(parsed.remote.api_key.as_deref(), Some("KEY"));
    }
}
