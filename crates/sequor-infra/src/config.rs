//! Global configuration loader for Sequor.
//!
//! Reads `config.toml` from the data directory (`~/.sequor/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when
//! the file is missing or malformed; a bad config file never stops the
//! engine from starting. Deployment-sensitive settings can be overridden
//! through environment variables.

use std::path::{Path, PathBuf};

use sequor_types::config::GlobalConfig;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `SEQUOR_DATA_DIR` environment variable
/// 2. `~/.sequor` under the platform home directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SEQUOR_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".sequor");
    }

    // Last resort: current directory
    PathBuf::from(".sequor")
}

/// Default sequences directory under the data dir.
pub fn default_sequences_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("sequences")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the
///   default.
/// - Environment overrides are applied last: `SEQUOR_REMOTE_URL` replaces
///   the remote base URL and `SEQUOR_API_KEY` replaces the API key.
/// - `sequences_dir` falls back to `{data_dir}/sequences` when unset.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => match toml::from_str::<GlobalConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Failed to parse {}: {err}, using defaults",
                    config_path.display()
                );
                GlobalConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    };

    if let Ok(url) = std::env::var("SEQUOR_REMOTE_URL") {
        config.remote.base_url = url;
    }
    if let Ok(key) = std::env::var("SEQUOR_API_KEY") {
        config.remote.api_key = Some(key);
    }
    if config.sequences_dir.is_none() {
        config.sequences_dir = Some(default_sequences_dir(data_dir));
    }

    config
}
