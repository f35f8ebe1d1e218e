//! Application state wiring the engine together.
//!
//! AppState holds the job registry and resolved configuration used by both
//! CLI commands and REST API handlers. The registry is generic over the
//! remote operation client, but AppState pins it to the concrete HTTP
//! implementation from `sequor-infra`.

use std::path::PathBuf;
use std::sync::Arc;

use sequor_core::registry::JobRegistry;
use sequor_infra::config::{default_sequences_dir, load_global_config, resolve_data_dir};
use sequor_infra::remote::HttpOperationClient;
use sequor_types::config::GlobalConfig;

/// Concrete registry type with the generic pinned to the infra client.
pub type EngineRegistry = JobRegistry<HttpOperationClient>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EngineRegistry>,
    pub config: GlobalConfig,
    /// Directory scanned for sequence YAML files.
    pub sequences_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: resolve the data directory, load
    /// configuration, wire the registry to the remote service client.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let sequences_dir = config
            .sequences_dir
            .clone()
            .unwrap_or_else(|| default_sequences_dir(&data_dir));

        let client = Arc::new(HttpOperationClient::new(&config.remote));
        let registry = Arc::new(JobRegistry::new(client, config.engine.clone()));

        Ok(Self {
            registry,
            config,
            sequences_dir,
        })
    }
}
