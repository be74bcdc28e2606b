//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tl_auth::{RetryPolicy, RetryingTransport, StaticCredentialService};
use tl_core::state::STATE_DIR;
use tl_core::{Config, StateStore};
use tl_db::DuckDbConnector;
use tl_engine::MigrationResource;

use crate::cli::GlobalArgs;

/// Loaded configuration and state for one CLI invocation
pub struct RuntimeContext {
    /// Directory relative paths in the config resolve against
    pub root: PathBuf,

    pub config: Config,

    pub state: StateStore,
}

impl RuntimeContext {
    /// Load config and state from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let project_path = Path::new(&args.project_dir);

        let (config, root) = if let Some(config_path) = &args.config {
            let path = Path::new(config_path);
            let config = Config::load(path).context("Failed to load configuration file")?;
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(project_path)
                .to_path_buf();
            (config, root)
        } else {
            let config =
                Config::load_from_dir(project_path).context("Failed to load project configuration")?;
            (config, project_path.to_path_buf())
        };

        let state_path = StateStore::default_path(&root);
        let state = StateStore::open(&state_path)
            .with_context(|| format!("Failed to open state file {}", state_path.display()))?;
        log::debug!("Using state file {}", state_path.display());

        Ok(Self {
            root,
            config,
            state,
        })
    }

    /// Directory local databases live in
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR).join("data")
    }

    /// Build the migration resource lifecycle: credentials from the provider
    /// settings, databases under [`data_dir`](Self::data_dir).
    pub fn migration_resource(&self) -> Result<MigrationResource> {
        let provider = &self.config.provider;
        let service = StaticCredentialService::from_config(provider)
            .context("Failed to load credentials")?;
        let transport = RetryingTransport::new(service, RetryPolicy::from_provider(provider));
        let connector = DuckDbConnector::new(self.data_dir());
        Ok(MigrationResource::new(Arc::new(connector), Arc::new(transport)))
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
