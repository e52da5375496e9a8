//! Application state

use citemark_core::{CitationStore, StoreConfig};
use sen::CliError;
use std::path::PathBuf;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Store configuration resolved from the environment
    pub config: StoreConfig,
}

impl AppState {
    /// Create a new AppState
    pub fn new() -> anyhow::Result<Self> {
        let config = StoreConfig::from_env()?;
        Ok(Self { config })
    }

    /// Open the store of an existing session
    ///
    /// `cache_dir` overrides the configured cache root. Sessions without a
    /// citation file are reported instead of being created.
    pub fn open_store(
        &self,
        research_id: &str,
        cache_dir: Option<&PathBuf>,
    ) -> Result<CitationStore, CliError> {
        let mut config = self.config.clone();
        if let Some(dir) = cache_dir {
            config = config.cache_root(dir.clone());
        }

        let path = config.citations_file(research_id);
        if !path.exists() {
            return Err(CliError::user(format!(
                "No citation store for session {} (looked in {})",
                research_id,
                path.display()
            )));
        }

        CitationStore::open(research_id, &config)
            .map_err(|e| CliError::system(format!("Failed to open citation store: {}", e)))
    }
}
