//! Store configuration

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the cache root
pub const CACHE_DIR_ENV: &str = "CITEMARK_CACHE_DIR";

/// Default cache root, relative to the working directory
pub const DEFAULT_CACHE_ROOT: &str = "./cache";

/// File name of the per-session citation document
pub const CITATIONS_FILE: &str = "citations.json";

/// Configuration for opening a [`CitationStore`](crate::CitationStore)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one sub-directory per research session
    pub cache_root: PathBuf,
    /// Drop the cached reference-number map whenever a citation is added
    pub auto_invalidate_refs: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from(DEFAULT_CACHE_ROOT),
            auto_invalidate_refs: true,
        }
    }
}

impl StoreConfig {
    /// Create a new StoreConfig with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the environment (`CITEMARK_CACHE_DIR`)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(root) = std::env::var(CACHE_DIR_ENV) {
            if !root.trim().is_empty() {
                config.cache_root = expand_path(root.trim())?;
            }
        }
        Ok(config)
    }

    /// Set the cache root
    pub fn cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    /// Enable or disable reference-map invalidation on add
    pub fn auto_invalidate_refs(mut self, enabled: bool) -> Self {
        self.auto_invalidate_refs = enabled;
        self
    }

    /// Directory for one research session
    pub fn session_dir(&self, research_id: &str) -> PathBuf {
        self.cache_root.join(research_id)
    }

    /// Citation document path for one research session
    pub fn citations_file(&self, research_id: &str) -> PathBuf {
        self.session_dir(research_id).join(CITATIONS_FILE)
    }
}

/// Expand a leading `~/` using `HOME`
pub fn expand_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::Other(format!("Invalid path: {}", path.display())))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = std::env::var("HOME")
            .map_err(|_| Error::Other("HOME environment variable not set".to_string()))?;
        Ok(PathBuf::from(home).join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
