//! Configuration for kv
//!
//! The backing file path is the only real knob: an explicit override wins,
//! otherwise the database lives in the user's home directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{KvError, Result};

/// Environment variable holding the backing file override
pub const DB_ENV_VAR: &str = "KV_DB";

/// Default backing file name, placed in the home directory
pub const DEFAULT_DB_FILENAME: &str = ".kv.db";

/// Suffix appended to the backing file name to form the lock file
pub const LOCK_SUFFIX: &str = ".lock";

/// Main configuration for a kv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Explicit backing file path. `None` means `$HOME/.kv.db`.
    pub db_path: Option<PathBuf>,

    /// fsync the backing file after every commit
    pub sync_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            sync_writes: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Default config with the override taken from `KV_DB`, if set
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(DB_ENV_VAR))
    }

    fn from_env_value(value: Option<OsString>) -> Self {
        let db_path = value.filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            db_path,
            ..Self::default()
        }
    }

    /// Resolve the backing file path: override first, then the home directory
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let home = dirs::home_dir().ok_or_else(|| {
            KvError::Config("unable to resolve the user's home directory".to_string())
        })?;
        Ok(home.join(DEFAULT_DB_FILENAME))
    }
}

/// Sibling lock file path: the backing path with `.lock` appended
///
/// `/tmp/data.db` → `/tmp/data.db.lock` (the extension is kept, not replaced)
pub fn lock_path_for(db_path: &Path) -> PathBuf {
    let mut name = db_path.as_os_str().to_os_string();
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = Some(path.into());
        self
    }

    /// Enable or disable fsync after each commit
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
