//! Environment-driven core configuration.
//!
//! # Invariants
//! - Resolution never panics; bad values are reported as error strings.
//! - Optional directories must be absolute paths when present.

use crate::blob::FsBlobStore;
use crate::logging::{default_log_level, normalize_level};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "ORGTREE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "ORGTREE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ORGTREE_LOG_DIR";
pub const ENV_BLOB_ROOT: &str = "ORGTREE_BLOB_ROOT";

const DEFAULT_DB_FILE_NAME: &str = "orgtree.sqlite3";

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Root of the portrait store; see [`CoreConfig::blob_store`].
    pub blob_root: Option<PathBuf>,
}

impl CoreConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME));
        let log_level = match read(ENV_LOG_LEVEL) {
            Some(value) => normalize_level(&value)?,
            None => default_log_level(),
        };
        let log_dir = read(ENV_LOG_DIR)
            .map(|value| absolute_dir(ENV_LOG_DIR, &value))
            .transpose()?;
        let blob_root = read(ENV_BLOB_ROOT)
            .map(|value| absolute_dir(ENV_BLOB_ROOT, &value))
            .transpose()?;

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            blob_root,
        })
    }

    /// Filesystem blob store at `blob_root`, or `None` when cleanup is off.
    pub fn blob_store(&self) -> Option<FsBlobStore> {
        self.blob_root.as_deref().map(FsBlobStore::new)
    }
}

fn absolute_dir(key: &str, value: &str) -> Result<PathBuf, String> {
    let path = Path::new(value);
    if !path.is_absolute() {
        return Err(format!("{key} must be an absolute path, got `{value}`"));
    }
    Ok(path.to_path_buf())
}
