//! Blob storage collaborator for member portraits and attachments.
//!
//! # Responsibility
//! - Define the `upload(path, bytes) -> url` / `delete(path)` contract.
//! - Provide a filesystem-backed store rooted at one directory.
//!
//! # Invariants
//! - Blob paths are relative, non-empty and never escape the store root.
//! - Deleting a missing blob succeeds.

use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Debug)]
pub enum BlobError {
    /// Path is empty, absolute, or contains parent traversal.
    InvalidPath(String),
    /// Filesystem failure.
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "invalid blob path `{path}`"),
            Self::Io { path, source } => write!(f, "blob io failure at `{path}`: {source}"),
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPath(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Blob storage contract.
pub trait BlobStore {
    /// Stores `bytes` at `path`, replacing existing content; returns a URL.
    fn upload(&self, path: &str, bytes: &[u8]) -> BlobResult<String>;
    /// Removes the blob at `path`.
    fn delete(&self, path: &str) -> BlobResult<()>;
}

/// Filesystem blob store.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> BlobResult<PathBuf> {
        let relative = Path::new(path.trim());
        let valid = !path.trim().is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !valid {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for FsBlobStore {
    fn upload(&self, path: &str, bytes: &[u8]) -> BlobResult<String> {
        let target = self.resolve(path)?;
        let io_err = |source| BlobError::Io {
            path: path.to_string(),
            source,
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&target, bytes).map_err(io_err)?;
        debug!(
            "event=blob_upload module=blob status=ok bytes={}",
            bytes.len()
        );
        Ok(format!("file://{}", target.display()))
    }

    fn delete(&self, path: &str) -> BlobResult<()> {
        let target = self.resolve(path)?;
        match std::fs::remove_file(&target) {
            Ok(()) => {
                debug!("event=blob_delete module=blob status=ok");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BlobError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}
