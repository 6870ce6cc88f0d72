use std::fs;
use std::path::{Path, PathBuf};

use super::MetadataCache;
use crate::error::Result;

/// File-backed persistence for [`MetadataCache`].
///
/// Holds no state besides the path; every call goes to disk.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted cache.
    ///
    /// A missing, unreadable or unparseable file reads as `None`, as does a
    /// cache with no statuses or activities.
    pub fn load(&self) -> Option<MetadataCache> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "metadata cache unreadable");
                }
                return None;
            }
        };
        match serde_json::from_str::<MetadataCache>(&raw) {
            Ok(cache) if cache.is_complete() => Some(cache),
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "ignoring incomplete metadata cache");
                None
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed metadata cache");
                None
            }
        }
    }

    /// Write the cache, replacing any previous copy.
    ///
    /// The document is written to a sibling temp file and renamed into
    /// place, so a failed write leaves the old cache intact.
    pub fn save(&self, cache: &MetadataCache) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(cache)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::debug!(path = %self.path.display(), "metadata cache written");
        Ok(())
    }

    /// Remove the persisted cache. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
