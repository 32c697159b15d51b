//! Remote file access over the mounted share, with a local cache.
//!
//! [`ShareFiles`] is the only way the rest of the crate touches the remote
//! tree: directory/file listing for the scanner, and [`ShareFiles::resolve`]
//! for turning a share-relative path into something locally readable.
//!
//! Listing operations are fail-soft: when the share cannot be mounted or an
//! entry cannot be read they return an empty list (logged), and callers
//! treat that as "try nothing further". `resolve` reports `None` only when
//! the file is absent from the remote source entirely (or the share cannot
//! be mounted); a cache-copy failure falls back to the mount-point path.

pub mod mount;

use std::path::{Path, PathBuf};

pub use mount::MountManager;

use crate::config::{CacheConfig, ShareConfig};

/// Lists and resolves files under the mounted share.
#[derive(Debug, Clone)]
pub struct ShareFiles {
    mount: MountManager,
    mount_root: PathBuf,
    cache_root: PathBuf,
    cache_enabled: bool,
}

impl ShareFiles {
    /// Create the accessor, making sure the mount point and cache directory
    /// exist. Directory creation failures are logged, not fatal - the next
    /// operation will fail soft.
    pub fn new(share: &ShareConfig, cache: &CacheConfig) -> Self {
        if let Err(e) = std::fs::create_dir_all(&share.mount_point) {
            tracing::warn!(
                "Could not create mount point {:?}: {}",
                share.mount_point,
                e
            );
        }
        if cache.enabled
            && let Err(e) = std::fs::create_dir_all(&cache.dir)
        {
            tracing::warn!("Could not create cache directory {:?}: {}", cache.dir, e);
        }

        Self {
            mount: MountManager::new(share.clone()),
            mount_root: share.mount_point.clone(),
            cache_root: cache.dir.clone(),
            cache_enabled: cache.enabled,
        }
    }

    /// The mount manager for this share.
    pub fn mount(&self) -> &MountManager {
        &self.mount
    }

    /// List directory entries under `mount_root/path` that are directories.
    ///
    /// Sorted by name so scan order is deterministic. Empty when the share
    /// cannot be mounted or the listing fails.
    pub fn list_directories(&self, path: &str) -> Vec<String> {
        if !self.mount.ensure_mounted() {
            return Vec::new();
        }

        let full_path = self.mount_root.join(path);
        match std::fs::read_dir(&full_path) {
            Ok(entries) => {
                let mut dirs: Vec<String> = entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
                    .filter_map(|e| e.file_name().into_string().ok())
                    .collect();
                dirs.sort();
                dirs
            }
            Err(e) => {
                tracing::error!("Error listing directories at {:?}: {}", full_path, e);
                Vec::new()
            }
        }
    }

    /// List regular files under `mount_root/path`, optionally filtered by a
    /// case-insensitive substring of the file name.
    ///
    /// Sorted by name; the scanner's "first audio file" is defined by this
    /// order. Empty when the share cannot be mounted or the listing fails.
    pub fn list_files(&self, path: &str, filter: Option<&str>) -> Vec<String> {
        if !self.mount.ensure_mounted() {
            return Vec::new();
        }

        let full_path = self.mount_root.join(path);
        match std::fs::read_dir(&full_path) {
            Ok(entries) => {
                let mut files: Vec<String> = entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .filter_map(|e| e.file_name().into_string().ok())
                    .collect();
                if let Some(pattern) = filter {
                    let needle = pattern.to_lowercase();
                    files.retain(|name| name.to_lowercase().contains(&needle));
                }
                files.sort();
                files
            }
            Err(e) => {
                tracing::error!("Error listing files at {:?}: {}", full_path, e);
                Vec::new()
            }
        }
    }

    /// Whether a share-relative path exists on the remote side.
    ///
    /// Plain existence check against the mount point; callers hold a mounted
    /// share (this runs mid-scan).
    pub fn exists(&self, relative: &str) -> bool {
        self.remote_path(relative).exists()
    }

    /// The mount-point path for a share-relative path (direct, uncached read).
    pub fn remote_path(&self, relative: &str) -> PathBuf {
        self.mount_root.join(relative)
    }

    /// The cache path for a share-relative path.
    pub fn cache_path(&self, relative: &str) -> PathBuf {
        self.cache_root.join(relative)
    }

    /// Resolve a share-relative path to a locally readable file.
    ///
    /// Three-tier policy: an existing cache entry is returned immediately
    /// (no mount check, no freshness check against the remote); otherwise
    /// the remote file is copied into the cache and the cache path returned;
    /// if the copy fails the mount-point path is returned directly. With
    /// caching disabled the mount-point path is returned whenever the file
    /// exists.
    ///
    /// `None` means the share could not be mounted or the file is absent
    /// from the remote source.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        if self.cache_enabled {
            let cached = self.cache_path(relative);
            if cached.is_file() {
                return Some(cached);
            }
        }

        if !self.mount.ensure_mounted() {
            return None;
        }

        let remote = self.remote_path(relative);
        if !remote.is_file() {
            return None;
        }

        if !self.cache_enabled {
            return Some(remote);
        }

        let cached = self.cache_path(relative);
        if let Some(parent) = cached.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::error!("Error caching file {}: {}", relative, e);
            return Some(remote);
        }
        match std::fs::copy(&remote, &cached) {
            Ok(_) => Some(cached),
            Err(e) => {
                tracing::error!("Error caching file {}: {}", relative, e);
                // Fall back to the network file
                Some(remote)
            }
        }
    }
}
