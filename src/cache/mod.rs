//! Bounded local cache maintenance.
//!
//! The cache directory mirrors share-relative paths; entries are written by
//! [`crate::net::ShareFiles::resolve`] and removed here. Sweeps run from the
//! periodic maintenance worker, not on each cache write, so the cache may
//! transiently exceed its limit between sweeps.
//!
//! Eviction is least-recently-accessed first, down to 80% of the limit
//! (20% hysteresis so the very next sweep doesn't immediately re-trigger).
//! A file evicted between a resolver's cache-hit check and its read is an
//! accepted race at the request rates this serves.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

/// Fraction of the limit the cache is trimmed down to.
const HYSTERESIS: f64 = 0.8;

/// Outcome of one eviction sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Files removed by this sweep
    pub removed_files: usize,
    /// Bytes reclaimed by this sweep
    pub bytes_freed: u64,
    /// Cache size after the sweep
    pub total_bytes: u64,
}

/// One cached file with the metadata eviction sorts on.
struct CacheEntry {
    path: PathBuf,
    size: u64,
    accessed: SystemTime,
}

/// Total recursive size of the cache in bytes.
pub fn total_size(cache_root: &Path) -> u64 {
    collect_entries(cache_root).iter().map(|e| e.size).sum()
}

/// Enforce the cache size limit.
///
/// When the total size exceeds `max_size_bytes`, removes files in ascending
/// order of last access time until the total drops to 80% of the limit,
/// never removing more files than needed to cross that line. Filesystem
/// errors are logged; a partially completed sweep is acceptable and not
/// retried within the same pass.
pub fn enforce_limit(cache_root: &Path, max_size_bytes: u64) -> SweepStats {
    let mut entries = collect_entries(cache_root);
    let mut total: u64 = entries.iter().map(|e| e.size).sum();

    let mut stats = SweepStats {
        total_bytes: total,
        ..SweepStats::default()
    };
    if total <= max_size_bytes {
        return stats;
    }

    tracing::info!(
        total_bytes = total,
        max_size_bytes,
        "Cache size exceeds limit, cleaning"
    );

    let target = (max_size_bytes as f64 * HYSTERESIS) as u64;
    entries.sort_by_key(|e| e.accessed);

    for entry in entries {
        if total <= target {
            break;
        }
        match std::fs::remove_file(&entry.path) {
            Ok(()) => {
                total = total.saturating_sub(entry.size);
                stats.removed_files += 1;
                stats.bytes_freed += entry.size;
            }
            // Already gone (resolver race or concurrent sweep): its bytes
            // no longer count against the total.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                total = total.saturating_sub(entry.size);
            }
            Err(e) => {
                tracing::warn!("Error removing cached file {:?}: {}", entry.path, e);
            }
        }
    }

    stats.total_bytes = total;
    tracing::info!(
        removed = stats.removed_files,
        total_bytes = total,
        "Cache cleaned"
    );
    stats
}

fn collect_entries(cache_root: &Path) -> Vec<CacheEntry> {
    WalkDir::new(cache_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            let accessed = meta
                .accessed()
                .or_else(|_| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            Some(CacheEntry {
                path: e.into_path(),
                size: meta.len(),
                accessed,
            })
        })
        .collect()
}
