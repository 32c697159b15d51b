//! Library facade exposed to external collaborators.
//!
//! [`Library`] ties the share accessor and the database together and is
//! the surface consumed by the command dispatcher (scan/search/lookup)
//! and the playback collaborator ([`Library::file_path`]). Errors are
//! contained here and converted to `bool`/`Option`/empty results; callers
//! get a plain negative answer, not an error chain.

use std::path::PathBuf;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::model::AlbumWithTracks;
use crate::net::ShareFiles;
use crate::scanner;

/// The music library: index database plus remote share access.
pub struct Library {
    pool: SqlitePool,
    share: ShareFiles,
    library: crate::config::LibraryConfig,
}

impl Library {
    /// Open the library: initialize the database (idempotent) and set up
    /// share access. Does not mount the share yet.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::init_db(&config.database.path).await?;
        let share = ShareFiles::new(&config.share, &config.cache);
        Ok(Self {
            pool,
            share,
            library: config.library.clone(),
        })
    }

    /// Share accessor (and through it, the mount manager).
    pub fn share(&self) -> &ShareFiles {
        &self.share
    }

    /// Database pool for read-only statistics queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Scan the share into the index.
    ///
    /// Returns false on top-level failure (share unmountable, database
    /// unreachable); per-album failures are contained inside the scan.
    pub async fn scan(&self) -> bool {
        match scanner::scan(&self.share, &self.pool, &self.library).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Error scanning library: {}", e);
                false
            }
        }
    }

    /// Search albums by title or artist substring. Empty on error.
    pub async fn search_albums(&self, query: &str) -> Vec<AlbumWithTracks> {
        match db::search_albums(&self.pool, query).await {
            Ok(albums) => albums,
            Err(e) => {
                tracing::error!("Error searching albums: {}", e);
                Vec::new()
            }
        }
    }

    /// Get one album with its tracks by id.
    pub async fn album_by_id(&self, album_id: i64) -> Option<AlbumWithTracks> {
        match db::get_album(&self.pool, album_id).await {
            Ok(album) => album,
            Err(e) => {
                tracing::error!("Error getting album {}: {}", album_id, e);
                None
            }
        }
    }

    /// Resolve a stored track path to a playable local path.
    ///
    /// This is the operation the playback collaborator consumes.
    pub fn file_path(&self, relative: &str) -> Option<PathBuf> {
        self.share.resolve(relative)
    }

    /// Whether the index holds no albums yet (first-run scan trigger).
    pub async fn is_empty(&self) -> bool {
        db::album_count(&self.pool).await.map(|c| c == 0).unwrap_or(true)
    }
}
