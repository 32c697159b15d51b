//! Library scanner: walks the share's album tree into the database.
//!
//! The share layout is a two-level heuristic. A top-level directory that
//! directly contains audio files is one album; one that doesn't is treated
//! as a container whose immediate subdirectories are candidate albums.
//! Nothing deeper is descended.
//!
//! A failure processing one album directory is logged and the scan moves
//! on; only top-level failures (share unmountable, database unreachable)
//! fail the scan as a whole.

use std::path::Path;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::config::LibraryConfig;
use crate::db;
use crate::error::{Error, Result};
use crate::metadata::{self, derive_album_fields, derive_track_fields};
use crate::net::ShareFiles;

/// Counts reported by a completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub albums: usize,
    pub tracks: usize,
}

/// Scan the whole share and upsert every discovered album and track.
///
/// Albums that disappeared from the share are left in the index untouched.
pub async fn scan(
    share: &ShareFiles,
    pool: &SqlitePool,
    library: &LibraryConfig,
) -> Result<ScanSummary> {
    tracing::info!("Starting music library scan");

    if !share.mount().ensure_mounted() {
        return Err(Error::mount("network share not mounted"));
    }

    let mut summary = ScanSummary::default();
    for dir_name in share.list_directories("") {
        // Skip hidden directories
        if dir_name.starts_with('.') {
            continue;
        }

        if audio_files(share, &dir_name, library).is_empty() {
            // A container of album directories: process each subdirectory
            // as a candidate album (one level only)
            for subdir in share.list_directories(&dir_name) {
                let album_dir = join_rel(&dir_name, &subdir);
                process_or_log(share, pool, library, &album_dir, &mut summary).await;
            }
        } else {
            // This directory is an album
            process_or_log(share, pool, library, &dir_name, &mut summary).await;
        }
    }

    tracing::info!(
        albums = summary.albums,
        tracks = summary.tracks,
        "Library scan complete"
    );
    Ok(summary)
}

/// Process one candidate album directory, containing its failure.
async fn process_or_log(
    share: &ShareFiles,
    pool: &SqlitePool,
    library: &LibraryConfig,
    album_dir: &str,
    summary: &mut ScanSummary,
) {
    match process_album_directory(share, pool, library, album_dir).await {
        Ok(Some(tracks)) => {
            summary.albums += 1;
            summary.tracks += tracks;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Error processing album directory {}: {}", album_dir, e);
        }
    }
}

/// Process an album directory and upsert it with its tracks.
///
/// Returns `Ok(None)` when the directory holds no audio files (not an
/// album). Tag-read failures are per-file and non-fatal: each field falls
/// back independently (see [`crate::metadata`]).
async fn process_album_directory(
    share: &ShareFiles,
    pool: &SqlitePool,
    library: &LibraryConfig,
    album_dir: &str,
) -> Result<Option<usize>> {
    let files = audio_files(share, album_dir, library);
    if files.is_empty() {
        if !share.list_directories(album_dir).is_empty() {
            // Albums nested deeper than two levels are not discovered
            tracing::debug!(directory = album_dir, "No audio files; not descending further");
        }
        return Ok(None);
    }

    let cover_art = library
        .cover_art_names
        .iter()
        .map(|name| join_rel(album_dir, name))
        .find(|rel| share.exists(rel));

    // Album metadata comes from the first audio file in listing order
    let first_rel = join_rel(album_dir, &files[0]);
    let album_tags = match metadata::read_tags(&share.remote_path(&first_rel)) {
        Ok(tags) => Some(tags),
        Err(e) => {
            tracing::warn!("Error reading tags from {}: {}", first_rel, e);
            None
        }
    };
    let album = derive_album_fields(album_tags.as_ref(), album_dir);

    let album_id = db::upsert_album(
        pool,
        &album.title,
        &album.artist,
        &album.year,
        album_dir,
        cover_art.as_deref(),
        Utc::now().timestamp(),
    )
    .await?;

    let mut tracks = 0;
    for file_name in &files {
        let rel = join_rel(album_dir, file_name);
        let tags = match metadata::read_tags(&share.remote_path(&rel)) {
            Ok(tags) => Some(tags),
            Err(e) => {
                tracing::warn!("Error reading tags from {}: {}", rel, e);
                None
            }
        };
        let fields = derive_track_fields(tags.as_ref(), file_name, &album.artist);
        db::upsert_track(pool, album_id, &fields, &rel).await?;
        tracks += 1;
    }

    Ok(Some(tracks))
}

/// Audio files directly inside a directory, by the extension allow-list.
fn audio_files(share: &ShareFiles, dir: &str, library: &LibraryConfig) -> Vec<String> {
    share
        .list_files(dir, None)
        .into_iter()
        .filter(|name| has_supported_extension(name, &library.extensions))
        .collect()
}

/// Extension match only; no content sniffing.
fn has_supported_extension(name: &str, extensions: &[String]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let ext = e.to_lowercase();
            extensions.iter().any(|candidate| *candidate == ext)
        })
        .unwrap_or(false)
}

/// Join share-relative path segments with a forward slash.
fn join_rel(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{UNKNOWN_ARTIST, UNKNOWN_YEAR};
    use crate::test_utils::{garbage_audio, local_share, tag_wav, temp_db, write_wav};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture_share(root: &TempDir, cache: &TempDir) -> ShareFiles {
        local_share(root.path(), cache.path(), false)
    }

    fn fixture_config() -> LibraryConfig {
        LibraryConfig::default()
    }

    #[test]
    fn test_extension_allow_list() {
        let exts = fixture_config().extensions;
        assert!(has_supported_extension("01 - Song.flac", &exts));
        assert!(has_supported_extension("01 - SONG.FLAC", &exts));
        assert!(has_supported_extension("x.wv", &exts));
        assert!(!has_supported_extension("x.mp3", &exts));
        assert!(!has_supported_extension("cover.jpg", &exts));
        assert!(!has_supported_extension("noext", &exts));
    }

    #[test]
    fn test_join_rel() {
        assert_eq!(join_rel("", "Artist"), "Artist");
        assert_eq!(join_rel("Artist", "Album"), "Artist/Album");
    }

    #[tokio::test]
    async fn test_scan_tagged_album_in_container_directory() {
        let root = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let album = root.path().join("Artist/AlbumA");
        std::fs::create_dir_all(&album).unwrap();

        write_wav(&album.join("01.wav"));
        tag_wav(&album.join("01.wav"), "Song1", "Artist", "AlbumA", 1);
        write_wav(&album.join("02.wav"));
        tag_wav(&album.join("02.wav"), "Song2", "Artist", "AlbumA", 2);
        std::fs::write(album.join("cover.jpg"), b"jpg").unwrap();

        let share = fixture_share(&root, &cache);
        let (pool, _db_dir) = temp_db().await;
        let summary = scan(&share, &pool, &fixture_config()).await.unwrap();
        assert_eq!(summary, ScanSummary { albums: 1, tracks: 2 });

        let results = db::search_albums(&pool, "AlbumA").await.unwrap();
        assert_eq!(results.len(), 1);
        let found = &results[0];
        assert_eq!(found.album.title, "AlbumA");
        assert_eq!(found.album.artist, "Artist");
        assert_eq!(found.album.directory, "Artist/AlbumA");
        assert_eq!(
            found.album.cover_art.as_deref(),
            Some("Artist/AlbumA/cover.jpg")
        );

        let order: Vec<_> = found
            .tracks
            .iter()
            .map(|t| (t.track_number, t.title.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "Song1"), (2, "Song2")]);
        assert_eq!(found.tracks[0].file_path, "Artist/AlbumA/01.wav");
    }

    #[tokio::test]
    async fn test_container_directory_yields_one_album_per_subdirectory() {
        let root = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        garbage_audio(&root.path().join("Artist/AlbumA/01.flac"));
        garbage_audio(&root.path().join("Artist/AlbumB/01.flac"));

        let share = fixture_share(&root, &cache);
        let (pool, _db_dir) = temp_db().await;
        let summary = scan(&share, &pool, &fixture_config()).await.unwrap();
        assert_eq!(summary.albums, 2);
        assert_eq!(summary.tracks, 2);
    }

    #[tokio::test]
    async fn test_top_level_directory_with_audio_is_one_album() {
        let root = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        garbage_audio(&root.path().join("Mixtape/a.flac"));
        garbage_audio(&root.path().join("Mixtape/b.flac"));

        let share = fixture_share(&root, &cache);
        let (pool, _db_dir) = temp_db().await;
        let summary = scan(&share, &pool, &fixture_config()).await.unwrap();
        assert_eq!(summary, ScanSummary { albums: 1, tracks: 2 });

        let results = db::search_albums(&pool, "Mixtape").await.unwrap();
        assert_eq!(results[0].album.directory, "Mixtape");
    }

    #[tokio::test]
    async fn test_unreadable_tags_fall_back_per_field() {
        let root = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        garbage_audio(&root.path().join("Artist/Bootleg/07 - Hidden Track.flac"));

        let share = fixture_share(&root, &cache);
        let (pool, _db_dir) = temp_db().await;
        let summary = scan(&share, &pool, &fixture_config()).await.unwrap();
        assert_eq!(summary.albums, 1);

        let results = db::search_albums(&pool, "Bootleg").await.unwrap();
        let album = &results[0];
        assert_eq!(album.album.title, "Bootleg");
        assert_eq!(album.album.artist, UNKNOWN_ARTIST);
        assert_eq!(album.album.year, UNKNOWN_YEAR);
        assert_eq!(album.album.cover_art, None);

        let track = &album.tracks[0];
        assert_eq!(track.title, "07 - Hidden Track");
        assert_eq!(track.artist, UNKNOWN_ARTIST);
        assert_eq!(track.track_number, 0);
        assert_eq!(track.disc_number, 1);
        assert_eq!(track.duration, 0.0);
    }

    #[tokio::test]
    async fn test_scan_is_idempotent() {
        let root = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        garbage_audio(&root.path().join("Artist/AlbumA/01.flac"));
        garbage_audio(&root.path().join("Artist/AlbumA/02.flac"));
        garbage_audio(&root.path().join("Solo/01.flac"));

        let share = fixture_share(&root, &cache);
        let (pool, _db_dir) = temp_db().await;
        let first = scan(&share, &pool, &fixture_config()).await.unwrap();
        let second = scan(&share, &pool, &fixture_config()).await.unwrap();
        assert_eq!(first, second);

        assert_eq!(db::album_count(&pool).await.unwrap(), 2);
        let albums = db::search_albums(&pool, "").await.unwrap();
        let tracks: usize = albums.iter().map(|a| a.tracks.len()).sum();
        assert_eq!(tracks, 3);
    }

    #[tokio::test]
    async fn test_hidden_directories_are_skipped() {
        let root = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        garbage_audio(&root.path().join(".Trash/01.flac"));
        garbage_audio(&root.path().join("Visible/01.flac"));

        let share = fixture_share(&root, &cache);
        let (pool, _db_dir) = temp_db().await;
        let summary = scan(&share, &pool, &fixture_config()).await.unwrap();
        assert_eq!(summary.albums, 1);
    }

    #[tokio::test]
    async fn test_albums_nested_three_levels_deep_are_not_found() {
        let root = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        garbage_audio(&root.path().join("Genre/Artist/Album/01.flac"));

        let share = fixture_share(&root, &cache);
        let (pool, _db_dir) = temp_db().await;
        let summary = scan(&share, &pool, &fixture_config()).await.unwrap();
        assert_eq!(summary, ScanSummary::default());
    }

    #[tokio::test]
    async fn test_scan_fails_when_share_unavailable() {
        let root = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let missing: PathBuf = root.path().join("not-there");
        let share = local_share(&missing, cache.path(), false);
        std::fs::remove_dir(&missing).unwrap();

        let (pool, _db_dir) = temp_db().await;
        let result = scan(&share, &pool, &fixture_config()).await;
        assert!(result.is_err());
    }
}
