//! Test utilities and fixtures for farsound tests.
//!
//! Provides the temp database helper, a local-mode share builder, and
//! audio fixture writers (a minimal WAV and a deliberately unreadable
//! "audio" file) so scanner and resolver tests can run against real
//! temp directories.

use std::path::Path;

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::config::{CacheConfig, Config, DatabaseConfig, ShareConfig};
use crate::net::ShareFiles;

/// Creates a temporary database for testing.
///
/// The database lives in a temp directory that is cleaned up when the
/// returned `TempDir` is dropped; keep it alive for the duration of the
/// test. Migrations are run automatically.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");

    let pool = crate::db::init_db(&db_path)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// A share accessor in local-library mode over a temp directory.
pub fn local_share(mount_root: &Path, cache_dir: &Path, cache_enabled: bool) -> ShareFiles {
    let share = ShareConfig {
        server: None,
        mount_point: mount_root.to_path_buf(),
        ..ShareConfig::default()
    };
    let cache = CacheConfig {
        enabled: cache_enabled,
        dir: cache_dir.to_path_buf(),
        max_size_gb: 1.0,
    };
    ShareFiles::new(&share, &cache)
}

/// A full application config in local-library mode.
///
/// `state_dir` receives the database and the cache directory.
pub fn local_test_config(mount_root: &Path, state_dir: &Path) -> Config {
    Config {
        share: ShareConfig {
            server: None,
            mount_point: mount_root.to_path_buf(),
            ..ShareConfig::default()
        },
        cache: CacheConfig {
            enabled: true,
            dir: state_dir.join("cache"),
            max_size_gb: 1.0,
        },
        database: DatabaseConfig {
            path: state_dir.join("library.db"),
        },
        ..Config::default()
    }
}

/// Write a minimal 16-bit mono PCM WAV file (a tenth of a second of
/// silence). Parses cleanly with lofty but carries no tags.
pub fn write_wav(path: &Path) {
    let sample_rate: u32 = 44100;
    let samples: u32 = 4410;
    let data_len: u32 = samples * 2;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    std::fs::write(path, bytes).expect("Failed to write wav fixture");
}

/// Write an ID3v2 tag into a WAV fixture created by [`write_wav`].
pub fn tag_wav(path: &Path, title: &str, artist: &str, album: &str, track: u32) {
    use lofty::config::WriteOptions;
    use lofty::tag::{Accessor, Tag, TagExt, TagType};

    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_title(title.to_string());
    tag.set_artist(artist.to_string());
    tag.set_album(album.to_string());
    tag.set_track(track);
    tag.save_to_path(path, WriteOptions::default())
        .expect("Failed to tag wav fixture");
}

/// Write a file with an audio extension that no tag reader can parse.
/// Exercises the per-file fallback path in the scanner.
pub fn garbage_audio(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    std::fs::write(path, b"not really audio data").expect("Failed to write fixture");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;
        let count = crate::db::album_count(&pool).await.unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_wav_fixture_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.wav");
        write_wav(&path);
        let tags = crate::metadata::read_tags(&path).expect("fixture should parse");
        assert_eq!(tags.title, None);
    }

    #[test]
    fn test_tagged_wav_round_trips_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.wav");
        write_wav(&path);
        tag_wav(&path, "Song1", "Artist", "AlbumA", 1);

        let tags = crate::metadata::read_tags(&path).unwrap();
        assert_eq!(tags.title.as_deref(), Some("Song1"));
        assert_eq!(tags.artist.as_deref(), Some("Artist"));
        assert_eq!(tags.album.as_deref(), Some("AlbumA"));
        assert_eq!(tags.track, Some(1));
    }

    #[test]
    fn test_garbage_audio_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.flac");
        garbage_audio(&path);
        assert!(crate::metadata::read_tags(&path).is_err());
    }
}
