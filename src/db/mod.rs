//! Database module for album and track persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Album and track upserts (keyed on directory / file path)
//! - Substring search over album title and artist
//! - Album lookup with ordered track listings
//!
//! Schema initialization runs the embedded migrations and is safe to call
//! on every startup.

use std::path::Path;

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::ResultExt;
use crate::metadata::TrackFields;
use crate::model::{Album, AlbumWithTracks, Track};

/// Search results are capped at this many albums.
pub const SEARCH_LIMIT: i64 = 10;

/// Build a SQLite database URL from a filesystem path.
pub fn db_url(path: &Path) -> String {
    format!("sqlite:{}", path.display())
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file (and its parent directory) if it doesn't
/// exist, establishes a connection pool with up to 5 connections, and runs
/// all pending migrations. Connections are checked out per logical
/// operation, so there is no long-lived shared connection to contend on.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(path: &Path) -> crate::error::Result<SqlitePool> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context("creating database directory")?;
    }

    let url = db_url(path);
    if !sqlx::Sqlite::database_exists(&url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(&url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Insert or update an album record.
///
/// Uses SQLite's UPSERT keyed on the album's share-relative directory.
/// The album id is stable across re-scans, so track foreign keys keep
/// pointing at the same row.
///
/// # Returns
///
/// The database ID of the inserted or updated album.
pub async fn upsert_album(
    pool: &SqlitePool,
    title: &str,
    artist: &str,
    year: &str,
    directory: &str,
    cover_art: Option<&str>,
    last_scanned: i64,
) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO albums (title, artist, year, directory, cover_art, last_scanned)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(directory) DO UPDATE SET
            title = excluded.title,
            artist = excluded.artist,
            year = excluded.year,
            cover_art = excluded.cover_art,
            last_scanned = excluded.last_scanned
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(artist)
    .bind(year)
    .bind(directory)
    .bind(cover_art)
    .bind(last_scanned)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Insert or update a track record, keyed on its share-relative file path.
pub async fn upsert_track(
    pool: &SqlitePool,
    album_id: i64,
    fields: &TrackFields,
    file_path: &str,
) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tracks (album_id, title, artist, track_number, disc_number, duration, file_path)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(file_path) DO UPDATE SET
            album_id = excluded.album_id,
            title = excluded.title,
            artist = excluded.artist,
            track_number = excluded.track_number,
            disc_number = excluded.disc_number,
            duration = excluded.duration
        RETURNING id
        "#,
    )
    .bind(album_id)
    .bind(&fields.title)
    .bind(&fields.artist)
    .bind(fields.track_number)
    .bind(fields.disc_number)
    .bind(fields.duration)
    .bind(file_path)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Search albums by a case-insensitive substring of title or artist.
///
/// Returns at most [`SEARCH_LIMIT`] albums ordered by title, each with its
/// tracks ordered by (disc number, track number, title).
pub async fn search_albums(pool: &SqlitePool, query: &str) -> sqlx::Result<Vec<AlbumWithTracks>> {
    let pattern = format!("%{}%", query);
    let albums: Vec<Album> = sqlx::query_as(
        r#"
        SELECT id, title, artist, year, directory, cover_art, last_scanned
        FROM albums
        WHERE title LIKE ? OR artist LIKE ?
        ORDER BY title
        LIMIT ?
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;

    let mut results = Vec::with_capacity(albums.len());
    for album in albums {
        let tracks = tracks_for_album(pool, album.id).await?;
        results.push(AlbumWithTracks { album, tracks });
    }
    Ok(results)
}

/// Get an album by its database ID, with ordered tracks.
pub async fn get_album(pool: &SqlitePool, album_id: i64) -> sqlx::Result<Option<AlbumWithTracks>> {
    let album: Option<Album> = sqlx::query_as(
        "SELECT id, title, artist, year, directory, cover_art, last_scanned FROM albums WHERE id = ?",
    )
    .bind(album_id)
    .fetch_optional(pool)
    .await?;

    match album {
        Some(album) => {
            let tracks = tracks_for_album(pool, album.id).await?;
            Ok(Some(AlbumWithTracks { album, tracks }))
        }
        None => Ok(None),
    }
}

/// Tracks of one album in playback order.
async fn tracks_for_album(pool: &SqlitePool, album_id: i64) -> sqlx::Result<Vec<Track>> {
    sqlx::query_as::<_, Track>(
        r#"
        SELECT id, album_id, title, artist, track_number, disc_number, duration, file_path
        FROM tracks
        WHERE album_id = ?
        ORDER BY disc_number, track_number, title
        "#,
    )
    .bind(album_id)
    .fetch_all(pool)
    .await
}

/// Number of albums in the index.
///
/// Used by the daemon to decide whether a first-run scan is needed.
pub async fn album_count(pool: &SqlitePool) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM albums")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
