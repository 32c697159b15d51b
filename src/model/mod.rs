//! Core data models for the music library.
//!
//! Defines the primary entities: [`Album`] and [`Track`], plus the
//! [`AlbumWithTracks`] shape returned by search and lookup. These are
//! derived from SQLx for database mapping and Serde for the JSON output
//! of the command surface.
//!
//! # Database Schema
//!
//! The models map to the following tables:
//! - `albums` - One row per album directory on the share (unique `directory`)
//! - `tracks` - Individual audio files with metadata (unique `file_path`)

use serde::Serialize;
use sqlx::FromRow;

/// An album in the music library.
///
/// Keyed by its directory relative to the share root; re-scanning the
/// same directory overwrites the row in place. Albums whose directories
/// disappear from the share are never deleted automatically.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Album {
    /// Database ID (auto-generated)
    pub id: i64,
    /// Album title (from tags, or the directory name)
    pub title: String,
    /// Album artist ("Unknown Artist" when tags have none)
    pub artist: String,
    /// Release year as free text ("Unknown Year" when tags have none)
    pub year: String,
    /// Directory relative to the share root (unique key)
    pub directory: String,
    /// Cover image path relative to the share root, if one was found
    pub cover_art: Option<String>,
    /// Unix timestamp of the scan that last touched this row
    pub last_scanned: i64,
}

/// A track (audio file) in the music library.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Track {
    /// Database ID (auto-generated)
    pub id: i64,
    /// Owning album (required foreign key)
    pub album_id: i64,
    /// Track title (from tags, or the file name without extension)
    pub title: String,
    /// Track artist (falls back to the album artist)
    pub artist: String,
    /// Track number, 0 when unknown
    pub track_number: i64,
    /// Disc number, 1 when unknown
    pub disc_number: i64,
    /// Duration in seconds, 0 when unknown
    pub duration: f64,
    /// File path relative to the share root (unique key)
    pub file_path: String,
}

/// An album together with its tracks ordered by (disc, track, title).
#[derive(Debug, Clone, Serialize)]
pub struct AlbumWithTracks {
    #[serde(flatten)]
    pub album: Album,
    pub tracks: Vec<Track>,
}
