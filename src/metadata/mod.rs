//! Audio file tag reading and fallback derivation.
//!
//! Uses the lofty crate for format-independent tag access. Tag reading is
//! separated from fallback policy: [`read_tags`] touches the filesystem and
//! returns raw [`TrackTags`], while [`derive_album_fields`] and
//! [`derive_track_fields`] are pure functions that apply the per-field
//! defaults (each field falls back independently, and empty tag strings
//! count as missing).

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey};
use std::path::Path;

use crate::error::{Error, Result};

/// Artist used when neither album-artist nor artist tags are present.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Year used when no year tag is present.
pub const UNKNOWN_YEAR: &str = "Unknown Year";

/// Raw tag values of one audio file, before any fallback is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub year: Option<u32>,
    pub track: Option<u32>,
    pub disc: Option<u32>,
    /// Duration in seconds from the audio properties
    pub duration: f64,
}

/// Album-level fields after fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumFields {
    pub title: String,
    pub artist: String,
    pub year: String,
}

/// Track-level fields after fallback, ready for the database.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFields {
    pub title: String,
    pub artist: String,
    pub track_number: i64,
    pub disc_number: i64,
    pub duration: f64,
}

/// Read tags and audio properties from a file.
///
/// Returns an error when the file cannot be parsed at all; a parseable
/// file with no tags yields a [`TrackTags`] full of `None`s, which the
/// derive functions turn into defaults.
pub fn read_tags(path: &Path) -> Result<TrackTags> {
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::metadata(path, e.to_string()))?
        .read()
        .map_err(|e| Error::metadata(path, e.to_string()))?;

    // Prefer the primary tag for the format, fall back to the first tag
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    let album_artist = tag
        .and_then(|t| t.get(&ItemKey::AlbumArtist))
        .and_then(|item| item.value().text())
        .map(|s| s.to_string());

    let duration = tagged_file.properties().duration().as_secs_f64();

    Ok(TrackTags {
        title: tag.and_then(|t| t.title().map(|s| s.to_string())),
        artist: tag.and_then(|t| t.artist().map(|s| s.to_string())),
        album: tag.and_then(|t| t.album().map(|s| s.to_string())),
        album_artist,
        year: tag.and_then(|t| t.year()),
        track: tag.and_then(|t| t.track()),
        disc: tag.and_then(|t| t.disk()),
        duration,
    })
}

/// Treat empty/whitespace tag strings the same as absent ones.
fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.as_str()).filter(|s| !s.trim().is_empty())
}

/// Derive album fields from the tags of the album's first audio file.
///
/// `directory` is the album directory relative to the share root; its base
/// name is the title fallback. Pass `None` when the tag read failed.
pub fn derive_album_fields(tags: Option<&TrackTags>, directory: &str) -> AlbumFields {
    let dir_name = Path::new(directory)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(directory);

    let title = tags
        .and_then(|t| non_empty(t.album.as_ref()))
        .unwrap_or(dir_name)
        .to_string();

    let artist = tags
        .and_then(|t| {
            non_empty(t.album_artist.as_ref()).or_else(|| non_empty(t.artist.as_ref()))
        })
        .unwrap_or(UNKNOWN_ARTIST)
        .to_string();

    let year = tags
        .and_then(|t| t.year)
        .map(|y| y.to_string())
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string());

    AlbumFields {
        title,
        artist,
        year,
    }
}

/// Derive track fields with per-field fallback.
///
/// Each field falls back independently: title to the file name without
/// extension, artist to the album artist, track number to 0, disc number
/// to 1, duration to 0. Pass `None` when the tag read failed and every
/// field takes its fallback.
pub fn derive_track_fields(
    tags: Option<&TrackTags>,
    file_name: &str,
    album_artist: &str,
) -> TrackFields {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    let title = tags
        .and_then(|t| non_empty(t.title.as_ref()))
        .unwrap_or(stem)
        .to_string();

    let artist = tags
        .and_then(|t| non_empty(t.artist.as_ref()))
        .unwrap_or(album_artist)
        .to_string();

    let track_number = tags.and_then(|t| t.track).map(i64::from).unwrap_or(0);

    // A disc tag of 0 counts as absent
    let disc_number = tags
        .and_then(|t| t.disc)
        .filter(|d| *d >= 1)
        .map(i64::from)
        .unwrap_or(1);

    let duration = tags.map(|t| t.duration).unwrap_or(0.0);

    TrackFields {
        title,
        artist,
        track_number,
        disc_number,
        duration,
    }
}
