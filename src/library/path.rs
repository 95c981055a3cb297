//! Canonical library path construction.
//!
//! Every track has exactly one destination under the library root,
//! derived from its own tags:
//!
//! ```text
//! <library_root>/<artist>/<album>/<disc>-<track> <title>.<ext>
//! ```
//!
//! The construction is a pure function of its inputs, which is what lets
//! the duplicate gate locate "the" existing library file by path alone
//! instead of searching.

use crate::metadata::{TagField, TagSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from canonical path construction.
#[derive(Debug, Error)]
pub enum LibraryPathError {
    /// A field required for the path is absent or blank in the tags.
    #[error("missing required tag field for path construction: {0}")]
    MissingField(TagField),
}

/// Tag fields the path constructor reads. Extraction requests for path
/// construction must cover at least these.
pub const PATH_FIELDS: [TagField; 5] = [
    TagField::Artist,
    TagField::Album,
    TagField::Title,
    TagField::DiscNumber,
    TagField::TrackNumber,
];

/// Build the canonical destination path for a track.
///
/// `extension` is the target file extension, with or without a leading
/// dot. Artist, album and title must be non-blank; disc and track are
/// optional and shape the filename:
///
/// * disc and track present: `"<disc>-<track> <title>"`
/// * track only: `"<track> <title>"`
/// * neither: `"<title>"`
///
/// A purely numeric track number is zero-padded to two digits. All
/// interpolated values are trimmed and have path separators and colons
/// replaced with `_`, so tag data can never escape the album directory.
pub fn canonical_track_path(
    library_root: &Path,
    tags: &TagSet,
    extension: &str,
) -> Result<PathBuf, LibraryPathError> {
    let artist = required_segment(tags, TagField::Artist)?;
    let album = required_segment(tags, TagField::Album)?;
    let title = required_segment(tags, TagField::Title)?;

    let disc = tags.get(TagField::DiscNumber).map(sanitize_segment);
    let track = tags
        .get(TagField::TrackNumber)
        .map(pad_track_number)
        .map(|t| sanitize_segment(&t));

    let ext = extension.trim_start_matches('.');
    let filename = match (disc.as_deref(), track.as_deref()) {
        (Some(d), Some(t)) if !d.is_empty() && !t.is_empty() => {
            format!("{}-{} {}.{}", d, t, title, ext)
        }
        (_, Some(t)) if !t.is_empty() => format!("{} {}.{}", t, title, ext),
        _ => format!("{}.{}", title, ext),
    };

    Ok(library_root.join(artist).join(album).join(filename))
}

fn required_segment(tags: &TagSet, field: TagField) -> Result<String, LibraryPathError> {
    let raw = tags
        .get(field)
        .ok_or(LibraryPathError::MissingField(field))?;
    let sanitized = sanitize_segment(raw);
    if sanitized.is_empty() {
        return Err(LibraryPathError::MissingField(field));
    }
    Ok(sanitized)
}

/// Trim and neutralize characters that would nest or escape directories.
fn sanitize_segment(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            _ => c,
        })
        .collect()
}

/// Zero-pad purely numeric track numbers to two digits; anything else
/// passes through unchanged.
fn pad_track_number(t: &str) -> String {
    match t.trim().parse::<u64>() {
        Ok(n) => format!("{:02}", n),
        Err(_) => t.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(entries: &[(TagField, &str)]) -> TagSet {
        let mut set = TagSet::new();
        for (field, value) in entries {
            set.insert(*field, value.to_string());
        }
        set
    }

    #[test]
    fn full_disc_and_track_filename() {
        let set = tags(&[
            (TagField::Artist, "Artist"),
            (TagField::Album, "Album"),
            (TagField::Title, "Song"),
            (TagField::DiscNumber, "1"),
            (TagField::TrackNumber, "7"),
        ]);
        let path = canonical_track_path(Path::new("/lib"), &set, ".m4a").unwrap();
        assert_eq!(path, Path::new("/lib/Artist/Album/1-07 Song.m4a"));
    }

    #[test]
    fn track_only_filename() {
        let set = tags(&[
            (TagField::Artist, "Artist"),
            (TagField::Album, "Album"),
            (TagField::Title, "Song"),
            (TagField::TrackNumber, "7"),
        ]);
        let path = canonical_track_path(Path::new("/lib"), &set, "m4a").unwrap();
        assert_eq!(path, Path::new("/lib/Artist/Album/07 Song.m4a"));
    }

    #[test]
    fn title_only_filename() {
        let set = tags(&[
            (TagField::Artist, "Artist"),
            (TagField::Album, "Album"),
            (TagField::Title, "Song"),
        ]);
        let path = canonical_track_path(Path::new("/lib"), &set, ".m4a").unwrap();
        assert_eq!(path, Path::new("/lib/Artist/Album/Song.m4a"));
    }

    #[test]
    fn disc_without_track_falls_back_to_title_only() {
        let set = tags(&[
            (TagField::Artist, "Artist"),
            (TagField::Album, "Album"),
            (TagField::Title, "Song"),
            (TagField::DiscNumber, "2"),
        ]);
        let path = canonical_track_path(Path::new("/lib"), &set, ".m4a").unwrap();
        assert_eq!(path, Path::new("/lib/Artist/Album/Song.m4a"));
    }

    #[test]
    fn track_padding() {
        assert_eq!(pad_track_number("3"), "03");
        assert_eq!(pad_track_number("12"), "12");
        assert_eq!(pad_track_number("123"), "123");
        assert_eq!(pad_track_number("B2"), "B2");
    }

    #[test]
    fn segments_are_sanitized() {
        let set = tags(&[
            (TagField::Artist, "AC/DC"),
            (TagField::Album, "Back in Black"),
            (TagField::Title, "Hells Bells: Live"),
        ]);
        let path = canonical_track_path(Path::new("/lib"), &set, ".m4a").unwrap();
        assert_eq!(
            path,
            Path::new("/lib/AC_DC/Back in Black/Hells Bells_ Live.m4a")
        );
    }

    #[test]
    fn missing_album_is_an_error() {
        let set = tags(&[
            (TagField::Artist, "Artist"),
            (TagField::Title, "Song"),
            (TagField::TrackNumber, "1"),
        ]);
        let err = canonical_track_path(Path::new("/lib"), &set, ".m4a").unwrap_err();
        assert!(matches!(
            err,
            LibraryPathError::MissingField(TagField::Album)
        ));
    }

    #[test]
    fn whitespace_only_title_is_an_error() {
        let set = tags(&[
            (TagField::Artist, "Artist"),
            (TagField::Album, "Album"),
            (TagField::Title, "   "),
        ]);
        let err = canonical_track_path(Path::new("/lib"), &set, ".m4a").unwrap_err();
        assert!(matches!(
            err,
            LibraryPathError::MissingField(TagField::Title)
        ));
    }

    #[test]
    fn construction_is_deterministic() {
        let set = tags(&[
            (TagField::Artist, "  Artist "),
            (TagField::Album, "Album"),
            (TagField::Title, "Song"),
            (TagField::DiscNumber, "1"),
            (TagField::TrackNumber, "03"),
        ]);
        let first = canonical_track_path(Path::new("/lib"), &set, ".m4a").unwrap();
        let second = canonical_track_path(Path::new("/lib"), &set, ".m4a").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Path::new("/lib/Artist/Album/1-03 Song.m4a"));
    }
}
