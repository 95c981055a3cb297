//! Album art resolution for freshly placed tracks.
//!
//! Art is only fetched when the track has no embedded picture and the
//! album directory has no recognizable art file yet. Fetched art lands
//! as `cover.jpg` next to the track.

use crate::artwork::musicbrainz::MusicBrainzClient;
use crate::metadata::{TagField, TagSet};
use anyhow::Result;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File names recognized as existing album art.
const LOCAL_ART_NAMES: &[&str] = &[
    "cover.jpg",
    "folder.jpg",
    "artwork.jpg",
    "cover.png",
    "folder.png",
    "artwork.png",
];

const FETCHED_ART_NAME: &str = "cover.jpg";

/// How the cover for an album directory was satisfied.
#[derive(Debug, PartialEq, Eq)]
pub enum ArtOutcome {
    /// The track carries embedded art; nothing to do.
    Embedded,
    /// The album directory already has an art file.
    Local(PathBuf),
    /// Art was fetched and written to the album directory.
    Downloaded(PathBuf),
    /// No art could be found anywhere.
    NotFound,
}

pub struct ArtworkResolver {
    client: MusicBrainzClient,
}

impl ArtworkResolver {
    pub fn new(client: MusicBrainzClient) -> Self {
        Self { client }
    }

    /// Make sure the album directory of a placed track has cover art.
    ///
    /// `tags` are the track's already-extracted tags; artist and album
    /// drive the release-group search. Failures here are reported but
    /// callers treat them as non-fatal: a track without art is still a
    /// track.
    pub async fn ensure_cover(
        &self,
        track: &Path,
        album_dir: &Path,
        tags: &TagSet,
    ) -> Result<ArtOutcome> {
        if has_embedded_art(track) {
            debug!(track = %track.display(), "Embedded album art present");
            return Ok(ArtOutcome::Embedded);
        }

        if let Some(existing) = find_local_art(album_dir) {
            debug!(art = %existing.display(), "Album directory already has art");
            return Ok(ArtOutcome::Local(existing));
        }

        let (Some(artist), Some(album)) = (tags.get(TagField::Artist), tags.get(TagField::Album))
        else {
            debug!(track = %track.display(), "No artist/album tags, cannot search for art");
            return Ok(ArtOutcome::NotFound);
        };

        let Some(release_group) = self.client.find_release_group(artist, album).await? else {
            debug!(artist = %artist, album = %album, "No release group found");
            return Ok(ArtOutcome::NotFound);
        };

        let Some(bytes) = self.client.fetch_front_cover(&release_group).await? else {
            debug!(release_group = %release_group, "Release group has no front cover");
            return Ok(ArtOutcome::NotFound);
        };

        let dest = album_dir.join(FETCHED_ART_NAME);
        tokio::fs::write(&dest, &bytes).await?;
        info!(artist = %artist, album = %album, art = %dest.display(), "Downloaded album art");
        Ok(ArtOutcome::Downloaded(dest))
    }
}

/// Whether the file carries an embedded picture in any of its tags.
/// Unreadable files count as art-less rather than failing the art step.
fn has_embedded_art(track: &Path) -> bool {
    let Ok(probe) = Probe::open(track) else {
        return false;
    };
    let Ok(tagged) = probe.read() else {
        return false;
    };
    tagged.tags().iter().any(|tag| !tag.pictures().is_empty())
}

/// First recognizable art file in the album directory, if any.
fn find_local_art(album_dir: &Path) -> Option<PathBuf> {
    LOCAL_ART_NAMES
        .iter()
        .map(|name| album_dir.join(name))
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_art_is_found_by_known_names() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(find_local_art(tmp.path()), None);

        std::fs::write(tmp.path().join("folder.jpg"), b"jpeg bytes").unwrap();
        assert_eq!(
            find_local_art(tmp.path()),
            Some(tmp.path().join("folder.jpg"))
        );
    }

    #[test]
    fn unreadable_track_has_no_embedded_art() {
        let tmp = tempfile::tempdir().unwrap();
        let track = tmp.path().join("noise.mp3");
        std::fs::write(&track, b"not really audio").unwrap();

        assert!(!has_embedded_art(&track));
        assert!(!has_embedded_art(Path::new("/nonexistent/file.mp3")));
    }
}
