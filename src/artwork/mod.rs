//! Album art acquisition (MusicBrainz + Cover Art Archive).

mod musicbrainz;
mod resolver;

pub use musicbrainz::MusicBrainzClient;
pub use resolver::{ArtOutcome, ArtworkResolver};
