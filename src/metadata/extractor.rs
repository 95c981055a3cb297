//! Tag and audio property extraction.
//!
//! The primary reader is lofty. Bitrate falls back to the external probe
//! collaborator when the container does not carry it; a probe failure
//! degrades the value to absent rather than failing the file.

use crate::dedup::hash::pcm_sha256;
use crate::ingestion::converter::PropertyProbe;
use crate::metadata::fields::{AudioProperty, PropertySet, PropertyValue, TagField, TagSet};
use async_trait::async_trait;
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::mp4::{Mp4Codec, Mp4File};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Metadata extraction errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The file could not be parsed or decoded as audio at all.
    #[error("unreadable audio file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetadataError {
    fn unreadable(path: &Path, reason: impl ToString) -> Self {
        Self::Unreadable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Read-only view of a track used by the pipeline and the duplicate
/// detector. The production implementation reads the file on every call;
/// nothing is cached between invocations.
#[async_trait]
pub trait TrackInspector: Send + Sync {
    /// Extract the requested tag fields. Disc and track number are always
    /// extracted on top of the request because path construction depends
    /// on them. Absent fields are simply missing from the result.
    async fn tags(&self, path: &Path, fields: &[TagField]) -> Result<TagSet, MetadataError>;

    /// Extract the requested audio properties. Properties the file cannot
    /// supply are missing from the result, never zeroed.
    async fn properties(
        &self,
        path: &Path,
        props: &[AudioProperty],
    ) -> Result<PropertySet, MetadataError>;

    /// Digest of the decoded raw sample bytes (hex SHA-256).
    async fn content_hash(&self, path: &Path) -> Result<String, MetadataError>;
}

/// Fields extracted regardless of the request.
const ALWAYS_EXTRACTED: [TagField; 2] = [TagField::DiscNumber, TagField::TrackNumber];

/// lofty-backed [`TrackInspector`].
pub struct LoftyInspector {
    probe: Arc<dyn PropertyProbe>,
}

impl LoftyInspector {
    pub fn new(probe: Arc<dyn PropertyProbe>) -> Self {
        Self { probe }
    }

    fn read_tagged(path: &Path) -> Result<lofty::file::TaggedFile, MetadataError> {
        Probe::open(path)
            .map_err(|e| MetadataError::unreadable(path, e))?
            .read()
            .map_err(|e| MetadataError::unreadable(path, e))
    }
}

#[async_trait]
impl TrackInspector for LoftyInspector {
    async fn tags(&self, path: &Path, fields: &[TagField]) -> Result<TagSet, MetadataError> {
        let tagged = Self::read_tagged(path)?;
        let tag = tagged.primary_tag().or_else(|| tagged.first_tag());

        let mut result = TagSet::new();
        let Some(tag) = tag else {
            return Ok(result);
        };

        for field in fields.iter().chain(ALWAYS_EXTRACTED.iter()) {
            // get_string yields the first value of a multi-valued item.
            if let Some(value) = tag.get_string(&item_key(*field)) {
                result.insert(*field, value.to_string());
            }
        }

        Ok(result)
    }

    async fn properties(
        &self,
        path: &Path,
        props: &[AudioProperty],
    ) -> Result<PropertySet, MetadataError> {
        let tagged = Self::read_tagged(path)?;
        let file_props = tagged.properties();

        let mut result = PropertySet::new();
        for prop in props {
            let value = match prop {
                AudioProperty::Duration => Some(PropertyValue::Integer(
                    file_props.duration().as_millis() as u64,
                )),
                AudioProperty::SampleRate => file_props
                    .sample_rate()
                    .map(|sr| PropertyValue::Integer(u64::from(sr))),
                AudioProperty::Channels => file_props
                    .channels()
                    .map(|ch| PropertyValue::Integer(u64::from(ch))),
                AudioProperty::Codec => {
                    Some(PropertyValue::Text(format_name(tagged.file_type()).to_string()))
                }
                AudioProperty::Bitrate => match file_props.audio_bitrate() {
                    Some(kbps) => Some(PropertyValue::Integer(u64::from(kbps))),
                    None => match self.probe.bitrate_kbps(path).await {
                        Ok(kbps) => kbps.map(|k| PropertyValue::Integer(u64::from(k))),
                        Err(e) => {
                            warn!(
                                file = %path.display(),
                                error = %e,
                                "Bitrate probe failed, treating bitrate as absent"
                            );
                            None
                        }
                    },
                },
            };

            if let Some(value) = value {
                result.insert(*prop, value);
            }
        }

        Ok(result)
    }

    async fn content_hash(&self, path: &Path) -> Result<String, MetadataError> {
        let owned = path.to_path_buf();
        // Full decode of the file; keep it off the async threads.
        tokio::task::spawn_blocking(move || pcm_sha256(&owned))
            .await
            .map_err(|e| MetadataError::unreadable(path, format!("hash task failed: {}", e)))?
    }
}

fn item_key(field: TagField) -> ItemKey {
    match field {
        TagField::Artist => ItemKey::TrackArtist,
        TagField::Album => ItemKey::AlbumTitle,
        TagField::Title => ItemKey::TrackTitle,
        TagField::AlbumArtist => ItemKey::AlbumArtist,
        TagField::Genre => ItemKey::Genre,
        TagField::Year => ItemKey::Year,
        TagField::DiscNumber => ItemKey::DiscNumber,
        TagField::TrackNumber => ItemKey::TrackNumber,
    }
}

/// Container/file type name, reported as the `codec` property.
fn format_name(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Aac => "AAC",
        FileType::Aiff => "AIFF",
        FileType::Ape => "APE",
        FileType::Flac => "FLAC",
        FileType::Mpeg => "MP3",
        FileType::Mp4 => "MP4",
        FileType::Opus => "Opus",
        FileType::Vorbis => "OGG Vorbis",
        FileType::Speex => "Speex",
        FileType::Wav => "WAV",
        FileType::WavPack => "WavPack",
        _ => "unknown",
    }
}

/// Whether the file is an MPEG-4 container carrying ALAC audio.
///
/// Files already in the target codec are moved into place without
/// re-encoding.
pub fn is_alac(path: &Path) -> Result<bool, MetadataError> {
    let is_mp4_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("m4a") || e.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false);
    if !is_mp4_ext {
        return Ok(false);
    }

    let mut file = std::fs::File::open(path)?;
    let mp4 = Mp4File::read_from(&mut file, ParseOptions::new())
        .map_err(|e| MetadataError::unreadable(path, e))?;

    Ok(matches!(mp4.properties().codec(), Mp4Codec::ALAC))
}
