//! Per-file ingestion pipeline.
//!
//! One discovered file runs to completion before the next:
//! tags → canonical path → duplicate gate → encode or move → album art.
//! Every failure is per-file; the surrounding watch loop never stops
//! because one download was unreadable.

use crate::artwork::ArtworkResolver;
use crate::config::AppConfig;
use crate::dedup::DuplicateDetector;
use crate::ingestion::archive::{extract_archive, ArchiveError};
use crate::ingestion::converter::{ConversionError, Encoder};
use crate::library::{canonical_track_path, LibraryPathError, PATH_FIELDS};
use crate::metadata::{is_alac, MetadataError, TrackInspector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that can occur while ingesting one file.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Path construction error: {0}")]
    LibraryPath(#[from] LibraryPathError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What happened to a single audio file.
#[derive(Debug, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file (possibly after conversion) now lives at `destination`.
    Placed { destination: PathBuf },
    /// The library already holds this recording; nothing was written.
    SkippedDuplicate { existing: PathBuf },
}

/// Orchestrates the processing of discovered files.
pub struct IngestionPipeline {
    config: Arc<AppConfig>,
    inspector: Arc<dyn TrackInspector>,
    detector: DuplicateDetector,
    encoder: Arc<dyn Encoder>,
    artwork: Option<ArtworkResolver>,
}

impl IngestionPipeline {
    pub fn new(
        config: Arc<AppConfig>,
        inspector: Arc<dyn TrackInspector>,
        encoder: Arc<dyn Encoder>,
        artwork: Option<ArtworkResolver>,
    ) -> Self {
        let detector = DuplicateDetector::new(Arc::clone(&inspector));
        Self {
            config,
            inspector,
            detector,
            encoder,
            artwork,
        }
    }

    /// Entry point for the watcher: dispatch on file kind and log
    /// failures instead of returning them.
    pub async fn process_discovered(&self, path: &Path) {
        if AppConfig::is_archive(path) {
            if let Err(e) = self.process_archive(path).await {
                error!(archive = %path.display(), error = %e, "Failed to process archive");
            }
        } else if self.config.is_supported_audio(path) {
            match self.process_file(path).await {
                Ok(outcome) => debug!(file = %path.display(), ?outcome, "Processed"),
                Err(e) => error!(file = %path.display(), error = %e, "Failed to process file"),
            }
        }
    }

    /// Expand an archive and process every extracted audio file. A file
    /// that fails does not stop its siblings.
    pub async fn process_archive(&self, path: &Path) -> Result<Vec<FileOutcome>, IngestionError> {
        info!(archive = %path.display(), "Processing archive");

        let archive = path.to_path_buf();
        let config = Arc::clone(&self.config);
        let extracted = tokio::task::spawn_blocking(move || extract_archive(&archive, &config))
            .await
            .map_err(|e| {
                IngestionError::Io(std::io::Error::other(format!(
                    "archive extraction task failed: {}",
                    e
                )))
            })??;

        let mut outcomes = Vec::new();
        for file in &extracted {
            match self.process_file(file).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(file = %file.display(), error = %e, "Failed to process extracted file")
                }
            }
        }
        Ok(outcomes)
    }

    /// Process a single audio file to completion.
    pub async fn process_file(&self, path: &Path) -> Result<FileOutcome, IngestionError> {
        info!(file = %path.display(), "Processing audio file");

        let tags = self.inspector.tags(path, &PATH_FIELDS).await?;
        let canonical = canonical_track_path(
            &self.config.library_folder,
            &tags,
            &self.config.target_extension,
        )?;
        debug!(canonical = %canonical.display(), "Canonical library path");

        if self.config.skip_duplicates && canonical.exists() {
            let duplicate = self
                .detector
                .is_duplicate(path, &canonical, &self.config.duplicate_criteria)
                .await?;
            if duplicate {
                info!(
                    file = %path.display(),
                    existing = %canonical.display(),
                    "Skipping duplicate"
                );
                return Ok(FileOutcome::SkippedDuplicate {
                    existing: canonical,
                });
            }
        }

        let destination = if is_alac(path)? {
            // Already in the target codec; move as-is.
            self.place(path, &canonical).await?
        } else {
            let converted = self.encoder.encode(path).await?;
            let destination = self.place(&converted, &canonical).await?;
            // The source only goes away once its replacement is in place.
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!(file = %path.display(), error = %e, "Could not remove converted source");
            }
            destination
        };

        info!(
            file = %path.display(),
            destination = %destination.display(),
            "Placed audio file"
        );

        if let Some(artwork) = &self.artwork {
            // Art is only resolvable when the file sits in its album
            // directory; the flat inbox has none.
            if self.config.dest_folder.is_none() {
                if let Some(album_dir) = destination.parent() {
                    match artwork.ensure_cover(&destination, album_dir, &tags).await {
                        Ok(outcome) => debug!(?outcome, "Album art resolved"),
                        Err(e) => {
                            warn!(file = %destination.display(), error = %e, "Album art step failed")
                        }
                    }
                }
            }
        }

        Ok(FileOutcome::Placed { destination })
    }

    /// Move a file to the inbox (flat) or to its canonical path.
    async fn place(&self, file: &Path, canonical: &Path) -> Result<PathBuf, IngestionError> {
        let destination = match &self.config.dest_folder {
            Some(inbox) => {
                let name = file.file_name().ok_or_else(|| {
                    IngestionError::Io(std::io::Error::other(format!(
                        "file has no name: {}",
                        file.display()
                    )))
                })?;
                inbox.join(name)
            }
            None => {
                if let Some(parent) = canonical.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                canonical.to_path_buf()
            }
        };

        move_file(file, &destination).await?;
        Ok(destination)
    }
}

/// Rename, falling back to copy-and-delete for cross-device moves
/// (download and library folders commonly sit on different mounts).
async fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(_) => {
            tokio::fs::copy(source, destination).await?;
            tokio::fs::remove_file(source).await
        }
    }
}
