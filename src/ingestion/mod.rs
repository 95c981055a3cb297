//! The ingestion driver: watch, extract, convert, place.
//!
//! Download-folder workflow:
//! 1. The watcher spots a fresh file (or the initial scan does)
//! 2. Zip archives are expanded next to themselves, audio entries only
//! 3. Each audio file gets a canonical library path from its tags
//! 4. The duplicate gate compares against any file already there
//! 5. Non-ALAC audio is converted via ffmpeg, then moved into place

pub mod archive;
pub mod converter;
pub mod pipeline;
pub mod watcher;

pub use archive::{extract_archive, ArchiveError};
pub use converter::{
    check_tools_available, ConversionError, Encoder, FfmpegEncoder, FfprobeProbe, PropertyProbe,
};
pub use pipeline::{FileOutcome, IngestionError, IngestionPipeline};
pub use watcher::FolderWatcher;
