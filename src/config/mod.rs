mod file_config;

pub use file_config::{AlbumArtConfig, CriteriaConfig, FileConfig, SkipDuplicatesConfig};

use crate::dedup::DuplicateCriteria;
use anyhow::{bail, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Extensions treated as audio when the config does not list its own.
const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "wma", "opus"];

const DEFAULT_TARGET_EXTENSION: &str = "m4a";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub download_folders: Vec<PathBuf>,
    pub library_folder: Option<PathBuf>,
    pub dest_folder: Option<PathBuf>,
    pub poll_interval_secs: u64,
    pub settle_secs: u64,
}

/// Fully resolved daemon configuration, built once at startup and passed
/// by reference everywhere. No component reads config state of its own.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Folders watched for fresh downloads.
    pub download_folders: Vec<PathBuf>,
    /// Root of the existing library; duplicate checks resolve canonical
    /// paths against this tree.
    pub library_folder: PathBuf,
    /// Optional flat inbox. When set, processed files land here instead
    /// of at their canonical path (an external importer files them).
    pub dest_folder: Option<PathBuf>,
    /// Lowercase extensions (no dot) treated as audio.
    pub supported_extensions: BTreeSet<String>,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    /// Extension of the target container, no dot.
    pub target_extension: String,
    pub ffmpeg_binary: String,
    pub ffprobe_binary: String,
    /// Whether the duplicate gate runs at all.
    pub skip_duplicates: bool,
    pub duplicate_criteria: DuplicateCriteria,
    pub album_art: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let configured_folders: Vec<PathBuf> = file
            .download_folders
            .map(|folders| folders.into_iter().map(PathBuf::from).collect())
            .unwrap_or_else(|| cli.download_folders.clone());

        if configured_folders.is_empty() {
            bail!("At least one download folder must be specified via --download-folder or in the config file");
        }

        // A missing download folder is skipped, not fatal; downloads may
        // land on removable or network storage that comes and goes.
        let download_folders: Vec<PathBuf> = configured_folders
            .into_iter()
            .filter(|folder| {
                let ok = folder.is_dir();
                if !ok {
                    warn!(folder = %folder.display(), "Download folder does not exist, skipping");
                }
                ok
            })
            .collect();
        if download_folders.is_empty() {
            bail!("None of the configured download folders exist");
        }

        let library_folder = file
            .library_folder
            .map(PathBuf::from)
            .or_else(|| cli.library_folder.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "library_folder must be specified via --library-folder or in the config file"
                )
            })?;
        if !library_folder.is_dir() {
            bail!("Library folder does not exist: {:?}", library_folder);
        }

        let dest_folder = file
            .dest_folder
            .map(PathBuf::from)
            .or_else(|| cli.dest_folder.clone());
        if let Some(dest) = &dest_folder {
            if !dest.is_dir() {
                bail!("Destination folder does not exist: {:?}", dest);
            }
        }

        let supported_extensions: BTreeSet<String> = file
            .supported_extensions
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if supported_extensions.is_empty() {
            bail!("supported_extensions resolved to an empty set");
        }

        let poll_interval =
            Duration::from_secs(file.poll_interval_secs.unwrap_or(cli.poll_interval_secs).max(1));
        let settle_delay = Duration::from_secs(file.settle_secs.unwrap_or(cli.settle_secs));

        let target_extension = file
            .target_extension
            .unwrap_or_else(|| DEFAULT_TARGET_EXTENSION.to_string())
            .trim_start_matches('.')
            .to_ascii_lowercase();

        let skip_config = file.skip_duplicates.unwrap_or_default();
        // Strict boolean: anything but `enabled = true` leaves the gate off.
        let skip_duplicates = skip_config.enabled == Some(true);
        let criteria_config = skip_config.criteria.unwrap_or_default();
        let duplicate_criteria = DuplicateCriteria::from_flags(
            &criteria_config.metadata,
            &criteria_config.audio_properties,
            criteria_config.audio_hash == Some(true),
        );

        let album_art = file
            .album_art
            .and_then(|a| a.enabled)
            .unwrap_or(false);

        Ok(Self {
            download_folders,
            library_folder,
            dest_folder,
            supported_extensions,
            poll_interval,
            settle_delay,
            target_extension,
            ffmpeg_binary: file.ffmpeg_binary.unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe_binary: file.ffprobe_binary.unwrap_or_else(|| "ffprobe".to_string()),
            skip_duplicates,
            duplicate_criteria,
            album_art,
        })
    }

    /// Whether the path has one of the configured audio extensions.
    pub fn is_supported_audio(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.supported_extensions.contains(&e.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    /// Whether the path is a zip archive.
    pub fn is_archive(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false)
    }
}
