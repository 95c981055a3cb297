//! Zip archive expansion for downloaded albums.
//!
//! Archives are expanded into the directory that contains them. Entry
//! paths are flattened to their file name and sanitized, so a crafted
//! archive cannot write outside the download folder. Only supported
//! audio entries are extracted; everything else is ignored.

use crate::config::AppConfig;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur during archive expansion.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip extraction error: {0}")]
    Zip(String),

    #[error("Archive has no parent directory: {0}")]
    NoParent(PathBuf),
}

/// Expand a zip archive next to itself and return the extracted audio
/// files. The archive is removed after successful extraction; on any
/// extraction error it is left in place.
///
/// Blocking: call from the blocking pool when on an async runtime.
pub fn extract_archive(archive: &Path, config: &AppConfig) -> Result<Vec<PathBuf>, ArchiveError> {
    let extract_dir = archive
        .parent()
        .ok_or_else(|| ArchiveError::NoParent(archive.to_path_buf()))?
        .to_path_buf();

    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| ArchiveError::Zip(e.to_string()))?;

    let mut audio_files = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| ArchiveError::Zip(e.to_string()))?;

        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        if !has_supported_extension(&entry_name, config) {
            continue;
        }

        // Flatten to the bare file name; album structure is rebuilt from
        // tags later, not from archive layout.
        let Some(safe_name) = sanitize_entry_name(&entry_name) else {
            warn!(entry = %entry_name, "Skipping archive entry with unusable name");
            continue;
        };

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| ArchiveError::Zip(e.to_string()))?;

        let output_path = extract_dir.join(&safe_name);
        std::fs::write(&output_path, &content)?;
        audio_files.push(output_path);
    }

    info!(
        archive = %archive.display(),
        extracted = audio_files.len(),
        "Extracted archive"
    );

    // Extraction succeeded; a stuck archive is only worth a warning.
    if let Err(e) = std::fs::remove_file(archive) {
        warn!(archive = %archive.display(), error = %e, "Could not remove archive after extraction");
    }

    Ok(audio_files)
}

fn has_supported_extension(entry_name: &str, config: &AppConfig) -> bool {
    config.is_supported_audio(Path::new(entry_name))
}

/// Reduce an archive entry path to a safe bare file name.
///
/// Returns `None` for names that are empty after sanitization, hidden
/// files, or pure traversal components.
fn sanitize_entry_name(entry_name: &str) -> Option<String> {
    let name = Path::new(entry_name).file_name().and_then(|n| n.to_str())?;

    if name.contains('\0') || name.starts_with('.') || name == ".." {
        return None;
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}
