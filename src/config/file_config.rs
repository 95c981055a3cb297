use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub download_folders: Option<Vec<String>>,
    pub library_folder: Option<String>,
    pub dest_folder: Option<String>,
    pub supported_extensions: Option<Vec<String>>,
    pub poll_interval_secs: Option<u64>,
    pub settle_secs: Option<u64>,
    pub target_extension: Option<String>,
    pub ffmpeg_binary: Option<String>,
    pub ffprobe_binary: Option<String>,

    // Feature configs
    pub skip_duplicates: Option<SkipDuplicatesConfig>,
    pub album_art: Option<AlbumArtConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SkipDuplicatesConfig {
    pub enabled: Option<bool>,
    pub criteria: Option<CriteriaConfig>,
}

/// Per-field enable flags for the duplicate gate.
///
/// Field names are free-form here and validated when the criteria are
/// built; unknown names are ignored with a warning.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CriteriaConfig {
    pub metadata: BTreeMap<String, bool>,
    pub audio_properties: BTreeMap<String, bool>,
    pub audio_hash: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AlbumArtConfig {
    pub enabled: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_a_full_config_file() {
        let toml = r#"
            download_folders = ["/downloads", "/more-downloads"]
            library_folder = "/music/library"
            dest_folder = "/music/inbox"
            supported_extensions = ["mp3", ".FLAC", "wav"]
            poll_interval_secs = 10
            settle_secs = 3

            [skip_duplicates]
            enabled = true

            [skip_duplicates.criteria]
            audio_hash = false

            [skip_duplicates.criteria.metadata]
            artist = true
            album = true
            title = false

            [skip_duplicates.criteria.audio_properties]
            duration = true

            [album_art]
            enabled = true
        "#;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(toml.as_bytes()).unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(
            config.download_folders,
            Some(vec!["/downloads".to_string(), "/more-downloads".to_string()])
        );
        assert_eq!(config.library_folder.as_deref(), Some("/music/library"));
        assert_eq!(config.poll_interval_secs, Some(10));

        let dup = config.skip_duplicates.unwrap();
        assert_eq!(dup.enabled, Some(true));
        let criteria = dup.criteria.unwrap();
        assert_eq!(criteria.audio_hash, Some(false));
        assert_eq!(criteria.metadata.get("artist"), Some(&true));
        assert_eq!(criteria.metadata.get("title"), Some(&false));
        assert_eq!(criteria.audio_properties.get("duration"), Some(&true));
        assert_eq!(config.album_art.unwrap().enabled, Some(true));
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert!(config.download_folders.is_none());
        assert!(config.skip_duplicates.is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(FileConfig::load(Path::new("/nonexistent/config.toml")).is_err());
    }
}
