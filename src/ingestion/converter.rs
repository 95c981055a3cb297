//! External encoder and property probe collaborators (ffmpeg/ffprobe).
//!
//! Both tools sit behind traits so the pipeline and the metadata
//! extractor can be exercised in tests without shelling out.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors from external tool invocation.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),

    #[error("encoder failed: {0}")]
    EncodeFailed(String),

    #[error("encoder reported success but produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("invalid tool output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts an audio file to the target codec.
///
/// `encode` returns the path of the produced file. Failure must leave no
/// partial output behind and must never touch the source file.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, source: &Path) -> Result<PathBuf, ConversionError>;
}

/// Supplies the audio bitrate when the primary metadata reader cannot.
#[async_trait]
pub trait PropertyProbe: Send + Sync {
    async fn bitrate_kbps(&self, path: &Path) -> Result<Option<u32>, ConversionError>;
}

/// ffmpeg-based ALAC encoder.
///
/// Output lands next to the source with the target extension. Video
/// streams (embedded cover art) are copied through untouched.
pub struct FfmpegEncoder {
    binary: String,
    target_extension: String,
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<String>, target_extension: &str) -> Self {
        Self {
            binary: binary.into(),
            target_extension: target_extension.trim_start_matches('.').to_string(),
        }
    }

    /// Where `encode` will write its output for the given source.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        source.with_extension(&self.target_extension)
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, source: &Path) -> Result<PathBuf, ConversionError> {
        let output_path = self.output_path(source);
        debug!(
            source = %source.display(),
            output = %output_path.display(),
            "Converting to ALAC"
        );

        let output = Command::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(source)
            .args(["-c:a", "alac", "-c:v", "copy"])
            .arg(&output_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            // Never leave a partial file where the watcher could find it.
            if output_path.exists() {
                let _ = tokio::fs::remove_file(&output_path).await;
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::EncodeFailed(stderr.to_string()));
        }

        if !output_path.exists() {
            return Err(ConversionError::MissingOutput(output_path));
        }

        Ok(output_path)
    }
}

/// ffprobe JSON output structure, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    bit_rate: Option<String>,
}

/// ffprobe-based bitrate probe.
pub struct FfprobeProbe {
    binary: String,
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl PropertyProbe for FfprobeProbe {
    async fn bitrate_kbps(&self, path: &Path) -> Result<Option<u32>, ConversionError> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::ProbeFailed(stderr.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_bitrate_kbps(&stdout).map_err(ConversionError::InvalidOutput)
    }
}

/// Parse the audio bitrate out of ffprobe JSON output.
///
/// Prefers the audio stream's bitrate, falling back to the container
/// format's overall bitrate. `Ok(None)` when neither reports one.
fn parse_bitrate_kbps(json: &str) -> Result<Option<u32>, String> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("JSON parse error: {}", e))?;

    let stream_rate = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "audio")
        .and_then(|s| s.bit_rate.as_ref());
    let format_rate = probe.format.as_ref().and_then(|f| f.bit_rate.as_ref());

    Ok(stream_rate
        .or(format_rate)
        .and_then(|b| b.parse::<u64>().ok())
        .map(|b| (b / 1000) as u32))
}

/// Check that the configured encoder and probe binaries run at all.
/// Called once at startup so a missing tool shows up immediately instead
/// of on the first ingested file.
pub async fn check_tools_available(
    encoder_binary: &str,
    probe_binary: &str,
) -> Result<(), ConversionError> {
    for binary in [probe_binary, encoder_binary] {
        let status = Command::new(binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(s) if s.success() => {}
            _ => {
                return Err(ConversionError::ProbeFailed(format!(
                    "{} not found or not working",
                    binary
                )))
            }
        }
    }

    Ok(())
}
