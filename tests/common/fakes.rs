//! Fake external collaborators.
//!
//! The real encoder and probe shell out to ffmpeg/ffprobe; tests never
//! do. The fake encoder "converts" by synthesizing a fresh valid WAV at
//! the output path.

#![allow(dead_code)] // Each test binary uses a different subset.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use shelfsync::ingestion::{ConversionError, Encoder, PropertyProbe};

use super::fixtures::write_wav;

/// Encoder fake: counts invocations and writes a small valid WAV where
/// ffmpeg would have written its output.
pub struct CountingEncoder {
    target_extension: String,
    calls: AtomicUsize,
}

impl CountingEncoder {
    pub fn new(target_extension: &str) -> Self {
        Self {
            target_extension: target_extension.trim_start_matches('.').to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Encoder for CountingEncoder {
    async fn encode(&self, source: &Path) -> Result<PathBuf, ConversionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = source.with_extension(&self.target_extension);
        write_wav(&output, 99);
        Ok(output)
    }
}

/// Encoder fake that always fails, for error-path tests.
pub struct FailingEncoder;

#[async_trait]
impl Encoder for FailingEncoder {
    async fn encode(&self, _source: &Path) -> Result<PathBuf, ConversionError> {
        Err(ConversionError::EncodeFailed("simulated failure".to_string()))
    }
}

/// Probe fake that never finds a bitrate.
pub struct NoopProbe;

#[async_trait]
impl PropertyProbe for NoopProbe {
    async fn bitrate_kbps(&self, _path: &Path) -> Result<Option<u32>, ConversionError> {
        Ok(None)
    }
}
