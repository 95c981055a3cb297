//! Polling watcher over the download folders.
//!
//! No filesystem-event integration: each tick re-walks the watched
//! roots and picks up anything new. A fresh file is only touched once
//! its modification time is at least the settle delay old, a crude
//! guard against half-written downloads.

use crate::config::AppConfig;
use crate::ingestion::pipeline::IngestionPipeline;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use walkdir::WalkDir;

pub struct FolderWatcher {
    config: Arc<AppConfig>,
    pipeline: Arc<IngestionPipeline>,
    shutdown: CancellationToken,
    /// Paths already handed to the pipeline this session. Entries are
    /// never evicted; processed files leave the download folders anyway.
    seen: HashSet<PathBuf>,
}

impl FolderWatcher {
    pub fn new(
        config: Arc<AppConfig>,
        pipeline: Arc<IngestionPipeline>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            pipeline,
            shutdown,
            seen: HashSet::new(),
        }
    }

    /// Scan everything already present, then poll until shutdown.
    pub async fn run(mut self) {
        info!(
            folders = ?self.config.download_folders,
            interval_secs = self.config.poll_interval.as_secs(),
            "Watching download folders"
        );

        // Files that predate the daemon are processed immediately.
        self.scan_all(false).await;

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; the initial scan already ran.
        ticker.tick().await;

        let shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Watcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.scan_all(true).await;
                }
            }
        }
    }

    async fn scan_all(&mut self, respect_settle: bool) {
        let roots = self.config.download_folders.clone();
        for root in roots {
            self.scan_root(&root, respect_settle).await;
        }
    }

    async fn scan_root(&mut self, root: &Path, respect_settle: bool) {
        for path in collect_candidates(root, &self.config) {
            if self.seen.contains(&path) {
                continue;
            }
            if respect_settle && !has_settled(&path, self.config.settle_delay) {
                debug!(file = %path.display(), "File still settling, deferring");
                continue;
            }

            self.seen.insert(path.clone());
            self.pipeline.process_discovered(&path).await;

            if self.shutdown.is_cancelled() {
                return;
            }
        }
    }
}

/// Walk a root and return the audio files and archives under it.
fn collect_candidates(root: &Path, config: &AppConfig) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| AppConfig::is_archive(path) || config.is_supported_audio(path))
        .collect()
}

/// Whether the file's modification time is at least `settle` old.
/// Unreadable metadata counts as not settled; the next poll retries.
fn has_settled(path: &Path, settle: Duration) -> bool {
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age >= settle)
        .unwrap_or(false)
}
