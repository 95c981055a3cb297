use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shelfsync::artwork::{ArtworkResolver, MusicBrainzClient};
use shelfsync::config::{AppConfig, CliConfig, FileConfig};
use shelfsync::ingestion::{
    check_tools_available, FfmpegEncoder, FfprobeProbe, FolderWatcher, IngestionPipeline,
};
use shelfsync::metadata::LoftyInspector;
use tokio_util::sync::CancellationToken;

const ART_REQUEST_TIMEOUT_SEC: u64 = 30;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(version, about = "Watches download folders and files fresh audio into the library")]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(short, long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Download folder to watch. Repeat the flag for multiple folders.
    #[clap(long = "download-folder", value_parser = parse_path)]
    pub download_folders: Vec<PathBuf>,

    /// Root of the existing library; canonical paths and duplicate
    /// checks resolve against this tree.
    #[clap(long, value_parser = parse_path)]
    pub library_folder: Option<PathBuf>,

    /// Optional flat inbox. When set, processed files land here for an
    /// external importer instead of at their canonical library path.
    #[clap(long, value_parser = parse_path)]
    pub dest_folder: Option<PathBuf>,

    /// Seconds between watch polls.
    #[clap(long, default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Minimum age in seconds before a freshly written file is touched.
    #[clap(long, default_value_t = 2)]
    pub settle_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!("shelfsync {} starting", env!("CARGO_PKG_VERSION"));

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;

    let cli_config = CliConfig {
        download_folders: cli_args.download_folders,
        library_folder: cli_args.library_folder,
        dest_folder: cli_args.dest_folder,
        poll_interval_secs: cli_args.poll_interval_secs,
        settle_secs: cli_args.settle_secs,
    };
    let config = Arc::new(AppConfig::resolve(&cli_config, file_config)?);

    // A missing ffmpeg only matters once a non-ALAC file shows up, but
    // it is much easier to notice at startup.
    if let Err(e) = check_tools_available(&config.ffmpeg_binary, &config.ffprobe_binary).await {
        warn!(error = %e, "External tools not fully available");
    }

    let probe = Arc::new(FfprobeProbe::new(config.ffprobe_binary.as_str()));
    let inspector = Arc::new(LoftyInspector::new(probe));
    let encoder = Arc::new(FfmpegEncoder::new(
        config.ffmpeg_binary.as_str(),
        &config.target_extension,
    ));
    let artwork = config
        .album_art
        .then(|| ArtworkResolver::new(MusicBrainzClient::new(ART_REQUEST_TIMEOUT_SEC)));

    let pipeline = Arc::new(IngestionPipeline::new(
        Arc::clone(&config),
        inspector,
        encoder,
        artwork,
    ));

    let shutdown = CancellationToken::new();
    let watcher = FolderWatcher::new(Arc::clone(&config), pipeline, shutdown.clone());
    let watcher_handle = tokio::spawn(watcher.run());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Received Ctrl-C, shutting down");
    shutdown.cancel();

    watcher_handle
        .await
        .context("Watcher task failed to shut down")?;
    info!("Stopped");

    Ok(())
}
