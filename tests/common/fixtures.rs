//! Scratch folders and synthesized audio fixtures.

#![allow(dead_code)] // Each test binary uses a different subset.

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::prelude::*;
use lofty::tag::{Accessor, ItemKey, Tag, TagType};
use std::path::{Path, PathBuf};

use shelfsync::config::CliConfig;

/// A scratch download/library/inbox folder layout.
pub struct Fixture {
    // Held for its Drop; the directories die with the fixture.
    pub tmp: tempfile::TempDir,
    pub downloads: PathBuf,
    pub library: PathBuf,
    pub inbox: PathBuf,
}

pub fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let downloads = tmp.path().join("downloads");
    let library = tmp.path().join("library");
    let inbox = tmp.path().join("inbox");
    std::fs::create_dir_all(&downloads).unwrap();
    std::fs::create_dir_all(&library).unwrap();
    std::fs::create_dir_all(&inbox).unwrap();

    Fixture {
        tmp,
        downloads,
        library,
        inbox,
    }
}

/// CLI config over the fixture folders: watch `downloads`, library at
/// `library`, no inbox, zero settle delay.
pub fn base_cli(fx: &Fixture) -> CliConfig {
    CliConfig {
        download_folders: vec![fx.downloads.clone()],
        library_folder: Some(fx.library.clone()),
        dest_folder: None,
        poll_interval_secs: 1,
        settle_secs: 0,
    }
}

/// Write a one-second mono WAV whose samples are derived from `seed`,
/// so different seeds produce different audio content.
pub fn write_wav(path: &Path, seed: i16) {
    write_wav_with(path, seed, 44_100);
}

pub fn write_wav_with(path: &Path, seed: i16, sample_count: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..sample_count {
        let sample = ((i as i64 * i64::from(seed)) % 8_192) as i16;
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

/// Attach an ID3v2 tag to an existing audio file.
pub fn tag_file(
    path: &Path,
    artist: &str,
    album: &str,
    title: &str,
    disc: Option<&str>,
    track: Option<&str>,
) {
    let mut tagged = lofty::probe::Probe::open(path).unwrap().read().unwrap();

    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_artist(artist.to_string());
    tag.set_album(album.to_string());
    tag.set_title(title.to_string());
    if let Some(disc) = disc {
        tag.insert_text(ItemKey::DiscNumber, disc.to_string());
    }
    if let Some(track) = track {
        tag.insert_text(ItemKey::TrackNumber, track.to_string());
    }

    tagged.insert_tag(tag);
    tagged.save_to_path(path, WriteOptions::default()).unwrap();
}
