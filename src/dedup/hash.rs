//! Content hashing over decoded audio samples.
//!
//! The digest covers the raw PCM sample bytes, not the container bytes,
//! so the same recording hashes identically regardless of tags or
//! container-level differences.

use crate::metadata::MetadataError;
use sha2::{Digest, Sha256};
use std::path::Path;
use symphonia::core::audio::{SampleBuffer, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

fn unreadable(path: &Path, reason: impl ToString) -> MetadataError {
    MetadataError::Unreadable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Decode the file to interleaved 16-bit samples and return the hex
/// SHA-256 digest of the sample bytes (little-endian order).
///
/// Blocking: decodes the entire stream. Callers on an async runtime
/// should run this on the blocking pool.
pub fn pcm_sha256(path: &Path) -> Result<String, MetadataError> {
    let file = std::fs::File::open(path)?;
    let source = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| unreadable(path, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| unreadable(path, "no audio track found"))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| unreadable(path, e))?;

    let mut hasher = Sha256::new();
    let mut sample_buf: Option<SampleBuffer<i16>> = None;
    let mut decoded_packets = 0u64;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(unreadable(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let needed = decoded.capacity() * spec.channels.count();
                if sample_buf
                    .as_ref()
                    .map(|b| b.capacity() < needed)
                    .unwrap_or(true)
                {
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    for sample in buf.samples() {
                        hasher.update(sample.to_le_bytes());
                    }
                }
                decoded_packets += 1;
            }
            // A corrupt packet is skipped; the stream may still be usable.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(unreadable(path, e)),
        }
    }

    if decoded_packets == 0 {
        return Err(unreadable(path, "no decodable audio packets"));
    }

    Ok(format!("{:x}", hasher.finalize()))
}
