//! Common test infrastructure
//!
//! This module provides everything the end-to-end tests need: scratch
//! folder layouts, synthesized tagged audio files, and fake external
//! collaborators. Tests should only import from this module, not from
//! internal submodules.

mod fakes;
mod fixtures;

// Public API - this is what tests import
pub use fakes::{CountingEncoder, FailingEncoder, NoopProbe};
pub use fixtures::{base_cli, fixture, tag_file, write_wav, write_wav_with, Fixture};
