//! Canonical library layout.

mod path;

pub use path::{canonical_track_path, LibraryPathError, PATH_FIELDS};
