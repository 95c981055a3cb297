//! Closed vocabularies for tag fields and audio properties.
//!
//! Tag data in the wild is keyed by free-form, casing-inconsistent names
//! (`discnumber`, `DISCNUMBER`, `disc`, ...). Everything past the config
//! boundary works with these closed enums instead; unrecognized names
//! resolve to `None` rather than an error.

use std::collections::BTreeMap;
use std::fmt;

/// A recognized tag field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagField {
    Artist,
    Album,
    Title,
    AlbumArtist,
    Genre,
    Year,
    DiscNumber,
    TrackNumber,
}

impl TagField {
    /// Parse a field name as it appears in tag data or config files.
    ///
    /// Accepts the alias spellings seen in easy-tag style metadata
    /// (`disc`, `discc`, `track`, any casing). Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "artist" => Some(Self::Artist),
            "album" => Some(Self::Album),
            "title" => Some(Self::Title),
            "albumartist" | "album_artist" => Some(Self::AlbumArtist),
            "genre" => Some(Self::Genre),
            "year" | "date" => Some(Self::Year),
            "discnumber" | "disc" | "discc" => Some(Self::DiscNumber),
            "tracknumber" | "track" => Some(Self::TrackNumber),
            _ => None,
        }
    }

    /// Canonical lowercase name, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Title => "title",
            Self::AlbumArtist => "albumartist",
            Self::Genre => "genre",
            Self::Year => "year",
            Self::DiscNumber => "discnumber",
            Self::TrackNumber => "tracknumber",
        }
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A recognized audio property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AudioProperty {
    Duration,
    Bitrate,
    SampleRate,
    Channels,
    Codec,
}

impl AudioProperty {
    /// Parse a property name as it appears in config files (any casing).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "duration" => Some(Self::Duration),
            "bitrate" => Some(Self::Bitrate),
            "sample_rate" | "samplerate" => Some(Self::SampleRate),
            "channels" => Some(Self::Channels),
            "codec" => Some(Self::Codec),
            _ => None,
        }
    }

    /// Canonical lowercase name, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::Bitrate => "bitrate",
            Self::SampleRate => "sample_rate",
            Self::Channels => "channels",
            Self::Codec => "codec",
        }
    }
}

impl fmt::Display for AudioProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An extracted property value.
///
/// Comparison is exact equality including the variant; duration is
/// canonicalized to whole milliseconds and bitrate to kbps at extraction
/// so two reads of the same file always compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Integer(u64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Tag field values extracted from one file. A missing key means the
/// field was requested but absent from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeMap<TagField, String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: TagField, value: String) {
        self.0.insert(field, value);
    }

    pub fn get(&self, field: TagField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TagField, &str)> {
        self.0.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

/// Audio property values extracted from one file. A missing key means
/// the property was requested but could not be determined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet(BTreeMap<AudioProperty, PropertyValue>);

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, prop: AudioProperty, value: PropertyValue) {
        self.0.insert(prop, value);
    }

    pub fn get(&self, prop: AudioProperty) -> Option<&PropertyValue> {
        self.0.get(&prop)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
