//! Track metadata: closed field vocabularies and the extraction layer.

mod extractor;
mod fields;

pub use extractor::{is_alac, LoftyInspector, MetadataError, TrackInspector};
pub use fields::{AudioProperty, PropertySet, PropertyValue, TagField, TagSet};
