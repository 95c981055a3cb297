//! The duplicate decision procedure.
//!
//! Two mutually exclusive strategies: content-hash equality, or
//! field-by-field comparison of configured tag fields and audio
//! properties. Nothing is cached; both files are re-read on every call.

use crate::metadata::{AudioProperty, MetadataError, TagField, TrackInspector};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which comparisons decide whether two files are the same recording.
///
/// When `audio_hash` is set it is the *only* criterion consulted; the
/// field lists are ignored entirely. With `audio_hash` off and both
/// field lists empty, any two files compare as duplicates (vacuous
/// truth) — callers that want a meaningful check must configure at
/// least one field. That behavior is deliberate and kept for
/// compatibility with existing configs.
#[derive(Debug, Clone, Default)]
pub struct DuplicateCriteria {
    /// Compare SHA-256 digests of the decoded samples and nothing else.
    pub audio_hash: bool,
    /// Tag fields that must match under the attribute strategy.
    pub metadata_fields: Vec<TagField>,
    /// Audio properties that must match under the attribute strategy.
    pub property_fields: Vec<AudioProperty>,
}

impl DuplicateCriteria {
    /// Build criteria from config-style per-field enable flags.
    ///
    /// Unrecognized field names are skipped with a warning; they never
    /// fail config loading.
    pub fn from_flags(
        metadata: &BTreeMap<String, bool>,
        properties: &BTreeMap<String, bool>,
        audio_hash: bool,
    ) -> Self {
        let metadata_fields = metadata
            .iter()
            .filter(|(_, enabled)| **enabled)
            .filter_map(|(name, _)| {
                let parsed = TagField::parse(name);
                if parsed.is_none() {
                    warn!(field = %name, "Unrecognized metadata criteria field, ignoring");
                }
                parsed
            })
            .collect();

        let property_fields = properties
            .iter()
            .filter(|(_, enabled)| **enabled)
            .filter_map(|(name, _)| {
                let parsed = AudioProperty::parse(name);
                if parsed.is_none() {
                    warn!(field = %name, "Unrecognized audio property criteria field, ignoring");
                }
                parsed
            })
            .collect();

        Self {
            audio_hash,
            metadata_fields,
            property_fields,
        }
    }
}

/// Decides whether a candidate file duplicates an existing library file.
pub struct DuplicateDetector {
    inspector: Arc<dyn TrackInspector>,
}

impl DuplicateDetector {
    pub fn new(inspector: Arc<dyn TrackInspector>) -> Self {
        Self { inspector }
    }

    /// Compare `candidate` against `existing` under the configured
    /// criteria.
    ///
    /// Attribute comparison is exact equality on extracted values,
    /// including absent-vs-present; there is no tolerance window, so a
    /// re-encode of the same recording at a slightly different bitrate
    /// or duration reads as "not duplicate". A metadata mismatch
    /// short-circuits before any audio property is extracted.
    pub async fn is_duplicate(
        &self,
        candidate: &Path,
        existing: &Path,
        criteria: &DuplicateCriteria,
    ) -> Result<bool, MetadataError> {
        if criteria.audio_hash {
            let candidate_hash = self.inspector.content_hash(candidate).await?;
            let existing_hash = self.inspector.content_hash(existing).await?;
            let matched = candidate_hash == existing_hash;
            debug!(
                candidate = %candidate.display(),
                existing = %existing.display(),
                matched,
                "Content hash comparison"
            );
            return Ok(matched);
        }

        if !criteria.metadata_fields.is_empty() {
            let candidate_tags = self
                .inspector
                .tags(candidate, &criteria.metadata_fields)
                .await?;
            let existing_tags = self
                .inspector
                .tags(existing, &criteria.metadata_fields)
                .await?;

            for field in &criteria.metadata_fields {
                if candidate_tags.get(*field) != existing_tags.get(*field) {
                    debug!(
                        field = %field,
                        candidate_value = ?candidate_tags.get(*field),
                        existing_value = ?existing_tags.get(*field),
                        "Tag field mismatch, not a duplicate"
                    );
                    return Ok(false);
                }
            }
        }

        if !criteria.property_fields.is_empty() {
            let candidate_props = self
                .inspector
                .properties(candidate, &criteria.property_fields)
                .await?;
            let existing_props = self
                .inspector
                .properties(existing, &criteria.property_fields)
                .await?;

            for prop in &criteria.property_fields {
                if candidate_props.get(*prop) != existing_props.get(*prop) {
                    debug!(
                        property = %prop,
                        candidate_value = ?candidate_props.get(*prop),
                        existing_value = ?existing_props.get(*prop),
                        "Audio property mismatch, not a duplicate"
                    );
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}
