//! End-to-end duplicate detection over real decoded audio.

mod common;

use common::{fixture, tag_file, write_wav, write_wav_with, NoopProbe};
use shelfsync::dedup::{DuplicateCriteria, DuplicateDetector};
use shelfsync::metadata::{AudioProperty, LoftyInspector, TagField};
use std::path::Path;
use std::sync::Arc;

fn detector() -> DuplicateDetector {
    DuplicateDetector::new(Arc::new(LoftyInspector::new(Arc::new(NoopProbe))))
}

fn hash_criteria() -> DuplicateCriteria {
    DuplicateCriteria {
        audio_hash: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn hash_strategy_sees_through_different_tags() {
    let fx = fixture();
    let a = fx.downloads.join("a.wav");
    let b = fx.downloads.join("b.wav");
    // Identical samples, completely different tags.
    write_wav(&a, 7);
    write_wav(&b, 7);
    tag_file(&a, "Artist One", "Album One", "One", None, Some("1"));
    tag_file(&b, "Artist Two", "Album Two", "Two", None, Some("2"));

    assert!(detector()
        .is_duplicate(&a, &b, &hash_criteria())
        .await
        .unwrap());
}

#[tokio::test]
async fn hash_strategy_distinguishes_different_audio() {
    let fx = fixture();
    let a = fx.downloads.join("a.wav");
    let b = fx.downloads.join("b.wav");
    write_wav(&a, 7);
    write_wav(&b, 13);

    assert!(!detector()
        .is_duplicate(&a, &b, &hash_criteria())
        .await
        .unwrap());
}

#[tokio::test]
async fn matching_tags_and_duration_make_a_duplicate() {
    let fx = fixture();
    let a = fx.downloads.join("a.wav");
    let b = fx.downloads.join("b.wav");
    // Different samples but same length and same tags.
    write_wav(&a, 7);
    write_wav(&b, 13);
    tag_file(&a, "The Band", "First Album", "Song", None, Some("7"));
    tag_file(&b, "The Band", "First Album", "Song", None, Some("7"));

    let criteria = DuplicateCriteria {
        audio_hash: false,
        metadata_fields: vec![TagField::Artist, TagField::Album, TagField::Title],
        property_fields: vec![AudioProperty::Duration],
    };
    assert!(detector().is_duplicate(&a, &b, &criteria).await.unwrap());
}

#[tokio::test]
async fn different_durations_are_not_duplicates() {
    let fx = fixture();
    let a = fx.downloads.join("a.wav");
    let b = fx.downloads.join("b.wav");
    write_wav_with(&a, 7, 44_100);
    write_wav_with(&b, 7, 22_050);
    tag_file(&a, "The Band", "First Album", "Song", None, Some("7"));
    tag_file(&b, "The Band", "First Album", "Song", None, Some("7"));

    let criteria = DuplicateCriteria {
        audio_hash: false,
        metadata_fields: vec![TagField::Artist],
        property_fields: vec![AudioProperty::Duration],
    };
    assert!(!detector().is_duplicate(&a, &b, &criteria).await.unwrap());
}

#[tokio::test]
async fn empty_criteria_match_any_two_files() {
    let fx = fixture();
    let a = fx.downloads.join("a.wav");
    let b = fx.downloads.join("b.wav");
    write_wav(&a, 7);
    write_wav(&b, 13);

    // Documented vacuous-truth behavior: nothing configured, hash off.
    assert!(detector()
        .is_duplicate(&a, &b, &DuplicateCriteria::default())
        .await
        .unwrap());
}

#[tokio::test]
async fn unreadable_files_error_under_the_hash_strategy() {
    let fx = fixture();
    let a = fx.downloads.join("a.wav");
    let b = fx.downloads.join("garbage.wav");
    write_wav(&a, 7);
    std::fs::write(&b, b"not audio").unwrap();

    assert!(detector().is_duplicate(&a, &b, &hash_criteria()).await.is_err());
    assert!(detector()
        .is_duplicate(Path::new("/nonexistent.wav"), &a, &hash_criteria())
        .await
        .is_err());
}
