//! Scenario: identity derivation and cross-source merge, end to end through
//! the record builder.
//!
//! # Invariants under test
//! - Name variants differing only by casing, whitespace, punctuation or a
//!   generational suffix derive the same id.
//! - Hyphenated surnames collapse to their last component.
//! - Ids are exactly 16 lowercase hex chars.
//! - The authoritative source overwrites conflicts; others only fill gaps.
//!
//! All tests are pure in-process.

use cfb_identity::derive_id;
use cfb_md::build_record;
use cfb_reconcile::{merge, MergePolicy};
use cfb_schemas::RecordDetails;
use cfb_testkit::raw_recruit;

fn stars(rec: &cfb_schemas::CanonicalRecord) -> Option<u8> {
    match rec.details {
        RecordDetails::Recruit { stars, .. } => stars,
        RecordDetails::Portal { .. } => None,
    }
}

#[test]
fn name_variants_share_one_id() {
    let id = derive_id("John Smith");
    for variant in ["JOHN SMITH", "John Smith Jr.", "  John  Smith  ", "john smith, jr", "John Smith II"] {
        assert_eq!(derive_id(variant), id, "variant {variant:?}");
    }
}

#[test]
fn hyphenated_surname_collapses() {
    assert_eq!(
        derive_id("Kensly Ladour-Foustin III"),
        derive_id("Kensly Foustin")
    );
}

#[test]
fn ids_are_sixteen_lowercase_hex() {
    for name in ["John Smith", "", "   ", "Björk", "A", "Jean-Luc Picard", "O'Neil Jr."] {
        let id = derive_id(name);
        assert_eq!(id.len(), 16, "{name:?}");
        assert!(
            id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')),
            "{name:?} -> {id}"
        );
    }
}

#[test]
fn authoritative_record_wins_conflicts_across_providers() {
    let policy = MergePolicy::default();
    let records = vec![
        build_record(&raw_recruit("John Smith", Some(3), Some("uncommitted")), "on3"),
        build_record(&raw_recruit("JOHN SMITH JR.", Some(4), Some("committed")), "247"),
    ];

    let merged = merge(records, &policy);
    assert_eq!(merged.len(), 1);
    assert_eq!(stars(&merged[0]), Some(4));
    assert_eq!(merged[0].status.as_deref(), Some("committed"));
    assert_eq!(merged[0].source, "247,on3");
    assert_eq!(merged[0].name, "John Smith", "display name fixed by first-seen record");
}

#[test]
fn non_authoritative_fills_null_fields() {
    let policy = MergePolicy::default();
    let records = vec![
        build_record(&raw_recruit("John Smith", None, None), "247"),
        build_record(&raw_recruit("John Smith", Some(4), None), "on3"),
    ];

    let merged = merge(records, &policy);
    assert_eq!(stars(&merged[0]), Some(4));
    assert_eq!(merged[0].source, "247,on3");
}

#[test]
fn different_players_stay_separate() {
    let policy = MergePolicy::default();
    let merged = merge(
        vec![
            build_record(&raw_recruit("John Smith", Some(3), None), "247"),
            build_record(&raw_recruit("Jane Smith", Some(5), None), "247"),
            build_record(&raw_recruit("John Smyth", Some(2), None), "on3"),
        ],
        &policy,
    );
    // "John Smith" and "Jane Smith" share the key "jsmith" and collide.
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].name, "John Smith");
    assert_eq!(merged[1].name, "John Smyth");
}
