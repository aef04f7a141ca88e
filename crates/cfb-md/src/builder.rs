//! Raw provider record → [`CanonicalRecord`].
//!
//! Computes the id and canonical position; every other field is copied as-is.
//! No merge, no timestamps: `updated_at` is left for the reconciler.

use cfb_identity::{derive_id, normalize_position};
use cfb_schemas::{CanonicalRecord, RawRecord, RecordDetails};

pub fn build_record(raw: &RawRecord, provider_tag: &str) -> CanonicalRecord {
    match raw {
        RawRecord::Recruit(r) => CanonicalRecord {
            id: derive_id(&r.name),
            name: r.name.trim().to_string(),
            position: normalize_position(&r.position),
            status: r.status.clone(),
            player_url: r.player_url.clone(),
            source: provider_tag.to_string(),
            updated_at: None,
            details: RecordDetails::Recruit {
                hometown: r.hometown.clone(),
                stars: r.stars,
                rating: r.rating,
            },
        },
        RawRecord::Portal(p) => CanonicalRecord {
            id: derive_id(&p.name),
            name: p.name.trim().to_string(),
            position: normalize_position(&p.position),
            status: p.status.clone(),
            player_url: p.player_url.clone(),
            source: provider_tag.to_string(),
            updated_at: None,
            details: RecordDetails::Portal {
                direction: p.direction,
                source_school: p.source_school.clone(),
            },
        },
    }
}
