//! Cross-source merge.
//!
//! Records sharing an id are folded into the first one seen. The
//! authoritative source overwrites any field it has a value for; every other
//! source only fills gaps. Among non-authoritative sources the first one to
//! fill a gap wins, so output depends on input order.

use std::collections::HashMap;

use cfb_schemas::{join_sources, split_sources, CanonicalRecord, RecordDetails};
use tracing::warn;

/// Provider tag whose data wins conflicts unless configured otherwise.
pub const DEFAULT_AUTHORITATIVE_SOURCE: &str = "247";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
    pub authoritative_source: String,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTHORITATIVE_SOURCE)
    }
}

impl MergePolicy {
    pub fn new(authoritative_source: impl Into<String>) -> Self {
        Self {
            authoritative_source: authoritative_source.into(),
        }
    }

    pub fn is_authoritative(&self, record: &CanonicalRecord) -> bool {
        record.has_source(&self.authoritative_source)
    }
}

/// Group by id and merge. Output keeps the first-seen order of ids.
pub fn merge(records: Vec<CanonicalRecord>, policy: &MergePolicy) -> Vec<CanonicalRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, CanonicalRecord> = HashMap::new();

    for mut rec in records {
        match by_id.get_mut(&rec.id) {
            Some(existing) => merge_into(existing, rec, policy),
            None => {
                rec.source = join_sources(&split_sources(&rec.source));
                order.push(rec.id.clone());
                by_id.insert(rec.id.clone(), rec);
            }
        }
    }

    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}

fn take<T>(slot: &mut Option<T>, incoming: Option<T>, authoritative: bool) {
    if let Some(v) = incoming {
        if authoritative || slot.is_none() {
            *slot = Some(v);
        }
    }
}

fn merge_into(existing: &mut CanonicalRecord, incoming: CanonicalRecord, policy: &MergePolicy) {
    let authoritative = policy.is_authoritative(&incoming);
    let CanonicalRecord {
        position,
        status,
        player_url,
        source,
        details,
        ..
    } = incoming;

    take(&mut existing.status, status, authoritative);
    take(&mut existing.player_url, player_url, authoritative);

    // Empty position counts as missing.
    if !position.is_empty() && (authoritative || existing.position.is_empty()) {
        existing.position = position;
    }

    match (&mut existing.details, details) {
        (
            RecordDetails::Recruit {
                hometown,
                stars,
                rating,
            },
            RecordDetails::Recruit {
                hometown: new_hometown,
                stars: new_stars,
                rating: new_rating,
            },
        ) => {
            take(hometown, new_hometown, authoritative);
            take(stars, new_stars, authoritative);
            take(rating, new_rating, authoritative);
        }
        (
            RecordDetails::Portal {
                direction,
                source_school,
            },
            RecordDetails::Portal {
                direction: new_direction,
                source_school: new_source_school,
            },
        ) => {
            // Direction is never null, so only the authoritative source can move it.
            if authoritative {
                *direction = new_direction;
            }
            take(source_school, new_source_school, authoritative);
        }
        (_, other) => {
            warn!(
                entry_id = %existing.id,
                incoming = %other.category(),
                "category mismatch during merge; keeping first-seen details"
            );
        }
    }

    let mut tags = split_sources(&existing.source);
    tags.extend(split_sources(&source));
    existing.source = join_sources(&tags);
}
