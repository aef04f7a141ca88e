use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use cfb_schemas::{CanonicalRecord, Category, PlayerEvent};
use tracing::{debug, info, warn};

use crate::{EventSink, ReconcileError, ReconcilePlan, ReconcileResult, Store};

/// Collapse same-id records: the last occurrence's values win, the first
/// occurrence's position is kept.
pub fn dedup_last_wins(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<CanonicalRecord> = Vec::with_capacity(records.len());

    for rec in records {
        match index.get(&rec.id) {
            Some(&i) => out[i] = rec,
            None => {
                index.insert(rec.id.clone(), out.len());
                out.push(rec);
            }
        }
    }

    out
}

/// Deterministic diff of a fresh snapshot against stored state.
///
/// - id not stored => new (stamped, upserted, `new_player`)
/// - stored with a different status => changed (stamped, upserted, `status_change`)
/// - stored with the same status => untouched, even if other fields moved
/// - stored but not fresh => stale (deleted, `player_removed` with the stored record)
pub fn plan(
    category: Category,
    existing: &[CanonicalRecord],
    fresh: Vec<CanonicalRecord>,
    now: DateTime<Utc>,
) -> ReconcilePlan {
    let fresh = dedup_last_wins(fresh);
    let fresh_ids: HashSet<String> = fresh.iter().map(|r| r.id.clone()).collect();
    let existing_by_id: BTreeMap<&str, &CanonicalRecord> =
        existing.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut upserts: Vec<CanonicalRecord> = Vec::new();
    let mut deletes: Vec<String> = Vec::new();
    let mut events: Vec<PlayerEvent> = Vec::new();

    for mut rec in fresh {
        match existing_by_id.get(rec.id.as_str()) {
            None => {
                rec.updated_at = Some(now);
                events.push(PlayerEvent::NewPlayer {
                    category,
                    record: rec.clone(),
                });
                upserts.push(rec);
            }
            Some(old) if old.status != rec.status => {
                rec.updated_at = Some(now);
                events.push(PlayerEvent::StatusChange {
                    category,
                    record: rec.clone(),
                    old_status: old.status.clone(),
                    new_status: rec.status.clone(),
                });
                upserts.push(rec);
            }
            Some(_) => {}
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for old in existing {
        if fresh_ids.contains(&old.id) || !seen.insert(old.id.as_str()) {
            continue;
        }
        events.push(PlayerEvent::PlayerRemoved {
            category,
            record: old.clone(),
        });
        deletes.push(old.id.clone());
    }

    ReconcilePlan {
        category,
        upserts,
        deletes,
        events,
    }
}

/// Persist a plan and emit its events.
///
/// New/changed events go out once the upsert batch lands and before the
/// delete batch runs. Removal events follow a successful delete. Each event
/// gets exactly one attempt; a failure is logged and counted, never returned.
pub async fn apply(
    plan: &ReconcilePlan,
    store: &dyn Store,
    sink: &dyn EventSink,
) -> Result<ReconcileResult, ReconcileError> {
    let category = plan.category;
    let (removals, changes): (Vec<&PlayerEvent>, Vec<&PlayerEvent>) = plan
        .events
        .iter()
        .partition(|e| matches!(e, PlayerEvent::PlayerRemoved { .. }));

    let mut result = ReconcileResult::default();

    if !plan.upserts.is_empty() {
        store
            .upsert(category, &plan.upserts)
            .await
            .map_err(|source| ReconcileError::Upsert { category, source })?;
        result.upserted = plan.upserts.len();
    }
    emit_each(category, &changes, sink, &mut result).await;

    if !plan.deletes.is_empty() {
        if let Err(source) = store.delete(category, &plan.deletes).await {
            warn!(
                %category,
                upserted = result.upserted,
                events_emitted = result.events_emitted,
                pending_removals = removals.len(),
                "delete batch failed after upserts were applied"
            );
            return Err(ReconcileError::Delete { category, source });
        }
        result.deleted = plan.deletes.len();
    }
    emit_each(category, &removals, sink, &mut result).await;

    Ok(result)
}

async fn emit_each(
    category: Category,
    events: &[&PlayerEvent],
    sink: &dyn EventSink,
    result: &mut ReconcileResult,
) {
    for event in events {
        let record = event.record();
        match sink.emit(event).await {
            Ok(()) => {
                result.events_emitted += 1;
                debug!(
                    %category,
                    event_type = event.event_type(),
                    entry_id = %record.id,
                    "event emitted"
                );
            }
            Err(error) => {
                result.events_failed += 1;
                warn!(
                    %category,
                    event_type = event.event_type(),
                    entry_id = %record.id,
                    player = %record.name,
                    %error,
                    "event emit failed; continuing"
                );
            }
        }
    }
}

/// One full reconciliation pass for `category`.
///
/// Stored state is read once; the diff runs against that single snapshot.
/// Concurrent passes for the same category are not guarded here.
pub async fn reconcile(
    category: Category,
    fresh: Vec<CanonicalRecord>,
    store: &dyn Store,
    sink: &dyn EventSink,
) -> Result<ReconcileResult, ReconcileError> {
    let existing = store
        .read_all(category)
        .await
        .map_err(|source| ReconcileError::ReadAll { category, source })?;

    let planned = plan(category, &existing, fresh, Utc::now());
    let result = apply(&planned, store, sink).await?;

    info!(
        %category,
        upserted = result.upserted,
        deleted = result.deleted,
        events_emitted = result.events_emitted,
        events_failed = result.events_failed,
        "reconcile pass complete"
    );

    Ok(result)
}
