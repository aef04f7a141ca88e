//! In-process fakes for the reconcile seams plus raw-record builders.
//!
//! Everything here is deterministic and needs no DB or network.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{bail, Result};
use cfb_md::{Provider, ProviderError};
use cfb_reconcile::{EmitError, EventSink, Store};
use cfb_schemas::{CanonicalRecord, Category, Direction, PlayerEvent, RawPortal, RawRecord, RawRecruit};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// One call observed by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ReadAll(Category),
    Upsert(Category, Vec<String>),
    Delete(Category, Vec<String>),
}

/// Which store operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    ReadAll,
    Upsert,
    Delete,
}

/// Category tables held in insertion order. Upserting an existing id
/// replaces it in place.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<BTreeMap<Category, Vec<CanonicalRecord>>>,
    calls: Mutex<Vec<StoreCall>>,
    fail: Mutex<Option<FailPoint>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `category` without recording a call.
    pub fn seed(&self, category: Category, records: Vec<CanonicalRecord>) {
        lock(&self.tables).insert(category, records);
    }

    pub fn fail_on(&self, point: Option<FailPoint>) {
        *lock(&self.fail) = point;
    }

    pub fn snapshot(&self, category: Category) -> Vec<CanonicalRecord> {
        lock(&self.tables).get(&category).cloned().unwrap_or_default()
    }

    pub fn get(&self, category: Category, id: &str) -> Option<CanonicalRecord> {
        lock(&self.tables)
            .get(&category)
            .and_then(|t| t.iter().find(|r| r.id == id).cloned())
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        if *lock(&self.fail) == Some(point) {
            bail!("injected {point:?} failure");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn read_all(&self, category: Category) -> Result<Vec<CanonicalRecord>> {
        lock(&self.calls).push(StoreCall::ReadAll(category));
        self.check(FailPoint::ReadAll)?;
        Ok(self.snapshot(category))
    }

    async fn upsert(&self, category: Category, records: &[CanonicalRecord]) -> Result<()> {
        lock(&self.calls).push(StoreCall::Upsert(
            category,
            records.iter().map(|r| r.id.clone()).collect(),
        ));
        self.check(FailPoint::Upsert)?;

        let mut tables = lock(&self.tables);
        let table = tables.entry(category).or_default();
        for rec in records {
            match table.iter_mut().find(|r| r.id == rec.id) {
                Some(slot) => *slot = rec.clone(),
                None => table.push(rec.clone()),
            }
        }
        Ok(())
    }

    async fn delete(&self, category: Category, ids: &[String]) -> Result<()> {
        lock(&self.calls).push(StoreCall::Delete(category, ids.to_vec()));
        self.check(FailPoint::Delete)?;

        if let Some(table) = lock(&self.tables).get_mut(&category) {
            table.retain(|r| !ids.contains(&r.id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Records every emit attempt; accepts or rejects per configuration.
#[derive(Debug, Default)]
pub struct RecordingSink {
    attempts: Mutex<Vec<PlayerEvent>>,
    accepted: Mutex<Vec<PlayerEvent>>,
    /// Event types to reject. `None` rejects nothing, `Some(empty)` rejects everything.
    reject: Option<Vec<&'static str>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that is unreachable for every event.
    pub fn failing() -> Self {
        Self {
            reject: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// A sink that rejects only the listed event types.
    pub fn rejecting(event_types: &[&'static str]) -> Self {
        Self {
            reject: Some(event_types.to_vec()),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<PlayerEvent> {
        lock(&self.attempts).clone()
    }

    pub fn accepted(&self) -> Vec<PlayerEvent> {
        lock(&self.accepted).clone()
    }

    pub fn accepted_types(&self) -> Vec<&'static str> {
        lock(&self.accepted).iter().map(|e| e.event_type()).collect()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: &PlayerEvent) -> Result<(), EmitError> {
        lock(&self.attempts).push(event.clone());
        match &self.reject {
            Some(types) if types.is_empty() => {
                Err(EmitError::Unavailable("recording sink offline".to_string()))
            }
            Some(types) if types.contains(&event.event_type()) => Err(EmitError::Rejected(
                format!("{} not accepted", event.event_type()),
            )),
            _ => {
                lock(&self.accepted).push(event.clone());
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Provider that serves fixed raw records, or always fails.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    tag: String,
    records: Vec<RawRecord>,
    failure: Option<String>,
}

impl StaticProvider {
    pub fn new(tag: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            tag: tag.into(),
            records,
            failure: None,
        }
    }

    /// Every fetch returns a transport error carrying `message`.
    pub fn failing(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            records: Vec::new(),
            failure: Some(message.into()),
        }
    }

    pub fn boxed(self) -> Box<dyn Provider> {
        Box::new(self)
    }
}

#[async_trait::async_trait]
impl Provider for StaticProvider {
    fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns only the records whose variant matches `category`.
    async fn fetch(&self, category: Category) -> Result<Vec<RawRecord>, ProviderError> {
        if let Some(msg) = &self.failure {
            return Err(ProviderError::Transport(msg.clone()));
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.category() == category)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

pub fn raw_recruit(name: &str, stars: Option<u8>, status: Option<&str>) -> RawRecord {
    RawRecord::Recruit(RawRecruit {
        name: name.to_string(),
        position: "Quarterback".to_string(),
        hometown: None,
        stars,
        rating: None,
        status: status.map(str::to_string),
        player_url: None,
    })
}

pub fn raw_portal(name: &str, direction: Direction, status: Option<&str>) -> RawRecord {
    RawRecord::Portal(RawPortal {
        name: name.to_string(),
        position: "CB".to_string(),
        direction,
        source_school: None,
        status: status.map(str::to_string),
        player_url: None,
    })
}

/// A canonical recruit as the builder would produce it for provider `source`.
pub fn recruit(name: &str, status: Option<&str>, source: &str) -> CanonicalRecord {
    cfb_md::build_record(&raw_recruit(name, None, status), source)
}

/// A canonical portal entry as the builder would produce it for provider `source`.
pub fn portal_entry(
    name: &str,
    direction: Direction,
    status: Option<&str>,
    source: &str,
) -> CanonicalRecord {
    cfb_md::build_record(&raw_portal(name, direction, status), source)
}

pub fn ids(records: &[CanonicalRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

/// Id for a display name, as the identity deriver computes it.
pub fn id_of(name: &str) -> String {
    cfb_identity::derive_id(name)
}
