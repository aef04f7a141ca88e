use std::fmt;

use cfb_schemas::{CanonicalRecord, Category, PlayerEvent};

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Key-value table per category, keyed by record id.
///
/// `upsert` and `delete` must be no-ops on empty input; the engine never calls
/// them with empty input anyway.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn read_all(&self, category: Category) -> anyhow::Result<Vec<CanonicalRecord>>;

    async fn upsert(&self, category: Category, records: &[CanonicalRecord]) -> anyhow::Result<()>;

    async fn delete(&self, category: Category, ids: &[String]) -> anyhow::Result<()>;
}

/// Why a sink refused or failed an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The sink is not configured or not reachable.
    Unavailable(String),
    /// The sink was reached but did not accept the event.
    Rejected(String),
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitError::Unavailable(msg) => write!(f, "event sink unavailable: {msg}"),
            EmitError::Rejected(msg) => write!(f, "event rejected: {msg}"),
        }
    }
}

impl std::error::Error for EmitError {}

/// Downstream notification target. One attempt per event; retries, if any,
/// belong to the sink.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &PlayerEvent) -> Result<(), EmitError>;
}

/// Sink used when eventing is switched off. Every emit reports `Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSink;

#[async_trait::async_trait]
impl EventSink for DisabledSink {
    async fn emit(&self, _event: &PlayerEvent) -> Result<(), EmitError> {
        Err(EmitError::Unavailable("eventing disabled".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Plan + result
// ---------------------------------------------------------------------------

/// Everything one pass intends to do, computed without IO.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan {
    pub category: Category,
    /// New and changed records, `updated_at` already stamped.
    pub upserts: Vec<CanonicalRecord>,
    /// Stale ids, in stored order.
    pub deletes: Vec<String>,
    /// New/changed events in fresh order, then removals in stored order.
    pub events: Vec<PlayerEvent>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty() && self.events.is_empty()
    }
}

/// Counts returned by a completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    pub upserted: usize,
    pub deleted: usize,
    pub events_emitted: usize,
    pub events_failed: usize,
}

/// Storage failure that aborted a pass.
#[derive(Debug)]
pub enum ReconcileError {
    ReadAll {
        category: Category,
        source: anyhow::Error,
    },
    Upsert {
        category: Category,
        source: anyhow::Error,
    },
    /// Upserts already landed when this happens; there is no cross-call transaction.
    Delete {
        category: Category,
        source: anyhow::Error,
    },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::ReadAll { category, source } => {
                write!(f, "[{category}] read_all failed: {source:#}")
            }
            ReconcileError::Upsert { category, source } => {
                write!(f, "[{category}] upsert failed: {source:#}")
            }
            ReconcileError::Delete { category, source } => {
                write!(f, "[{category}] delete failed (upserts already applied): {source:#}")
            }
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::ReadAll { source, .. }
            | ReconcileError::Upsert { source, .. }
            | ReconcileError::Delete { source, .. } => Some(&**source),
        }
    }
}
