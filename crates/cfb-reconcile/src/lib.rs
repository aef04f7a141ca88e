//! cfb-reconcile
//!
//! Cross-source merge and state reconciliation.
//!
//! - Records sharing an id are merged under an authority policy
//! - The diff against stored state is a pure plan (no IO)
//! - Applying a plan is one batch upsert, one batch delete, then best-effort events
//! - Storage failures abort the pass; event failures never do

mod engine;
mod merge;
mod pipeline;
mod types;

pub use engine::{apply, dedup_last_wins, plan, reconcile};
pub use merge::{merge, MergePolicy, DEFAULT_AUTHORITATIVE_SOURCE};
pub use pipeline::{sync_category, SyncOutcome, SyncReport};
pub use types::*;
