//! Fetch → build → merge → reconcile for one category.

use cfb_md::{fetch_all, Provider, ProviderFailure};
use cfb_schemas::Category;
use tracing::{info, warn};

use crate::{merge, reconcile, EventSink, MergePolicy, ReconcileError, ReconcileResult, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Reconciled(ReconcileResult),
    /// Nothing came back from any provider; stored state was left alone.
    Skipped,
}

#[derive(Debug)]
pub struct SyncReport {
    pub category: Category,
    /// Built records before merge, across all providers.
    pub fetched: usize,
    /// Distinct ids after merge.
    pub merged: usize,
    /// Raw records dropped by boundary validation.
    pub rejected: usize,
    pub provider_failures: Vec<ProviderFailure>,
    pub outcome: SyncOutcome,
}

/// Run one sync for `category`.
///
/// An empty merged set skips reconciliation entirely, so an outage of every
/// provider never wipes the stored table.
pub async fn sync_category(
    category: Category,
    providers: &[Box<dyn Provider>],
    policy: &MergePolicy,
    store: &dyn Store,
    sink: &dyn EventSink,
) -> Result<SyncReport, ReconcileError> {
    let fetched = fetch_all(providers, category).await;
    let fetched_count = fetched.records.len();

    let merged = merge(fetched.records, policy);
    let merged_count = merged.len();

    info!(
        %category,
        fetched = fetched_count,
        merged = merged_count,
        rejected = fetched.rejected,
        provider_failures = fetched.failures.len(),
        "merged provider records"
    );

    let outcome = if merged.is_empty() {
        warn!(%category, "no data fetched from any source; skipping reconcile");
        SyncOutcome::Skipped
    } else {
        SyncOutcome::Reconciled(reconcile(category, merged, store, sink).await?)
    };

    Ok(SyncReport {
        category,
        fetched: fetched_count,
        merged: merged_count,
        rejected: fetched.rejected,
        provider_failures: fetched.failures,
        outcome,
    })
}
