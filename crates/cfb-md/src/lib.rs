//! cfb-md
//!
//! Provider ingest: the provider abstraction, the record builder that maps raw
//! provider output onto [`CanonicalRecord`], and the concrete providers that
//! read already-scraped data.
//!
//! This crate does **not** merge or persist; callers hand the built records
//! to `cfb-reconcile`.

pub mod builder;
pub mod http;
pub mod provider;
pub mod snapshot;

use cfb_schemas::{CanonicalRecord, Category};
use tracing::{info, warn};

pub use builder::build_record;
pub use http::HttpJsonProvider;
pub use provider::{decode_records, Provider, ProviderError};
pub use snapshot::SnapshotProvider;

/// One provider that failed during a fetch round.
#[derive(Debug)]
pub struct ProviderFailure {
    pub tag: String,
    pub error: ProviderError,
}

/// Result of asking every configured provider for one category.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Built records in provider order, then provider-reported order.
    pub records: Vec<CanonicalRecord>,
    pub failures: Vec<ProviderFailure>,
    /// Raw records dropped by boundary validation.
    pub rejected: usize,
}

/// Fetch `category` from each provider in turn and build canonical records.
///
/// A failing provider contributes zero records; the others still run.
pub async fn fetch_all(providers: &[Box<dyn Provider>], category: Category) -> FetchOutcome {
    let mut out = FetchOutcome::default();

    for provider in providers {
        let tag = provider.tag();
        match provider.fetch(category).await {
            Ok(raws) => {
                let total = raws.len();
                let mut kept = 0usize;
                for raw in raws {
                    if let Err(e) = raw.validate(category) {
                        warn!(provider = tag, %category, error = %e, "dropping invalid raw record");
                        out.rejected += 1;
                        continue;
                    }
                    out.records.push(build_record(&raw, tag));
                    kept += 1;
                }
                info!(provider = tag, %category, total, kept, "fetched provider records");
            }
            Err(error) => {
                warn!(provider = tag, %category, %error, "provider fetch failed; treating as empty");
                out.failures.push(ProviderFailure {
                    tag: tag.to_string(),
                    error,
                });
            }
        }
    }

    out
}
