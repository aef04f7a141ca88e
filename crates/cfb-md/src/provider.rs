//! Provider boundary for player ingest.
//!
//! This module defines only the provider trait, its error type and the shared
//! JSON payload decoder. Scraping mechanics live outside this workspace; the
//! providers here read data that a scraper already produced.

use std::fmt;

use cfb_schemas::{Category, RawPortal, RawRecord, RawRecruit};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that a [`Provider`] implementation may return.
#[derive(Debug)]
pub enum ProviderError {
    /// Local file could not be read.
    Io(String),
    /// Network or transport failure.
    Transport(String),
    /// The upstream returned a non-success HTTP status.
    Api { status: u16, message: String },
    /// A payload could not be decoded.
    Decode(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Io(msg) => write!(f, "io error: {msg}"),
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::Api { status, message } => {
                write!(f, "provider api error status={status}: {message}")
            }
            ProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Upstream player-data provider contract.
///
/// Object-safe so callers can hold `Box<dyn Provider>` per configured source.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Source tag recorded on every record this provider contributes (e.g. `"247"`).
    fn tag(&self) -> &str;

    /// Fetch every raw record the provider currently reports for `category`.
    async fn fetch(&self, category: Category) -> Result<Vec<RawRecord>, ProviderError>;
}

// ---------------------------------------------------------------------------
// Payload decoding
// ---------------------------------------------------------------------------

/// Decode a JSON array of category-shaped objects into tagged raw records.
///
/// The payload carries no `kind` field; the requested category decides the shape.
pub fn decode_records(category: Category, bytes: &[u8]) -> Result<Vec<RawRecord>, ProviderError> {
    let decoded = match category {
        Category::Recruits => serde_json::from_slice::<Vec<RawRecruit>>(bytes)
            .map(|v| v.into_iter().map(RawRecord::Recruit).collect()),
        Category::Portal => serde_json::from_slice::<Vec<RawPortal>>(bytes)
            .map(|v| v.into_iter().map(RawRecord::Portal).collect()),
    };
    decoded.map_err(|e| ProviderError::Decode(format!("{category} payload: {e}")))
}
