//! Snapshot-file provider.
//!
//! Reads `<dir>/recruits.json` or `<dir>/portal.json`, each a JSON array in
//! the shape accepted by [`decode_records`]. Scrapers drop these files; the
//! sync run picks them up.

use std::path::{Path, PathBuf};

use cfb_schemas::{Category, RawRecord};

use crate::provider::{decode_records, Provider, ProviderError};

#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    tag: String,
    dir: PathBuf,
}

impl SnapshotProvider {
    pub fn new(tag: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        Self {
            tag: tag.into(),
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{}.json", category.as_str()))
    }
}

#[async_trait::async_trait]
impl Provider for SnapshotProvider {
    fn tag(&self) -> &str {
        &self.tag
    }

    async fn fetch(&self, category: Category) -> Result<Vec<RawRecord>, ProviderError> {
        let path = self.path_for(category);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ProviderError::Io(format!("read {}: {e}", path.display())))?;

        // Windows editors like to prepend a UTF-8 BOM.
        let bytes = bytes
            .strip_prefix(&[0xEF, 0xBB, 0xBF])
            .unwrap_or(&bytes);

        decode_records(category, bytes)
    }
}
