//! Persistent record of completed extractions
//!
//! One ledger file lives in each directory that received extracted content.
//! It is a pretty-printed JSON object mapping the archive's content hash to
//! the logical name it was extracted under:
//!
//! ```json
//! {
//!   "9f86d08...": "report"
//! }
//! ```
//!
//! A missing or damaged ledger never fails an extraction; it is read as
//! empty and rewritten on the next record.

use crate::error::Result;
use crate::store::StateFile;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Hash-indexed extraction ledger backed by a single JSON file
#[derive(Clone, Debug)]
pub struct ExtractionLedger {
    file: StateFile,
}

impl ExtractionLedger {
    /// Ledger stored at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: StateFile::new(path),
        }
    }

    /// Ledger stored as `file_name` inside `dir`
    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        Self::new(dir.join(file_name))
    }

    /// Location of the ledger file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// All entries, empty if the file is missing or unreadable
    pub async fn entries(&self) -> BTreeMap<String, String> {
        self.file.read_json_or_default().await
    }

    /// Logical name recorded for `content_hash`, if any
    pub async fn lookup(&self, content_hash: &str) -> Option<String> {
        self.entries().await.remove(content_hash)
    }

    /// Set or overwrite the entry for `content_hash`
    ///
    /// Read-merge-write; concurrent writers to the same ledger must be
    /// serialized by the caller.
    pub async fn record(&self, content_hash: &str, logical_name: &str) -> Result<()> {
        let mut entries = self.entries().await;
        let previous = entries.insert(content_hash.to_string(), logical_name.to_string());
        self.file.write_json_pretty(&entries).await?;

        debug!(
            ledger = ?self.file.path(),
            content_hash,
            logical_name,
            replaced = previous.is_some(),
            "recorded extraction in ledger"
        );
        Ok(())
    }
}
