//! Small file-backed state shared by the ledger and the retry policy
//!
//! Every persistent value this crate owns is a single file next to the
//! archive it describes. [`StateFile`] gives those files one read/write
//! contract:
//!
//! - reads are tolerant: a missing file is `None`, and JSON reads fall back to
//!   an empty value when the file is damaged
//! - writes go to a temporary sibling that is synced and then renamed over the
//!   target, so readers see either the old or the new contents
//! - removal of a missing file is not an error

use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// A single state file on disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Wrap a path; nothing is touched on disk
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file currently exists (I/O errors count as absent)
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Read the file as UTF-8 text; `Ok(None)` if it does not exist
    pub async fn read_string(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the file as JSON, returning `T::default()` when it is missing,
    /// unreadable or not valid JSON for `T`
    pub async fn read_json_or_default<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        let contents = match self.read_string().await {
            Ok(Some(contents)) => contents,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "state file unreadable, treating as empty");
                return T::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "state file is not valid JSON, treating as empty");
                T::default()
            }
        }
    }

    /// Replace the file contents atomically
    pub async fn write_atomic(&self, contents: &[u8]) -> Result<()> {
        let tmp = self.temp_path();

        let write = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(contents).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        };

        if let Err(e) = write.await {
            // Leave the previous contents in place and drop the partial write
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(path = ?self.path, bytes = contents.len(), "state file written");
        Ok(())
    }

    /// Serialize `value` as indented JSON and write it atomically
    ///
    /// Non-ASCII text is written verbatim, not as `\u` escapes.
    pub async fn write_json_pretty<T: Serialize>(&self, value: &T) -> Result<()> {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        self.write_atomic(json.as_bytes()).await
    }

    /// Delete the file; returns whether it existed
    pub async fn remove(&self) -> Result<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}
