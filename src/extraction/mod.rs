//! Archive extraction with format fallback
//!
//! This module extracts ZIP, RAR and 7z archives whose extension cannot be
//! trusted. The declared format is tried first, then every other supported
//! format; the first extractor that accepts the file wins. Each extractor
//! classifies its failures ([`FailureKind`]) so the engine knows whether to
//! move on (mismatch, corruption) or stop (encryption).
//!
//! After a successful extraction the content hash is recorded in the
//! directory's ledger and the archive is deleted. Failures are handed to the
//! [`RetryPolicy`], which decides between a re-download and giving up.

mod probe;
mod purge;
mod rar;
mod sevenz;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

// Re-exports
pub use probe::{candidate_formats, candidate_formats_for};
pub use purge::{PurgeSummary, purge_extensions};
pub use rar::RarExtractor;
pub use sevenz::SevenZipExtractor;
pub use zip::ZipExtractor;

use crate::config::{Config, ExtractionConfig};
use crate::error::{Error, ExtractionError, FailureKind, FormatFailure, Result};
use crate::ledger::ExtractionLedger;
use crate::retry::RetryPolicy;
use crate::types::{ArchiveFormat, ArchiveOrigin, ArchiveTask, ExtractionOutcome, ExtractionReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, warn};

/// A decompression capability for one archive format
///
/// Implementations run on a blocking thread. They must report failures with
/// a [`FailureKind`] that tells the engine whether another format is worth
/// trying.
pub trait FormatExtractor: Send + Sync {
    /// Format handled by this extractor
    fn format(&self) -> ArchiveFormat;

    /// Extract `archive_path` into `dest_path`, returning the files written
    fn extract(&self, archive_path: &Path, dest_path: &Path)
    -> std::result::Result<Vec<PathBuf>, FormatFailure>;
}

/// Format-probing extraction engine
///
/// # Example
/// ```no_run
/// use archive_autoextract::{ArchiveExtractor, ArchiveOrigin, ArchiveTask, Config};
/// use archive_autoextract::hashing::sha256_file;
/// use std::path::Path;
///
/// # async fn example() -> archive_autoextract::Result<()> {
/// let extractor = ArchiveExtractor::new(&Config::default());
/// let path = Path::new("/downloads/album.zip");
/// let hash = sha256_file(path).await?;
///
/// let report = extractor
///     .extract(&ArchiveTask::new(path, hash, ArchiveOrigin::FreshDownload))
///     .await;
/// println!("extracted: {}", report.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ArchiveExtractor {
    config: ExtractionConfig,
    retry: RetryPolicy,
    extractors: Vec<Arc<dyn FormatExtractor>>,
}

impl std::fmt::Debug for ArchiveExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveExtractor")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .field(
                "formats",
                &self.extractors.iter().map(|e| e.format()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ArchiveExtractor {
    /// Engine with the built-in ZIP, RAR and 7z extractors
    pub fn new(config: &Config) -> Self {
        let extractors: Vec<Arc<dyn FormatExtractor>> = vec![
            Arc::new(ZipExtractor::new(config.extraction.fallback_encoding())),
            Arc::new(RarExtractor),
            Arc::new(SevenZipExtractor),
        ];
        Self::with_extractors(config, extractors)
    }

    /// Engine with caller-supplied extractors
    ///
    /// Formats without an extractor are skipped while probing.
    pub fn with_extractors(config: &Config, extractors: Vec<Arc<dyn FormatExtractor>>) -> Self {
        Self {
            config: config.extraction.clone(),
            retry: RetryPolicy::new(config.retry.clone()),
            extractors,
        }
    }

    /// Extraction settings in use
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Retry policy in use
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Ledger that records extractions of archives in `dir`
    pub fn ledger_for(&self, dir: &Path) -> ExtractionLedger {
        ExtractionLedger::in_dir(dir, &self.config.ledger_file_name)
    }

    fn extractor_for(&self, format: ArchiveFormat) -> Option<&Arc<dyn FormatExtractor>> {
        self.extractors.iter().find(|e| e.format() == format)
    }

    /// Extract `task`, purging the configured file types afterwards
    pub async fn extract(&self, task: &ArchiveTask) -> ExtractionReport {
        self.extract_with_purge(task, &self.config.purge_extensions)
            .await
    }

    /// Extract `task`, purging the file types in `purge` from the extracted tree
    ///
    /// # Behavior
    /// 1. A missing archive yields [`ExtractionReport::Missing`] and touches nothing
    /// 2. A fresh download with a permanent-failure marker yields
    ///    [`ExtractionReport::Skipped`]
    /// 3. Candidate formats are tried into `<dir>/<stem>`
    /// 4. On success the ledger is updated, the archive deleted, the retry
    ///    counter cleared and unwanted file types purged
    /// 5. On failure the retry policy runs and an empty destination is removed
    pub async fn extract_with_purge(
        &self,
        task: &ArchiveTask,
        purge: &[String],
    ) -> ExtractionReport {
        let archive_name = task.display_name();

        if !tokio::fs::try_exists(&task.archive_path)
            .await
            .unwrap_or(false)
        {
            warn!(archive = ?task.archive_path, "archive not found, nothing to extract");
            return ExtractionReport::Missing;
        }

        if task.origin.is_fresh_download() && self.retry.is_permanently_failed(task).await {
            info!(
                archive = %archive_name,
                "skipping archive previously marked as permanently failed"
            );
            return ExtractionReport::Skipped;
        }

        let dest = task.destination_dir();
        match self.extract_to(&task.archive_path, &dest).await {
            Ok(files) => self.finish_success(task, dest, files.len(), purge).await,
            Err(e) => {
                let outcome = match &e {
                    Error::Extraction(inner) if inner.is_encrypted() => {
                        warn!(archive = %archive_name, "skipping encrypted archive");
                        ExtractionOutcome::Encrypted
                    }
                    other => {
                        error!(archive = %archive_name, error = %other, "extraction failed");
                        ExtractionOutcome::UnsupportedOrCorrupt {
                            last_error: other.to_string(),
                        }
                    }
                };

                let decision = self.retry.on_failure(task, &outcome).await;
                remove_dir_if_empty(&dest).await;

                ExtractionReport::Failed { outcome, decision }
            }
        }
    }

    /// Run the format-fallback loop for `archive_path` into `dest_path`
    ///
    /// No ledger, retry or cleanup side effects; `dest_path` is created if
    /// missing and left as is on failure.
    ///
    /// # Errors
    /// * [`ExtractionError::Encrypted`] as soon as a format reports encryption
    /// * [`ExtractionError::Format`] with the last failure once all formats failed
    /// * [`ExtractionError::NoSupportedFormat`] if no extractor was available
    /// * [`Error::Io`] if `dest_path` cannot be created
    pub async fn extract_to(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dest_path).await?;

        let mut last_failure: Option<FormatFailure> = None;

        for format in candidate_formats_for(archive_path) {
            let Some(extractor) = self.extractor_for(format) else {
                debug!(%format, "no extractor registered, skipping format");
                continue;
            };

            info!(?archive_path, %format, "trying to extract as {}", format);

            let extractor = Arc::clone(extractor);
            let archive_owned = archive_path.to_path_buf();
            let dest_owned = dest_path.to_path_buf();
            let result = spawn_blocking(move || extractor.extract(&archive_owned, &dest_owned))
                .await
                .unwrap_or_else(|e| {
                    Err(FormatFailure::other(
                        format,
                        format!("extraction task did not complete: {}", e),
                    ))
                });

            match result {
                Ok(files) => {
                    info!(
                        ?archive_path,
                        %format,
                        extracted_count = files.len(),
                        "extracted as {}",
                        format
                    );
                    return Ok(files);
                }
                Err(failure) if failure.kind == FailureKind::Encrypted => {
                    return Err(ExtractionError::Encrypted {
                        archive: archive_path.to_path_buf(),
                        reason: failure.reason,
                    }
                    .into());
                }
                Err(failure) => {
                    debug!(
                        ?archive_path,
                        %format,
                        kind = ?failure.kind,
                        reason = %failure.reason,
                        "format rejected archive, trying next"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        Err(match last_failure {
            Some(failure) => ExtractionError::Format(failure),
            None => ExtractionError::NoSupportedFormat {
                archive: archive_path.to_path_buf(),
            },
        }
        .into())
    }

    async fn finish_success(
        &self,
        task: &ArchiveTask,
        dest: PathBuf,
        files: usize,
        purge: &[String],
    ) -> ExtractionReport {
        let base_name = task.base_name();

        let ledger = self.ledger_for(&task.parent_dir());
        if let Err(e) = ledger.record(&task.content_hash, &base_name).await {
            warn!(ledger = ?ledger.path(), error = %e, "failed to update extraction ledger");
        }
        if task.origin == ArchiveOrigin::Sweep {
            debug!(content_hash = %task.content_hash, %base_name, "recorded hash of local archive");
        }

        match tokio::fs::remove_file(&task.archive_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(archive = ?task.archive_path, error = %e, "failed to delete archive"),
        }

        self.retry.clear(task).await;

        let mut purged = PurgeSummary::default();
        if !purge.is_empty() {
            let root = dest.clone();
            let extensions = purge.to_vec();
            match spawn_blocking(move || purge_extensions(&root, &extensions)).await {
                Ok(summary) => purged = summary,
                Err(e) => warn!(error = %e, "purge task did not complete"),
            }
        }

        info!(
            archive = %task.display_name(),
            destination = ?dest,
            files,
            purged = purged.removed,
            purge_failed = purged.failed,
            "extracted archive and deleted original"
        );

        ExtractionReport::Extracted {
            destination: dest,
            files,
        }
    }
}

/// Remove `dir` if it exists and has no entries
async fn remove_dir_if_empty(dir: &Path) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    if matches!(entries.next_entry().await, Ok(None)) {
        match tokio::fs::remove_dir(dir).await {
            Ok(()) => debug!(?dir, "removed empty extraction directory"),
            Err(e) => debug!(?dir, error = %e, "failed to remove empty extraction directory"),
        }
    }
}

/// Extract one archive with default settings
///
/// Convenience wrapper for download pipelines that only need a yes/no
/// answer; persistent markers carry the rest of the state.
///
/// # Arguments
/// * `archive_path` - Archive to extract
/// * `content_hash` - Full-file digest recorded in the ledger
/// * `purge_extensions` - File types to delete from the extracted tree
/// * `is_fresh_download` - `false` for archives found by a directory sweep
pub async fn extract_archive(
    archive_path: &Path,
    content_hash: &str,
    purge_extensions: &[String],
    is_fresh_download: bool,
) -> bool {
    let extractor = ArchiveExtractor::new(&Config::default());
    let task = ArchiveTask::new(
        archive_path,
        content_hash,
        ArchiveOrigin::from_fresh_flag(is_fresh_download),
    );
    extractor
        .extract_with_purge(&task, purge_extensions)
        .await
        .is_success()
}
