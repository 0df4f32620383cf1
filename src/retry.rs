//! Retry bookkeeping for archives that fail to extract
//!
//! A failed fresh download is usually worth fetching again: the file may have
//! been truncated or mangled in transit. Retrying forever is not, so each
//! archive gets a small on-disk counter next to it:
//!
//! - `<name>.retry_count` holds the number of failed fresh-download attempts
//! - `<name>.extract_failed` is written once the counter reaches the limit;
//!   while it exists, fresh downloads of `<name>` are skipped outright
//!
//! Counter and marker never coexist: writing the marker removes the counter.
//! Archives found by a directory sweep have no download to repeat and never
//! touch either file.
//!
//! All counter and marker I/O is best-effort. If the files cannot be written
//! the policy degrades to "always retry, never give up" instead of failing
//! the pipeline.

use crate::config::RetryConfig;
use crate::store::StateFile;
use crate::types::{ArchiveTask, ExtractionOutcome, RetryDecision};
use chrono::Local;
use tracing::{debug, error, info, warn};

/// Per-archive retry counter and permanent-failure marker
#[derive(Clone, Debug, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy from configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// The `<name>.retry_count` file for `task`
    pub fn counter_file(&self, task: &ArchiveTask) -> StateFile {
        StateFile::new(
            task.parent_dir()
                .join(format!("{}.{}", task.base_name(), self.config.counter_suffix)),
        )
    }

    /// The `<name>.extract_failed` file for `task`
    pub fn marker_file(&self, task: &ArchiveTask) -> StateFile {
        StateFile::new(
            task.parent_dir()
                .join(format!("{}.{}", task.base_name(), self.config.marker_suffix)),
        )
    }

    /// Whether `task` has been given up on
    pub async fn is_permanently_failed(&self, task: &ArchiveTask) -> bool {
        self.marker_file(task).exists().await
    }

    /// Failed fresh-download attempts so far (0 if absent or unreadable)
    pub async fn attempts(&self, task: &ArchiveTask) -> u32 {
        match self.counter_file(task).read_string().await {
            Ok(Some(text)) => text.trim().parse().unwrap_or_else(|_| {
                warn!(
                    archive = %task.display_name(),
                    contents = %text.trim(),
                    "retry counter is not a number, starting over"
                );
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(archive = %task.display_name(), error = %e, "failed to read retry counter");
                0
            }
        }
    }

    /// Forget previous failures after a successful extraction
    pub async fn clear(&self, task: &ArchiveTask) {
        match self.counter_file(task).remove().await {
            Ok(true) => debug!(archive = %task.display_name(), "cleared retry counter"),
            Ok(false) => {}
            Err(e) => {
                warn!(archive = %task.display_name(), error = %e, "failed to remove retry counter")
            }
        }
    }

    /// Decide what happens to an archive whose extraction failed
    ///
    /// # Behavior
    /// * Sweep: the archive is deleted ([`RetryDecision::Discarded`]), except
    ///   encrypted archives, which are kept ([`RetryDecision::Retained`])
    /// * Fresh download below the limit: the counter is bumped and the archive
    ///   deleted so the caller re-fetches it. Encrypted archives stay on disk,
    ///   since fetching them again cannot help, but they still use up attempts
    ///   instead of being marked immediately.
    /// * Fresh download reaching the limit: the marker is written and the
    ///   counter removed
    pub async fn on_failure(
        &self,
        task: &ArchiveTask,
        outcome: &ExtractionOutcome,
    ) -> RetryDecision {
        let encrypted = outcome.is_encrypted();

        if !task.origin.is_fresh_download() {
            if encrypted {
                info!(
                    archive = %task.display_name(),
                    "local archive is encrypted, leaving it in place"
                );
                return RetryDecision::Retained;
            }
            remove_archive(task).await;
            info!(
                archive = %task.display_name(),
                "local archive failed to extract and was deleted"
            );
            return RetryDecision::Discarded;
        }

        let attempt = self.attempts(task).await.saturating_add(1);

        if attempt >= self.config.max_attempts {
            let marker = self.marker_file(task);
            let payload = format!(
                "Failed at {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
                describe(outcome)
            );
            match marker.write_atomic(payload.as_bytes()).await {
                Ok(()) => {
                    self.clear(task).await;
                    error!(
                        archive = %task.display_name(),
                        attempts = attempt,
                        "archive failed to extract after {} download attempts, marked as permanently skipped",
                        attempt
                    );
                    return RetryDecision::PermanentlyFailed { attempts: attempt };
                }
                Err(e) => {
                    warn!(
                        archive = %task.display_name(),
                        error = %e,
                        "failed to write permanent-failure marker, archive stays eligible for retry"
                    );
                }
            }
        }

        if let Err(e) = self
            .counter_file(task)
            .write_atomic(attempt.to_string().as_bytes())
            .await
        {
            warn!(archive = %task.display_name(), error = %e, "failed to persist retry counter");
        }

        let archive_removed = if encrypted {
            false
        } else {
            remove_archive(task).await
        };

        warn!(
            archive = %task.display_name(),
            attempt,
            archive_removed,
            "download attempt {} failed to extract, scheduling retry",
            attempt
        );
        RetryDecision::RetryScheduled {
            attempt,
            archive_removed,
        }
    }
}

fn describe(outcome: &ExtractionOutcome) -> String {
    match outcome {
        ExtractionOutcome::Encrypted => "archive is encrypted".to_string(),
        ExtractionOutcome::UnsupportedOrCorrupt { last_error } => last_error.clone(),
        ExtractionOutcome::Success { destination_dir } => {
            format!("extracted to {}", destination_dir.display())
        }
    }
}

/// Delete the archive; returns true if it is gone afterwards
async fn remove_archive(task: &ArchiveTask) -> bool {
    match tokio::fs::remove_file(&task.archive_path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(archive = ?task.archive_path, error = %e, "failed to delete archive");
            false
        }
    }
}
