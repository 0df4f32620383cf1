//! Batch entry points over whole directory trees
//!
//! - [`process_existing_archives`] extracts archives that were already on
//!   disk before the pipeline started (they do not consume retry budget)
//! - [`clear_failed_marks`] removes every permanent-failure marker so that
//!   abandoned archives become eligible again

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::extraction::ArchiveExtractor;
use crate::hashing::sha256_file;
use crate::types::{ArchiveOrigin, ArchiveTask, ExtractionReport};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Counts from one [`process_existing_archives`] run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Archives found under the directory
    pub found: usize,
    /// Archives extracted successfully
    pub extracted: usize,
    /// Archives that failed to extract
    pub failed: usize,
    /// Archives that could not be hashed and were left alone
    pub unreadable: usize,
}

/// Files under `dir` whose extension is in `extensions` (case-insensitive)
pub fn find_archives(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let wanted: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| wanted.contains(&ext.to_string_lossy().to_lowercase()))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Extract every archive already present under `dir`
///
/// Archives are hashed and handed to `extractor` as sweep tasks, one at a
/// time. Failed archives are deleted by the retry policy (encrypted ones are
/// kept); no counters or markers are written.
pub async fn process_existing_archives(
    extractor: &ArchiveExtractor,
    dir: &Path,
) -> Result<SweepSummary> {
    info!(?dir, "checking for existing archives");

    let root = dir.to_path_buf();
    let extensions = extractor.config().archive_extensions.clone();
    let archives = spawn_blocking(move || find_archives(&root, &extensions))
        .await
        .map_err(|e| Error::Other(format!("archive scan did not complete: {}", e)))?;

    let mut summary = SweepSummary {
        found: archives.len(),
        ..Default::default()
    };

    for archive in archives {
        let hash = match sha256_file(&archive).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(?archive, error = %e, "failed to hash archive, skipping");
                summary.unreadable += 1;
                continue;
            }
        };

        let task = ArchiveTask::new(&archive, hash, ArchiveOrigin::Sweep);
        match extractor.extract(&task).await {
            ExtractionReport::Extracted { .. } => summary.extracted += 1,
            ExtractionReport::Missing => {
                debug!(?archive, "archive disappeared before extraction");
            }
            ExtractionReport::Skipped | ExtractionReport::Failed { .. } => summary.failed += 1,
        }
    }

    info!(
        ?dir,
        found = summary.found,
        extracted = summary.extracted,
        failed = summary.failed,
        "finished processing existing archives"
    );
    Ok(summary)
}

/// Remove every permanent-failure marker under `dir`
///
/// Returns the number of markers removed. Markers that cannot be deleted are
/// logged and skipped.
pub async fn clear_failed_marks(dir: &Path, config: &RetryConfig) -> Result<usize> {
    info!(?dir, "clearing permanent-failure markers");

    let root = dir.to_path_buf();
    let suffix = format!(".{}", config.marker_suffix);
    let count = spawn_blocking(move || {
        let mut count = 0;
        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file()
                || !entry.file_name().to_string_lossy().ends_with(&suffix)
            {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => count += 1,
                Err(e) => warn!(path = ?entry.path(), error = %e, "failed to remove marker"),
            }
        }
        count
    })
    .await
    .map_err(|e| Error::Other(format!("marker scan did not complete: {}", e)))?;

    if count > 0 {
        info!(?dir, count, "cleared {} permanent-failure marker(s)", count);
    }
    Ok(count)
}
