//! Removal of unwanted file types from freshly extracted content

use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Files removed and files that could not be removed by [`purge_extensions`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Files deleted
    pub removed: usize,
    /// Files that matched but could not be deleted
    pub failed: usize,
}

/// Delete every file under `root` whose extension is in `extensions`
///
/// Extensions are compared case-insensitively, without their leading dot.
/// Failures are logged and counted; they never abort the walk.
pub fn purge_extensions(root: &Path, extensions: &[String]) -> PurgeSummary {
    let mut summary = PurgeSummary::default();
    if extensions.is_empty() {
        return summary;
    }

    let wanted: Vec<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension() else {
            continue;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        if !wanted.contains(&ext) {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!(path = ?entry.path(), "deleted purged file type");
                summary.removed += 1;
            }
            Err(e) => {
                warn!(path = ?entry.path(), error = %e, "failed to delete purged file type");
                summary.failed += 1;
            }
        }
    }

    if summary.removed > 0 {
        info!(
            ?root,
            removed = summary.removed,
            failed = summary.failed,
            "purged unwanted file types from extracted content"
        );
    }
    summary
}
