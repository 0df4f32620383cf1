//! Core types for archive-autoextract

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Archive format supported by the built-in extractors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// ZIP archive (.zip)
    Zip,
    /// RAR archive (.rar)
    Rar,
    /// 7-Zip archive (.7z)
    #[serde(rename = "7z")]
    SevenZip,
}

impl ArchiveFormat {
    /// Fixed fallback order used when probing
    pub const ALL: [ArchiveFormat; 3] = [ArchiveFormat::Zip, ArchiveFormat::Rar, ArchiveFormat::SevenZip];

    /// Canonical file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Rar => "rar",
            ArchiveFormat::SevenZip => "7z",
        }
    }

    /// Map a file extension (without dot, any case) to a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "zip" => Some(ArchiveFormat::Zip),
            "rar" => Some(ArchiveFormat::Rar),
            "7z" => Some(ArchiveFormat::SevenZip),
            _ => None,
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveFormat::Zip => "ZIP",
            ArchiveFormat::Rar => "RAR",
            ArchiveFormat::SevenZip => "7z",
        };
        f.write_str(name)
    }
}

/// Where an archive came from
///
/// Only fresh downloads consume retry budget; archives found while sweeping
/// a directory have no download step that could be repeated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveOrigin {
    /// Just fetched by the download pipeline
    FreshDownload,
    /// Found during a sweep of pre-existing files
    Sweep,
}

impl ArchiveOrigin {
    /// Build from the pipeline's "is this a fresh download" flag
    pub fn from_fresh_flag(is_fresh_download: bool) -> Self {
        if is_fresh_download {
            ArchiveOrigin::FreshDownload
        } else {
            ArchiveOrigin::Sweep
        }
    }

    /// True for [`ArchiveOrigin::FreshDownload`]
    pub fn is_fresh_download(self) -> bool {
        matches!(self, ArchiveOrigin::FreshDownload)
    }
}

/// One archive to extract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveTask {
    /// Absolute path to the archive
    pub archive_path: PathBuf,
    /// Full-file content digest, used as the ledger key
    pub content_hash: String,
    /// Fresh download or sweep
    pub origin: ArchiveOrigin,
}

impl ArchiveTask {
    /// Create a task; relative paths are resolved against the current directory
    pub fn new(
        archive_path: impl AsRef<Path>,
        content_hash: impl Into<String>,
        origin: ArchiveOrigin,
    ) -> Self {
        let archive_path = archive_path.as_ref();
        let archive_path = if archive_path.is_absolute() {
            archive_path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(archive_path))
                .unwrap_or_else(|_| archive_path.to_path_buf())
        };
        Self {
            archive_path,
            content_hash: content_hash.into(),
            origin,
        }
    }

    /// Declared extension, lowercased and without the dot
    pub fn declared_extension(&self) -> Option<String> {
        self.archive_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Archive file stem with surrounding whitespace trimmed
    ///
    /// This is the archive's identity for the ledger, the retry counter and
    /// the failure marker.
    pub fn base_name(&self) -> String {
        self.archive_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().trim().to_string())
            .unwrap_or_default()
    }

    /// Directory holding the archive
    pub fn parent_dir(&self) -> PathBuf {
        self.archive_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Directory the archive is extracted into: sibling named after the stem
    pub fn destination_dir(&self) -> PathBuf {
        self.parent_dir().join(self.base_name())
    }

    /// Archive file name for log messages
    pub fn display_name(&self) -> String {
        self.archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.archive_path.display().to_string())
    }
}

/// Result of running the format-fallback loop once
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// An extractor accepted the archive
    Success {
        /// Directory the content was written to
        destination_dir: PathBuf,
    },
    /// A format reported password protection; other formats were not tried
    Encrypted,
    /// Every candidate format failed
    UnsupportedOrCorrupt {
        /// Message of the last recorded failure
        last_error: String,
    },
}

impl ExtractionOutcome {
    /// True for [`ExtractionOutcome::Encrypted`]
    pub fn is_encrypted(&self) -> bool {
        matches!(self, ExtractionOutcome::Encrypted)
    }
}

/// What the retry policy did with a failed archive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sweep failure: the archive was deleted, nothing to retry
    Discarded,
    /// Sweep failure on an encrypted archive: the file is kept as is
    Retained,
    /// Fresh-download failure under the threshold; the caller should fetch again
    RetryScheduled {
        /// Failure count after this attempt
        attempt: u32,
        /// Whether the archive file was deleted (false for encrypted archives)
        archive_removed: bool,
    },
    /// Threshold reached; a permanent-failure marker now exists
    PermanentlyFailed {
        /// Failure count that tripped the threshold
        attempts: u32,
    },
}

impl RetryDecision {
    /// True when the caller is expected to re-download the archive
    pub fn should_refetch(&self) -> bool {
        matches!(
            self,
            RetryDecision::RetryScheduled {
                archive_removed: true,
                ..
            }
        )
    }
}

/// Terminal state of one extraction invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractionReport {
    /// Archive extracted, recorded in the ledger and removed
    Extracted {
        /// Directory holding the extracted content
        destination: PathBuf,
        /// Number of files written by the extractor
        files: usize,
    },
    /// A permanent-failure marker exists; nothing was attempted
    Skipped,
    /// The archive path does not exist; nothing was touched
    Missing,
    /// Extraction failed and the retry policy handled it
    Failed {
        /// Why the format loop ended
        outcome: ExtractionOutcome,
        /// What the retry policy decided
        decision: RetryDecision,
    },
}

impl ExtractionReport {
    /// Boolean contract expected by download pipelines
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionReport::Extracted { .. })
    }

    /// Outcome of the format loop, if it ran
    pub fn outcome(&self) -> Option<ExtractionOutcome> {
        match self {
            ExtractionReport::Extracted { destination, .. } => Some(ExtractionOutcome::Success {
                destination_dir: destination.clone(),
            }),
            ExtractionReport::Failed { outcome, .. } => Some(outcome.clone()),
            ExtractionReport::Skipped | ExtractionReport::Missing => None,
        }
    }
}
