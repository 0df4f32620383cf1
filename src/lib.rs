//! # archive-autoextract
//!
//! Resilient auto-extraction for downloaded archives.
//!
//! Downloaded archives often carry the wrong extension, arrive truncated or
//! turn out to be password protected. This crate takes one such file and:
//!
//! - tries the declared format first and every other supported format
//!   (ZIP, RAR, 7z) after it
//! - records the content hash of every extracted archive in a per-directory
//!   ledger and deletes the original
//! - keeps a small on-disk retry counter for failed fresh downloads and gives
//!   up for good, with a marker file, after three attempts
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI, purely a Rust crate for download pipelines
//! - **Idempotent** - Every piece of state is a file next to the archive, so
//!   repeated runs pick up where the last one stopped
//! - **Never fatal on bookkeeping** - A damaged ledger or an unwritable marker
//!   is logged, not propagated
//!
//! ## Quick Start
//!
//! ```no_run
//! use archive_autoextract::{ArchiveExtractor, ArchiveOrigin, ArchiveTask, Config};
//! use archive_autoextract::hashing::sha256_file;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = ArchiveExtractor::new(&Config::default());
//!
//!     let archive = Path::new("/downloads/post/album.zip");
//!     let hash = sha256_file(archive).await?;
//!     let task = ArchiveTask::new(archive, hash, ArchiveOrigin::FreshDownload);
//!
//!     let report = extractor.extract(&task).await;
//!     println!("{:?}", report);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive extraction with format fallback
pub mod extraction;
/// Content digests
pub mod hashing;
/// Hash-indexed extraction ledger
pub mod ledger;
/// Output path sanitization
pub mod naming;
/// Retry counters and permanent-failure markers
pub mod retry;
/// File-backed state primitives
pub mod store;
/// Directory-wide sweeps
pub mod sweep;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, ExtractionConfig, NamingConfig, RetryConfig};
pub use error::{Error, ExtractionError, FailureKind, FormatFailure, Result};
pub use extraction::{ArchiveExtractor, FormatExtractor, extract_archive};
pub use ledger::ExtractionLedger;
pub use naming::generate_file_path;
pub use retry::RetryPolicy;
pub use sweep::{SweepSummary, clear_failed_marks, process_existing_archives};
pub use types::{
    ArchiveFormat, ArchiveOrigin, ArchiveTask, ExtractionOutcome, ExtractionReport, RetryDecision,
};
