//! Error types for archive-autoextract
//!
//! This module provides the error taxonomy for the crate:
//! - Path construction errors (missing template keys)
//! - Per-format extraction failures, classified by [`FailureKind`]
//! - Whole-attempt extraction errors (all formats exhausted, encryption detected)
//! - I/O and serialization errors from the persistent state files

use crate::types::ArchiveFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for archive-autoextract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for archive-autoextract
#[derive(Debug, Error)]
pub enum Error {
    /// An output template referenced a placeholder with no value
    #[error("missing template key: '{key}'")]
    MissingTemplateKey {
        /// Name of the placeholder that had no value
        key: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fallback_codepage")
        key: Option<String>,
    },

    /// Extraction attempt failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors that end a single extraction attempt
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Every candidate format was tried and none produced a record of why
    #[error("no supported archive format matched {archive}")]
    NoSupportedFormat {
        /// The archive that could not be extracted
        archive: PathBuf,
    },

    /// The last candidate format failed; carries that format's failure
    #[error(transparent)]
    Format(#[from] FormatFailure),

    /// Archive is password protected; remaining formats were not tried
    #[error("archive {archive} is encrypted: {reason}")]
    Encrypted {
        /// The encrypted archive
        archive: PathBuf,
        /// Codec message that revealed the encryption
        reason: String,
    },
}

impl ExtractionError {
    /// True when this error means the archive is password protected
    pub fn is_encrypted(&self) -> bool {
        match self {
            ExtractionError::Encrypted { .. } => true,
            ExtractionError::Format(f) => f.kind == FailureKind::Encrypted,
            _ => false,
        }
    }
}

/// How a single format extractor failed
///
/// The engine branches on this value: `Encrypted` stops the format loop,
/// every other kind moves on to the next candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The file is not an archive of this format
    Mismatch,
    /// The file looks like this format but its data is damaged
    Corrupt,
    /// The archive (or one of its members) needs a password
    Encrypted,
    /// Anything else (I/O while writing output, unsupported method, ...)
    Other,
}

/// A classified failure reported by one [`crate::extraction::FormatExtractor`]
#[derive(Clone, Debug, Error)]
#[error("{format} extraction failed ({kind:?}): {reason}")]
pub struct FormatFailure {
    /// Format that was being tried
    pub format: ArchiveFormat,
    /// Classification driving the engine's next step
    pub kind: FailureKind,
    /// Codec-provided detail
    pub reason: String,
}

impl FormatFailure {
    /// Build a failure of the given kind
    pub fn new(format: ArchiveFormat, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            format,
            kind,
            reason: reason.into(),
        }
    }

    /// Shorthand for a format mismatch
    pub fn mismatch(format: ArchiveFormat, reason: impl Into<String>) -> Self {
        Self::new(format, FailureKind::Mismatch, reason)
    }

    /// Shorthand for corrupt data
    pub fn corrupt(format: ArchiveFormat, reason: impl Into<String>) -> Self {
        Self::new(format, FailureKind::Corrupt, reason)
    }

    /// Shorthand for a password-protected archive
    pub fn encrypted(format: ArchiveFormat, reason: impl Into<String>) -> Self {
        Self::new(format, FailureKind::Encrypted, reason)
    }

    /// Shorthand for an unclassified failure
    pub fn other(format: ArchiveFormat, reason: impl Into<String>) -> Self {
        Self::new(format, FailureKind::Other, reason)
    }
}

/// Check whether a codec message talks about passwords or encryption
///
/// Codecs do not always expose a dedicated error variant for encrypted
/// members, so their messages are inspected as a last resort.
pub(crate) fn mentions_encryption(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("password") || lower.contains("encrypted")
}
