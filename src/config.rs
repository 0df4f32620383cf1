//! Configuration types for archive-autoextract

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration
///
/// All sections have sensible defaults, so `Config::default()` reproduces the
/// legacy on-disk layout (`.extracted_hash`, `<name>.retry_count`,
/// `<name>.extract_failed`, three attempts).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Extraction behavior
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Retry counter and permanent-failure marker settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Output path sanitization
    #[serde(default)]
    pub naming: NamingConfig,
}

impl Config {
    /// Check settings that cannot be expressed in the type system
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".to_string(),
                key: Some("retry.max_attempts".to_string()),
            });
        }
        if encoding_rs::Encoding::for_label(self.extraction.fallback_codepage.as_bytes()).is_none()
        {
            return Err(Error::Config {
                message: format!(
                    "unknown codepage label '{}'",
                    self.extraction.fallback_codepage
                ),
                key: Some("extraction.fallback_codepage".to_string()),
            });
        }
        if self.extraction.ledger_file_name.is_empty()
            || self.extraction.ledger_file_name.contains(['/', '\\'])
        {
            return Err(Error::Config {
                message: "ledger_file_name must be a bare file name".to_string(),
                key: Some("extraction.ledger_file_name".to_string()),
            });
        }
        Ok(())
    }
}

/// Extraction settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Extensions (without dot, case-insensitive) deleted from the extracted
    /// tree after a successful extraction (default: none)
    #[serde(default)]
    pub purge_extensions: Vec<String>,

    /// Extensions picked up by directory sweeps (default: zip, 7z, rar)
    #[serde(default = "default_archive_extensions")]
    pub archive_extensions: Vec<String>,

    /// Name of the per-directory ledger file (default: ".extracted_hash")
    #[serde(default = "default_ledger_file_name")]
    pub ledger_file_name: String,

    /// Codepage used to decode zip member names that are not valid UTF-8
    /// (default: "gbk")
    #[serde(default = "default_fallback_codepage")]
    pub fallback_codepage: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            purge_extensions: Vec::new(),
            archive_extensions: default_archive_extensions(),
            ledger_file_name: default_ledger_file_name(),
            fallback_codepage: default_fallback_codepage(),
        }
    }
}

impl ExtractionConfig {
    /// Resolve the fallback codepage, falling back to GBK for unknown labels
    pub fn fallback_encoding(&self) -> &'static encoding_rs::Encoding {
        encoding_rs::Encoding::for_label(self.fallback_codepage.as_bytes())
            .unwrap_or(encoding_rs::GBK)
    }
}

/// Retry counter and permanent-failure marker settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Fresh-download failures before an archive is marked permanently failed
    /// (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Suffix of the per-archive counter file (default: "retry_count")
    #[serde(default = "default_counter_suffix")]
    pub counter_suffix: String,

    /// Suffix of the per-archive permanent-failure marker (default: "extract_failed")
    #[serde(default = "default_marker_suffix")]
    pub marker_suffix: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            counter_suffix: default_counter_suffix(),
            marker_suffix: default_marker_suffix(),
        }
    }
}

/// Output path sanitization settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Replace every character outside printable ASCII (default: false)
    #[serde(default)]
    pub restrict_ascii: bool,

    /// Replacement used by `restrict_ascii` (default: '_')
    #[serde(default = "default_replacement")]
    pub replacement: char,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            restrict_ascii: false,
            replacement: default_replacement(),
        }
    }
}

fn default_archive_extensions() -> Vec<String> {
    vec!["zip".into(), "7z".into(), "rar".into()]
}

fn default_ledger_file_name() -> String {
    ".extracted_hash".to_string()
}

fn default_fallback_codepage() -> String {
    "gbk".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_counter_suffix() -> String {
    "retry_count".to_string()
}

fn default_marker_suffix() -> String {
    "extract_failed".to_string()
}

fn default_replacement() -> char {
    '_'
}
