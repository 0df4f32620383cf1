use crate::error::{FailureKind, FormatFailure, mentions_encryption};
use crate::types::ArchiveFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::FormatExtractor;

/// Archive extractor for 7z files
#[derive(Clone, Copy, Debug, Default)]
pub struct SevenZipExtractor;

impl SevenZipExtractor {
    fn convert_error(e: sevenz_rust::Error) -> FormatFailure {
        let reason = e.to_string();
        let kind = match e {
            sevenz_rust::Error::BadSignature(..) => FailureKind::Mismatch,
            sevenz_rust::Error::PasswordRequired => FailureKind::Encrypted,
            sevenz_rust::Error::ChecksumVerificationFailed
            | sevenz_rust::Error::NextHeaderCrcMismatch => FailureKind::Corrupt,
            _ if mentions_encryption(&reason) => FailureKind::Encrypted,
            _ => FailureKind::Corrupt,
        };
        FormatFailure::new(
            ArchiveFormat::SevenZip,
            kind,
            format!("failed to extract 7z archive: {}", reason),
        )
    }

    /// Validate that all extracted files are within the destination directory.
    fn validate_extracted_paths(dest_path: &Path) -> Result<(), FormatFailure> {
        let io_failure = |e: std::io::Error| {
            FormatFailure::other(
                ArchiveFormat::SevenZip,
                format!("failed to inspect extracted files: {}", e),
            )
        };

        let canonical_dest = dest_path.canonicalize().map_err(io_failure)?;

        for entry in WalkDir::new(dest_path).min_depth(1) {
            let entry = entry.map_err(|e| io_failure(e.into()))?;
            let canonical = entry.path().canonicalize().map_err(io_failure)?;
            if !canonical.starts_with(&canonical_dest) {
                return Err(FormatFailure::corrupt(
                    ArchiveFormat::SevenZip,
                    format!(
                        "path traversal detected: extracted file {:?} is outside destination",
                        canonical
                    ),
                ));
            }
        }
        Ok(())
    }

    /// All regular files under `dir`
    pub(crate) fn collect_extracted_files(dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect()
    }
}

impl FormatExtractor for SevenZipExtractor {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::SevenZip
    }

    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>, FormatFailure> {
        debug!(?archive_path, ?dest_path, "attempting 7z extraction");

        sevenz_rust::decompress_file(archive_path, dest_path).map_err(Self::convert_error)?;

        Self::validate_extracted_paths(dest_path)?;
        let extracted_files = Self::collect_extracted_files(dest_path);

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "7z extraction successful"
        );
        Ok(extracted_files)
    }
}
