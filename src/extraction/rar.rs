use crate::error::{FailureKind, FormatFailure, mentions_encryption};
use crate::types::ArchiveFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::FormatExtractor;

/// Archive extractor for RAR files
#[derive(Clone, Copy, Debug, Default)]
pub struct RarExtractor;

impl RarExtractor {
    /// Convert an unrar error to a classified failure
    fn convert_unrar_error(e: unrar::error::UnrarError) -> FormatFailure {
        use unrar::error::Code;
        let reason = e.to_string();
        let kind = match e.code {
            Code::MissingPassword | Code::BadPassword => FailureKind::Encrypted,
            Code::BadArchive | Code::UnknownFormat => FailureKind::Mismatch,
            Code::BadData => FailureKind::Corrupt,
            _ if mentions_encryption(&reason) => FailureKind::Encrypted,
            _ => FailureKind::Other,
        };
        FormatFailure::new(ArchiveFormat::Rar, kind, reason)
    }

    fn skip_failed(e: unrar::error::UnrarError, what: &str) -> FormatFailure {
        let mut failure = Self::convert_unrar_error(e);
        failure.reason = format!("failed to skip {}: {}", what, failure.reason);
        failure
    }
}

impl FormatExtractor for RarExtractor {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Rar
    }

    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>, FormatFailure> {
        debug!(?archive_path, ?dest_path, "attempting RAR extraction");

        let processor = unrar::Archive::new(archive_path)
            .open_for_processing()
            .map_err(Self::convert_unrar_error)?;

        let mut extracted_files = Vec::new();

        let mut at_header = processor;
        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(entry_processor)) => entry_processor,
                Ok(None) => break,
                Err(e) => return Err(Self::convert_unrar_error(e)),
            };

            let header = at_file.entry();

            if header.is_encrypted() {
                return Err(FormatFailure::encrypted(
                    ArchiveFormat::Rar,
                    format!("member {} is encrypted", header.filename.display()),
                ));
            }

            // Drop `..`, root and prefix components
            let sanitized = Path::new(&header.filename)
                .components()
                .filter(|c| matches!(c, std::path::Component::Normal(_)))
                .collect::<PathBuf>();

            if sanitized.as_os_str().is_empty() {
                at_header = at_file
                    .skip()
                    .map_err(|e| Self::skip_failed(e, "unsafe entry"))?;
                continue;
            }

            let file_path = dest_path.join(&sanitized);

            if header.is_directory() {
                at_header = at_file
                    .skip()
                    .map_err(|e| Self::skip_failed(e, "directory"))?;
            } else {
                at_header = at_file
                    .extract_to(&file_path)
                    .map_err(Self::convert_unrar_error)?;
                extracted_files.push(file_path);
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "RAR extraction successful"
        );

        Ok(extracted_files)
    }
}
