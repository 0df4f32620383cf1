use crate::error::{FailureKind, FormatFailure, mentions_encryption};
use crate::types::ArchiveFormat;
use encoding_rs::Encoding;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::FormatExtractor;

/// Archive extractor for ZIP files
///
/// Member names without a valid UTF-8 encoding are decoded with a fallback
/// codepage (GBK by default) before falling back to a lossy conversion. Many
/// regional zip tools store names in the local codepage without setting the
/// UTF-8 flag.
#[derive(Clone, Copy, Debug)]
pub struct ZipExtractor {
    fallback_encoding: &'static Encoding,
}

impl Default for ZipExtractor {
    fn default() -> Self {
        Self::new(encoding_rs::GBK)
    }
}

impl ZipExtractor {
    /// Create an extractor that decodes legacy member names with `fallback_encoding`
    pub fn new(fallback_encoding: &'static Encoding) -> Self {
        Self { fallback_encoding }
    }

    /// Classify an error raised while opening the archive
    fn open_error(e: zip::result::ZipError) -> FormatFailure {
        use zip::result::ZipError;
        match e {
            ZipError::InvalidArchive(msg) => {
                FormatFailure::mismatch(ArchiveFormat::Zip, format!("not a ZIP archive: {}", msg))
            }
            other => Self::member_error(other),
        }
    }

    /// Classify an error raised while reading a member
    fn member_error(e: zip::result::ZipError) -> FormatFailure {
        use zip::result::ZipError;
        let reason = e.to_string();
        let kind = match &e {
            ZipError::UnsupportedArchive(msg) if mentions_encryption(msg) => FailureKind::Encrypted,
            ZipError::UnsupportedArchive(_) => FailureKind::Other,
            ZipError::InvalidArchive(_) | ZipError::FileNotFound => FailureKind::Corrupt,
            ZipError::Io(_) if mentions_encryption(&reason) => FailureKind::Encrypted,
            ZipError::Io(_) => FailureKind::Corrupt,
            #[allow(unreachable_patterns)]
            _ => FailureKind::Other,
        };
        FormatFailure::new(ArchiveFormat::Zip, kind, reason)
    }

    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        &self,
        mut file: zip::read::ZipFile,
        dest_path: &Path,
    ) -> Result<Option<PathBuf>, FormatFailure> {
        let name = decode_member_name(file.name_raw(), self.fallback_encoding);

        let Some(relative) = enclosed_path(&name) else {
            warn!(entry = %name, "skipping entry with unsafe path");
            return Ok(None);
        };
        let file_path = dest_path.join(relative);

        if name.ends_with('/') || name.ends_with('\\') {
            std::fs::create_dir_all(&file_path).map_err(|e| {
                FormatFailure::other(
                    ArchiveFormat::Zip,
                    format!("failed to create directory: {}", e),
                )
            })?;
            return Ok(None);
        }

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FormatFailure::other(
                    ArchiveFormat::Zip,
                    format!("failed to create parent directories: {}", e),
                )
            })?;
        }

        let mut outfile = std::fs::File::create(&file_path).map_err(|e| {
            FormatFailure::other(
                ArchiveFormat::Zip,
                format!("failed to create output file: {}", e),
            )
        })?;

        std::io::copy(&mut file, &mut outfile).map_err(|e| {
            let reason = format!("failed to extract {}: {}", name, e);
            if mentions_encryption(&reason) {
                FormatFailure::encrypted(ArchiveFormat::Zip, reason)
            } else {
                FormatFailure::corrupt(ArchiveFormat::Zip, reason)
            }
        })?;

        Ok(Some(file_path))
    }
}

impl FormatExtractor for ZipExtractor {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>, FormatFailure> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        let file = std::fs::File::open(archive_path).map_err(|e| {
            FormatFailure::other(
                ArchiveFormat::Zip,
                format!("failed to open archive: {}", e),
            )
        })?;

        let mut archive = zip::ZipArchive::new(file).map_err(Self::open_error)?;

        let mut extracted_files = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(Self::member_error)?;
            if let Some(file_path) = self.extract_zip_entry(entry, dest_path)? {
                extracted_files.push(file_path);
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "ZIP extraction successful"
        );

        Ok(extracted_files)
    }
}

/// Decode a raw zip member name
///
/// Tries UTF-8, then `fallback` without replacement characters, then a lossy
/// UTF-8 conversion so every member still gets a name.
pub(crate) fn decode_member_name(raw: &[u8], fallback: &'static Encoding) -> String {
    if let Ok(name) = std::str::from_utf8(raw) {
        return name.to_string();
    }
    if let Some(name) = fallback.decode_without_bom_handling_and_without_replacement(raw) {
        debug!(encoding = fallback.name(), %name, "decoded legacy zip member name");
        return name.into_owned();
    }
    String::from_utf8_lossy(raw).into_owned()
}

/// Relative path for a member name, or `None` if nothing safe remains
///
/// Both separators are honored. Empty, `.` and `..` components are dropped,
/// as is a leading drive prefix such as `C:`, so the result cannot leave the
/// destination. Other components are kept verbatim, `:` included.
pub(crate) fn enclosed_path(name: &str) -> Option<PathBuf> {
    let mut components = name
        .split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != "." && *c != "..")
        .peekable();

    if components.peek().is_some_and(|first| is_drive_prefix(first)) {
        components.next();
    }

    let path: PathBuf = components.collect();
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

fn is_drive_prefix(component: &str) -> bool {
    let bytes = component.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
