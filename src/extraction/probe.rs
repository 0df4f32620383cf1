//! Candidate format ordering
//!
//! File extensions on downloaded archives are often wrong, so the declared
//! format is only a hint: it is tried first and every other supported format
//! follows in the fixed order of [`ArchiveFormat::ALL`].

use crate::types::ArchiveFormat;
use std::path::Path;

/// Ordered formats to try for an archive with the given extension
///
/// `declared_extension` is compared case-insensitively and may be given with
/// or without its leading dot.
pub fn candidate_formats(declared_extension: Option<&str>) -> Vec<ArchiveFormat> {
    let declared = declared_extension
        .map(|ext| ext.trim_start_matches('.'))
        .and_then(ArchiveFormat::from_extension);

    match declared {
        Some(first) => std::iter::once(first)
            .chain(ArchiveFormat::ALL.into_iter().filter(|f| *f != first))
            .collect(),
        None => ArchiveFormat::ALL.to_vec(),
    }
}

/// [`candidate_formats`] for the extension of `path`
pub fn candidate_formats_for(path: &Path) -> Vec<ArchiveFormat> {
    let ext = path.extension().map(|e| e.to_string_lossy());
    candidate_formats(ext.as_deref())
}
