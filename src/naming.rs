//! Output path construction and sanitization
//!
//! Paths are built from a template such as `{user}/{title}/{filename}` and a
//! map of values. Each path segment is cleaned separately:
//!
//! - directory segments: illegal characters and a trailing dot become `_`,
//!   capped at 248 characters and 255 UTF-8 bytes
//! - the file segment: illegal characters become `_`, the extension is kept
//!   and the stem is shortened until the name fits in 250 UTF-8 bytes, which
//!   leaves room for suffixes such as `.part`

use crate::config::NamingConfig;
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Placeholder written for segments that would otherwise be empty
pub const EMPTY_SEGMENT: &str = "_";

const REPLACEMENT: char = '_';
const MAX_DIR_CHARS: usize = 248;
const MAX_DIR_BYTES: usize = 255;
const MAX_FILE_CHARS: usize = 255;
const MAX_FILE_BYTES: usize = 250;
/// Reserved for a `.part` style suffix appended while downloading
const SUFFIX_HEADROOM: usize = 5;

// The pattern is a literal; compiling it cannot fail.
#[allow(clippy::unwrap_used)]
fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").unwrap())
}

fn is_illegal(c: char) -> bool {
    (c as u32) < 0x20 || matches!(c, '\\' | '/' | ':' | '"' | '*' | '?' | '<' | '>' | '|')
}

fn replace_illegal(s: &str) -> String {
    s.chars()
        .map(|c| if is_illegal(c) { REPLACEMENT } else { c })
        .collect()
}

/// Substitute `{key}` placeholders; `{{` and `}}` are literal braces
pub fn fill_template(template: &str, variables: &HashMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_regex().captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&template[last..whole.start()]);
        match whole.as_str() {
            "{{" => out.push('{'),
            "}}" => out.push('}'),
            _ => {
                let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let value = variables.get(key).ok_or_else(|| Error::MissingTemplateKey {
                    key: key.to_string(),
                })?;
                out.push_str(value);
            }
        }
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Clean one directory component
pub fn clean_folder_name(folder_name: &str) -> String {
    let trimmed = folder_name.trim_end();
    if trimmed.is_empty() {
        return EMPTY_SEGMENT.to_string();
    }

    let mut cleaned = replace_illegal(trimmed);
    if cleaned.ends_with('.') {
        cleaned.pop();
        cleaned.push(REPLACEMENT);
    }

    let mut cleaned: String = cleaned.chars().take(MAX_DIR_CHARS).collect();
    while cleaned.len() > MAX_DIR_BYTES {
        cleaned.pop();
    }
    cleaned
}

/// Split `name` into stem and extension (with its dot)
///
/// Leading dots do not start an extension, so `.hidden` has none.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Clean the final (file) component, keeping its extension
pub fn clean_file_name(file_name: &str) -> String {
    if file_name.trim().is_empty() {
        return EMPTY_SEGMENT.to_string();
    }

    let replaced = replace_illegal(file_name);
    let (stem, extension) = split_extension(&replaced);

    let join = |limit: usize| -> String {
        let mut name: String = stem.chars().take(limit).collect();
        name.push_str(extension);
        name
    };

    let mut limit = MAX_FILE_CHARS
        .saturating_sub(extension.chars().count())
        .saturating_sub(SUFFIX_HEADROOM);
    let mut cleaned = join(limit);
    while cleaned.len() > MAX_FILE_BYTES && limit > 0 {
        limit -= 1;
        cleaned = join(limit);
    }

    // Only reachable when the extension alone is too long
    while cleaned.len() > MAX_FILE_BYTES {
        cleaned.pop();
    }
    cleaned
}

/// Build an absolute, filesystem-safe path from an output template
///
/// # Arguments
/// * `base_path` - Directory relative results are resolved against
/// * `output_template` - Template with `{key}` placeholders, `/` or `\` separated
/// * `variables` - Placeholder values
/// * `config` - ASCII restriction settings
///
/// # Errors
/// Returns [`Error::MissingTemplateKey`] if a placeholder has no value.
///
/// # Example
/// ```
/// use archive_autoextract::naming::generate_file_path;
/// use archive_autoextract::config::NamingConfig;
/// use std::collections::HashMap;
///
/// let vars = HashMap::from([
///     ("user".to_string(), "alice".to_string()),
///     ("title".to_string(), "a/b?".to_string()),
/// ]);
/// let path = generate_file_path("/downloads", "{user}/{title}.zip", &vars, &NamingConfig::default())
///     .unwrap();
/// assert_eq!(path, std::path::PathBuf::from("/downloads/alice/a_b_.zip"));
/// ```
pub fn generate_file_path(
    base_path: impl AsRef<Path>,
    output_template: &str,
    variables: &HashMap<String, String>,
    config: &NamingConfig,
) -> Result<PathBuf> {
    let raw_segments: Vec<&str> = output_template.split(['/', '\\']).collect();
    let last_index = raw_segments.len() - 1;

    let mut path = PathBuf::new();
    for (index, segment) in raw_segments.iter().enumerate() {
        let formatted = fill_template(segment, variables)?;
        let cleaned = if index == last_index {
            clean_file_name(&formatted)
        } else {
            clean_folder_name(&formatted)
        };
        path.push(cleaned);
    }

    if !path.is_absolute() {
        path = base_path.as_ref().join(path);
    }
    if !path.is_absolute() {
        path = std::env::current_dir()?.join(path);
    }

    if config.restrict_ascii {
        let restricted: String = path
            .to_string_lossy()
            .chars()
            .map(|c| {
                if (' '..='~').contains(&c) {
                    c
                } else {
                    config.replacement
                }
            })
            .collect();
        path = PathBuf::from(restricted);
    }

    Ok(path)
}
