//! Key helpers: the preview key transform and local file naming.

use crate::constants::{KEY_SEPARATOR_ESCAPE, PREVIEW_EXTENSION, PREVIEW_SUFFIX};

/// Fallback local name for keys that contain nothing but separators.
const EMPTY_KEY_FILE_NAME: &str = "document";

/// Longest local file name, in bytes. Leaves room under the common 255-byte
/// limit for the renderer's `.pdf` sibling.
pub const MAX_FILE_NAME_BYTES: usize = 200;

/// Extension of the last path component, including the leading dot.
///
/// Only the final component is inspected, so a dot inside a directory name
/// (`/a.b/c`) is not an extension.
fn extension(key: &str) -> Option<&str> {
    let name_start = key.rfind('/').map(|i| i + 1).unwrap_or(0);
    key[name_start..]
        .rfind('.')
        .map(|dot| &key[name_start + dot..])
}

/// Destination key of the rendered preview for a source key.
///
/// `/foo/bar/baz.qux` becomes `/foo/bar/baz-preview.pdf`; a key without an
/// extension only gets the suffix: `/foo/bar/baz` becomes `/foo/bar/baz-preview`.
pub fn preview_key(source_key: &str) -> String {
    match extension(source_key) {
        Some(ext) => {
            let stem = &source_key[..source_key.len() - ext.len()];
            format!("{}{}{}", stem, PREVIEW_SUFFIX, PREVIEW_EXTENSION)
        }
        None => format!("{}{}", source_key, PREVIEW_SUFFIX),
    }
}

/// Local file name for a downloaded source object.
///
/// Path separators are escaped so the whole key maps onto a single file
/// name inside the job's working directory. Long keys keep only their tail,
/// at most [`MAX_FILE_NAME_BYTES`], so the extension survives. Never returns
/// an empty name.
pub fn source_file_name(source_key: &str) -> String {
    let escaped: String = source_key
        .chars()
        .map(|c| if c == '/' || c == '\\' { KEY_SEPARATOR_ESCAPE } else { c })
        .collect();

    let mut start = escaped.len().saturating_sub(MAX_FILE_NAME_BYTES);
    while !escaped.is_char_boundary(start) {
        start += 1;
    }
    let name = &escaped[start..];

    if name.chars().all(|c| c == KEY_SEPARATOR_ESCAPE || c == '.') {
        EMPTY_KEY_FILE_NAME.to_string()
    } else {
        name.to_string()
    }
}
