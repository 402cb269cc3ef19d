//! Destination naming for listed items.

use std::path::{Path, PathBuf};

use crate::media::MediaClass;

/// Images are kept in their own subdirectory; videos sit at the top level.
pub const IMAGE_SUBDIR: &str = "img";

/// Sanitizes a candidate file name for local storage.
///
/// - Replaces NUL, `/`, `\`, whitespace and control characters with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing dots and underscores (no `..`, no hidden files)
/// - Limits length to 255 bytes (Linux NAME_MAX)
pub fn sanitize_file_name(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement =
            if c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace() {
                '_'
            } else {
                c
            };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Fallback name when the source gives none: `<seq>_<id>.jpg|.mp4`.
pub fn default_file_name(class: MediaClass, sequence_id: u64, id: &str) -> String {
    let ext = match class {
        MediaClass::Image => "jpg",
        MediaClass::Video => "mp4",
    };
    format!("{}_{}.{}", sequence_id, id, ext)
}

/// Final path for an item under `root`.
pub fn destination_for(
    root: &Path,
    class: MediaClass,
    sequence_id: u64,
    id: &str,
    file_name: Option<&str>,
) -> PathBuf {
    let name = file_name
        .map(sanitize_file_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| sanitize_file_name(&default_file_name(class, sequence_id, id)));
    match class {
        MediaClass::Image => root.join(IMAGE_SUBDIR).join(name),
        MediaClass::Video => root.join(name),
    }
}
