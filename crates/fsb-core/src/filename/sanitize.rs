//! Filesystem-safe, length-bounded filenames.

use super::split_extension;

/// Longest filename produced by [`sanitize_filename`], in bytes.
pub const MAX_FILENAME_LEN: usize = 240;

const INVALID_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Sanitizes a caption- or platform-supplied filename.
///
/// - Replaces each of `\ / : * ? " < > |` with `_`
/// - Limits length to [`MAX_FILENAME_LEN`] bytes by cutting the base name and
///   keeping the extension; cuts never split a UTF-8 character
///
/// Idempotent: sanitizing a sanitized name returns it unchanged.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();

    if replaced.len() <= MAX_FILENAME_LEN {
        return replaced;
    }

    let (base, ext) = split_extension(&replaced);
    if ext.len() >= MAX_FILENAME_LEN {
        return truncate_at_boundary(&replaced, MAX_FILENAME_LEN).to_string();
    }
    let base = truncate_at_boundary(base, MAX_FILENAME_LEN - ext.len());
    format!("{base}{ext}")
}

fn truncate_at_boundary(s: &str, max: usize) -> &str {
    let mut take = max.min(s.len());
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}
