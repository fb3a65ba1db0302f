//! Filename derivation: caption override, sanitizing, collision-free placement.

mod sanitize;
mod unique;

pub use sanitize::{sanitize_filename, MAX_FILENAME_LEN};
pub use unique::unique_path;

/// Splits `name` into base and extension (extension includes the dot).
///
/// The extension starts at the last `.` of the final path component, except
/// that a leading dot is part of the base: `"a.tar.gz"` -> `("a.tar", ".gz")`,
/// `".env"` -> `(".env", "")`, `"v1.2/trip"` -> `("v1.2/trip", "")`.
pub fn split_extension(name: &str) -> (&str, &str) {
    let start = name.rfind(|c: char| c == '/' || c == '\\').map_or(0, |i| i + 1);
    match name[start..].rfind('.') {
        Some(i) if i > 0 => name.split_at(start + i),
        _ => (name, ""),
    }
}

/// Name to save under: the caption's `desired` name when given (inheriting the
/// original extension if it has none), else `original`.
pub fn choose_name(original: &str, desired: Option<&str>) -> String {
    let Some(desired) = desired.filter(|d| !d.is_empty()) else {
        return original.to_string();
    };
    let (_, desired_ext) = split_extension(desired);
    let (_, original_ext) = split_extension(original);
    if desired_ext.is_empty() && !original_ext.is_empty() {
        format!("{desired}{original_ext}")
    } else {
        desired.to_string()
    }
}

/// Sanitized form of `name`, or `fallback` when sanitizing leaves nothing
/// usable (empty, `.` or `..`).
pub fn safe_name(name: &str, fallback: &str) -> String {
    let sanitized = sanitize_filename(name);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        sanitize_filename(fallback)
    } else {
        sanitized
    }
}
