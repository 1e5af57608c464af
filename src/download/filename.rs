//! Filesystem-safe artifact names.

use std::path::{Component, Path};

/// Sanitizes a display name for use as a file name.
///
/// Path separators become `-` and double quotes become `'`, which keeps names
/// like `Walk/Run` or `"Thriller"` readable; the remaining characters invalid on
/// common filesystems (`: * ? < > |` and control characters) become `_`.
/// Pure dot segments are rewritten so the result always stays inside the
/// output directory.
///
/// # Example
///
/// ```
/// use mixamo_core::download::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Walk/Run"), "Walk-Run");
/// assert_eq!(sanitize_filename("\"Thriller\" Part 1"), "'Thriller' Part 1");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            '"' => '\'',
            ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
