//! FreeDesktop.org desktop entry helpers.
//!
//! This module names and formats the fields of the `.desktop` launcher
//! descriptor shipped in `/usr/share/applications`.

/// File name of the launcher descriptor for `name`.
pub fn desktop_file_name(name: &str) -> String {
    format!("{}.desktop", name)
}

/// Formats a desktop entry list value (`Categories`, `MimeType`).
///
/// Entries are `;`-separated with a trailing `;`. Returns `None` when the
/// list is empty so the key can be omitted.
pub fn list_value(values: &[String]) -> Option<String> {
    let values: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(format!("{};", values.join(";")))
    }
}
