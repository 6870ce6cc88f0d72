//! Name normalization and custom-field classification.
//!
//! Every function here is pure; the resolver feeds tracker names through
//! them to produce cache keys, and tools feed user input through the same
//! functions before lookup.

use crate::cache::{ACT_FINISH, ACT_START};

/// Substring of a normalized field name -> semantic cache key.
///
/// Checked in order; the first keyword contained in the name wins.
pub const CUSTOM_FIELD_KEYWORDS: &[(&str, &str)] = &[("actstart", ACT_START), ("actfinish", ACT_FINISH)];

/// `"In Progress"` -> `"in_progress"`.
///
/// Runs of whitespace collapse to a single underscore so that
/// `"IN  PROGRESS"` and `"in progress"` agree.
pub fn normalize_status_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `"Development"` -> `"development"`.
pub fn normalize_activity_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Lowercase with spaces, underscores and periods removed:
/// `"Act. Start"` -> `"actstart"`.
pub fn normalize_field_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Map a custom field name to its semantic key, or `None` for fields the
/// system does not use.
pub fn classify_custom_field(name: &str) -> Option<&'static str> {
    let normalized = normalize_field_name(name);
    CUSTOM_FIELD_KEYWORDS
        .iter()
        .find(|(keyword, _)| normalized.contains(keyword))
        .map(|(_, key)| *key)
}
