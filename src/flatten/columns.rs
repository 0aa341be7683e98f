//! Column name rules
//!
//! Parquet readers disagree on what a column name may contain; `.` in
//! particular is read as a nested path by most query engines. Names are
//! reduced to `[A-Za-z0-9_]`.

use regex::Regex;
use std::sync::LazyLock;

/// Any character that may not appear in an output column name
static DISALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Separator nested field names are joined with before sanitizing
pub const PATH_SEPARATOR: char = '.';

/// Replace every disallowed character with `_`
///
/// Idempotent: a sanitized name is returned unchanged.
pub fn sanitize_column_name(name: &str) -> String {
    DISALLOWED_CHARS.replace_all(name, "_").into_owned()
}

/// Join a parent path and a child key
pub(crate) fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}{PATH_SEPARATOR}{key}")
    }
}
