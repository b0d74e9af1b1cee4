//! Default-value normalization ahead of default cascade resolution.
//!
//! Date/time types disagree across engines on literal syntax, so their
//! plain literals are quoted while function calls and `CURRENT_TIMESTAMP`
//! stay bare. Every other type passes through untouched.

use crate::core::schema::ColumnMetadata;

/// Native types whose default literals need quoting decisions.
pub const DEFAULT_SENSITIVE_TYPES: &[&str] = &["DATE", "TIME", "DATETIME", "TIMESTAMP", "YEAR"];

/// Whether a native type is default-sensitive (case-insensitive).
pub fn is_default_sensitive(native_type: &str) -> bool {
    let upper = native_type.trim().to_uppercase();
    DEFAULT_SENSITIVE_TYPES.contains(&upper.as_str())
}

/// `<something>()`: at least one character before a trailing empty call.
fn is_function_call(literal: &str) -> bool {
    literal.len() > 2 && literal.ends_with("()") && !literal.contains('\n')
}

/// Normalize a raw default literal for a native type.
///
/// A missing default normalizes to the empty string.
pub fn normalize_default(native_type: &str, raw: Option<&str>) -> String {
    let raw = raw.unwrap_or("");

    if !is_default_sensitive(native_type) {
        return raw.to_string();
    }

    if raw.is_empty() || is_function_call(raw) || raw.eq_ignore_ascii_case("CURRENT_TIMESTAMP") {
        raw.to_string()
    } else {
        format!("'{}'", raw)
    }
}

/// Normalize the default of a catalog column.
pub fn normalize_column_default(column: &ColumnMetadata) -> String {
    normalize_default(&column.native_type, column.default.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_call_left_unquoted() {
        assert_eq!(normalize_default("datetime", Some("now()")), "now()");
        assert_eq!(normalize_default("DATE", Some("curdate()")), "curdate()");
    }

    #[test]
    fn test_current_timestamp_any_case() {
        assert_eq!(
            normalize_default("timestamp", Some("CURRENT_TIMESTAMP")),
            "CURRENT_TIMESTAMP"
        );
        assert_eq!(
            normalize_default("timestamp", Some("current_timestamp")),
            "current_timestamp"
        );
    }

    #[test]
    fn test_plain_literal_quoted_for_sensitive_type() {
        assert_eq!(normalize_default("datetime", Some("active")), "'active'");
        assert_eq!(
            normalize_default("date", Some("2020-01-01")),
            "'2020-01-01'"
        );
    }

    #[test]
    fn test_empty_and_missing_default() {
        assert_eq!(normalize_default("datetime", Some("")), "");
        assert_eq!(normalize_default("datetime", None), "");
        assert_eq!(normalize_default("varchar", None), "");
    }

    #[test]
    fn test_other_types_pass_through() {
        assert_eq!(normalize_default("varchar", Some("active")), "active");
        assert_eq!(normalize_default("int", Some("0")), "0");
        assert_eq!(normalize_default("varchar", Some("uuid()")), "uuid()");
    }

    #[test]
    fn test_bare_parens_are_not_a_call() {
        assert_eq!(normalize_default("time", Some("()")), "'()'");
    }
}
