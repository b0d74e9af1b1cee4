//! Include/exclude table filtering with glob patterns.
//!
//! Patterns support `*` (any run of characters) and `?` (one character)
//! and match case-insensitively against the whole table name.

use regex::{Regex, RegexBuilder};

use crate::error::{MapError, Result};

fn glob_to_regex(glob: &str) -> Result<Regex> {
    let mut pattern = String::with_capacity(glob.len() + 2);
    pattern.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');

    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| MapError::Config(format!("invalid table pattern '{}': {}", glob, e)))
}

/// Compiled include/exclude filter.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl TableFilter {
    /// Compile include and exclude patterns. An empty include list admits every table.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: include.iter().map(|g| glob_to_regex(g)).collect::<Result<_>>()?,
            exclude: exclude.iter().map(|g| glob_to_regex(g)).collect::<Result<_>>()?,
        })
    }

    /// Whether a table passes the filter. Exclusion wins over inclusion.
    pub fn matches(&self, table: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(table));
        included && !self.exclude.iter().any(|re| re.is_match(table))
    }

    /// Keep only the tables that pass, preserving order.
    pub fn apply(&self, tables: Vec<String>) -> Vec<String> {
        tables.into_iter().filter(|t| self.matches(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_admits_all() {
        let filter = TableFilter::default();
        assert!(filter.matches("anything"));
    }

    #[test]
    fn test_include_and_exclude() {
        let filter =
            TableFilter::new(&strings(&["ord*", "cust?mers"]), &strings(&["*_bak"])).unwrap();
        assert!(filter.matches("ORDERS"));
        assert!(filter.matches("customers"));
        assert!(!filter.matches("orders_bak"));
        assert!(!filter.matches("products"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let filter = TableFilter::new(&strings(&["a.b"]), &[]).unwrap();
        assert!(filter.matches("a.b"));
        assert!(!filter.matches("axb"));
    }

    #[test]
    fn test_apply_preserves_order() {
        let filter = TableFilter::new(&[], &strings(&["tmp_*"])).unwrap();
        let kept = filter.apply(strings(&["b", "tmp_x", "a"]));
        assert_eq!(kept, strings(&["b", "a"]));
    }
}
