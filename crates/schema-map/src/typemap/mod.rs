//! Builtin type mapping from a source column to its default target type.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

use crate::core::schema::ColumnMetadata;
use crate::error::{MapError, Result};
use crate::rules::BuiltinDatatypeRule;

/// One compiled builtin catalog entry.
#[derive(Debug, Clone)]
struct BuiltinEntry {
    target_type: String,
    pattern: Option<Regex>,
}

/// Maps a column's native type to the builtin target type.
///
/// Entries are grouped by upper-cased source type and tried in catalog
/// order. A type with no matching entry maps to its own upper-cased name.
#[derive(Debug, Clone, Default)]
pub struct BuiltinMapper {
    entries: HashMap<String, Vec<BuiltinEntry>>,
}

impl BuiltinMapper {
    /// Compile the catalog. Fails on an unparseable attributes pattern.
    pub fn compile(catalog: &[BuiltinDatatypeRule]) -> Result<Self> {
        let mut entries: HashMap<String, Vec<BuiltinEntry>> = HashMap::new();

        for rule in catalog {
            let pattern = match rule.attributes_pattern.as_deref() {
                Some(p) if !p.is_empty() => Some(
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            MapError::Resolution(format!(
                                "builtin rule for {}: invalid attributes pattern '{}': {}",
                                rule.source_type, p, e
                            ))
                        })?,
                ),
                _ => None,
            };

            entries
                .entry(rule.source_type.trim().to_uppercase())
                .or_default()
                .push(BuiltinEntry {
                    target_type: rule.target_type.trim().to_string(),
                    pattern,
                });
        }

        Ok(Self { entries })
    }

    /// Number of distinct source types covered by the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map a column to its builtin target type (upper-cased).
    pub fn map(&self, column: &ColumnMetadata) -> String {
        let type_name = column.type_name();
        let rendered = column.rendered_type();

        let matched = self.entries.get(&type_name).and_then(|candidates| {
            candidates.iter().find(|entry| match &entry.pattern {
                Some(re) => re.is_match(&rendered),
                None => true,
            })
        });

        match matched {
            Some(entry) => render_template(&entry.target_type, column).to_uppercase(),
            // No builtin entry: echo the native type
            None => type_name,
        }
    }
}

fn render_template(template: &str, column: &ColumnMetadata) -> String {
    if !template.contains('{') {
        return template.to_string();
    }
    template
        .replace("{length}", &column.length.to_string())
        .replace("{precision}", &column.precision.to_string())
        .replace("{scale}", &column.scale.to_string())
}
