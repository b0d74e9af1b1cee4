//! Override rules and the builtin datatype catalog.
//!
//! Rules come in four datatype scopes (builtin, schema, table, column), one
//! table-name scope and two default-value scopes (global, column). A rule
//! store hands them out per engine pair and schema; [`RuleSet`] indexes one
//! run's worth of them for lookup.
//!
//! - [`builtin`]: compiled-in builtin catalog for pairs the store leaves empty
//! - [`document`]: YAML rule document and the [`StaticRuleStore`] over it
//! - [`index`]: case-insensitive lookup tables built once per run

pub mod builtin;
pub mod document;
pub mod index;

pub use document::{PairRules, RuleDocument, StaticRuleStore};
pub use index::{RuleCounts, RuleSet};

use serde::{Deserialize, Serialize};

/// Renames a source table in the target schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNameRule {
    pub source_schema: String,
    pub target_schema: String,
    pub source_table: String,
    pub target_table: String,
}

/// Replaces a source type for every table in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDatatypeRule {
    pub schema: String,
    pub source_type: String,
    pub target_type: String,
}

/// Replaces a source type for every column of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDatatypeRule {
    pub schema: String,
    pub table: String,
    pub source_type: String,
    pub target_type: String,
}

/// Replaces the type of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDatatypeRule {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub source_type: String,
    pub target_type: String,
}

/// Builtin catalog entry used when no override applies.
///
/// `target_type` may contain `{length}`, `{precision}` and `{scale}`
/// placeholders. `attributes_pattern` is a regular expression matched
/// against the rendered source type (e.g. `VARCHAR(255)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinDatatypeRule {
    pub source_type: String,
    pub target_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_pattern: Option<String>,
}

impl BuiltinDatatypeRule {
    pub fn new(source_type: &str, target_type: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            target_type: target_type.to_string(),
            attributes_pattern: None,
        }
    }

    pub fn when(mut self, pattern: &str) -> Self {
        self.attributes_pattern = Some(pattern.to_string());
        self
    }
}

/// Rewrites a default literal of a given source type for every column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDefaultRule {
    pub source_type: String,
    pub source_default: String,
    pub target_default: String,
}

/// Sets the default literal of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefaultRule {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub target_default: String,
}
