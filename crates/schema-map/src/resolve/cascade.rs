//! Rule cascade for column datatypes and default values.
//!
//! Datatypes: column rule > table rule > schema rule > builtin mapping.
//! Defaults: column rule > global rule > normalized source literal.
//!
//! A rule's source type is matched against the column's rendered type first
//! (`DECIMAL(10,2)`) and then its bare type name (`DECIMAL`).

use std::collections::BTreeMap;

use super::normalize::normalize_column_default;
use crate::core::schema::ColumnMetadata;
use crate::rules::RuleSet;

/// Column name -> resolved value, for one table.
pub type ColumnMap = BTreeMap<String, String>;

fn by_source_type<'a>(
    column: &ColumnMetadata,
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> Option<&'a str> {
    lookup(&column.rendered_type()).or_else(|| lookup(&column.type_name()))
}

/// Candidate from column-scoped rules only; `base` when none applies.
fn column_candidate(rules: &RuleSet, table: &str, column: &ColumnMetadata, base: &str) -> String {
    by_source_type(column, |ty| rules.column_type(table, &column.name, ty))
        .unwrap_or(base)
        .to_string()
}

/// Candidate from the table rule, else the schema rule, else `base`.
fn table_or_schema_candidate(
    rules: &RuleSet,
    table: &str,
    column: &ColumnMetadata,
    base: &str,
) -> String {
    by_source_type(column, |ty| rules.table_type(table, ty))
        .or_else(|| by_source_type(column, |ty| rules.schema_type(ty)))
        .unwrap_or(base)
        .to_string()
}

/// Pick the winner among the three candidates.
fn decide(base: String, from_column: String, from_other: String) -> String {
    if from_column != base {
        from_column
    } else if from_other != base {
        from_other
    } else {
        base
    }
}

/// Resolve the target datatype of one column, upper-cased.
pub fn resolve_datatype(rules: &RuleSet, table: &str, column: &ColumnMetadata) -> String {
    let base = rules.builtin().map(column);

    // With no column rules loaded the column candidate is always `base`
    let from_column = if rules.has_column_types() {
        column_candidate(rules, table, column, &base)
    } else {
        base.clone()
    };
    let from_other = table_or_schema_candidate(rules, table, column, &base);

    decide(base, from_column, from_other).to_uppercase()
}

/// Resolve the target default literal of one column.
///
/// Empty means the column has no default in the target.
pub fn resolve_default(rules: &RuleSet, table: &str, column: &ColumnMetadata) -> String {
    let normalized = normalize_column_default(column);

    if let Some(value) = rules.column_default(table, &column.name) {
        return value.to_string();
    }

    by_source_type(column, |ty| rules.global_default(ty, &normalized))
        .map(str::to_string)
        .unwrap_or(normalized)
}

/// Resolve every column of a table's datatypes.
pub fn resolve_table_datatypes(
    rules: &RuleSet,
    table: &str,
    columns: &[ColumnMetadata],
) -> ColumnMap {
    columns
        .iter()
        .map(|c| (c.name.clone(), resolve_datatype(rules, table, c)))
        .collect()
}

/// Resolve every column of a table's defaults.
pub fn resolve_table_defaults(
    rules: &RuleSet,
    table: &str,
    columns: &[ColumnMetadata],
) -> ColumnMap {
    columns
        .iter()
        .map(|c| (c.name.clone(), resolve_default(rules, table, c)))
        .collect()
}
