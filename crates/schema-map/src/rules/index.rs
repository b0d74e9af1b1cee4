//! Case-insensitive lookup tables over one run's rule collections.
//!
//! Keys are upper-cased on the way in; every lookup upper-cases its probe.
//! When two rules share a key, the first one loaded wins.

use serde::Serialize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    ColumnDatatypeRule, ColumnDefaultRule, GlobalDefaultRule, SchemaDatatypeRule,
    TableDatatypeRule, TableNameRule,
};
use crate::core::schema::EnginePair;
use crate::core::traits::RuleStore;
use crate::error::{MapError, Result};
use crate::typemap::BuiltinMapper;

fn key(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Default literals are matched case-insensitively unless quoted.
fn default_key(literal: &str) -> String {
    if literal.starts_with('\'') {
        literal.to_string()
    } else {
        key(literal)
    }
}

/// Per-collection rule counts, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleCounts {
    pub table_names: usize,
    pub schema_datatypes: usize,
    pub table_datatypes: usize,
    pub column_datatypes: usize,
    pub builtin_types: usize,
    pub global_defaults: usize,
    pub column_defaults: usize,
}

/// Indexed rules for a single resolution run.
#[derive(Debug, Default)]
pub struct RuleSet {
    table_names: HashMap<String, String>,
    schema_types: HashMap<String, String>,
    table_types: HashMap<(String, String), String>,
    column_types: HashMap<(String, String, String), String>,
    global_defaults: HashMap<(String, String), String>,
    column_defaults: HashMap<(String, String), String>,
    builtin: BuiltinMapper,
}

impl RuleSet {
    /// Fetch every rule collection for a run and index it.
    ///
    /// Collections are fetched concurrently; the first store failure aborts
    /// the load. Cancelling `cancel` abandons in-flight fetches.
    pub async fn load(
        store: &dyn RuleStore,
        pair: EnginePair,
        source_schema: &str,
        target_schema: &str,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let fetch = async {
            tokio::try_join!(
                async {
                    store
                        .table_name_rules(pair, source_schema, target_schema)
                        .await
                        .map_err(|e| as_store_error("table name rules", e))
                },
                async {
                    store
                        .schema_datatype_rules(pair, source_schema)
                        .await
                        .map_err(|e| as_store_error("schema datatype rules", e))
                },
                async {
                    store
                        .table_datatype_rules(pair, source_schema)
                        .await
                        .map_err(|e| as_store_error("table datatype rules", e))
                },
                async {
                    store
                        .column_datatype_rules(pair, source_schema)
                        .await
                        .map_err(|e| as_store_error("column datatype rules", e))
                },
                async {
                    store
                        .builtin_datatype_catalog(pair)
                        .await
                        .map_err(|e| as_store_error("builtin datatype catalog", e))
                },
                async {
                    store
                        .global_default_rules(pair)
                        .await
                        .map_err(|e| as_store_error("global default rules", e))
                },
                async {
                    store
                        .column_default_rules(pair, source_schema)
                        .await
                        .map_err(|e| as_store_error("column default rules", e))
                },
            )
        };
        let (table_names, schema_types, table_types, column_types, builtin, globals, col_defaults) =
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MapError::Cancelled),
                fetched = fetch => fetched?,
            };

        let mut set = RuleSet {
            builtin: BuiltinMapper::compile(&builtin)?,
            ..Default::default()
        };
        set.index_table_names(&table_names);
        set.index_schema_types(&schema_types);
        set.index_table_types(&table_types);
        set.index_column_types(&column_types);
        set.index_global_defaults(&globals);
        set.index_column_defaults(&col_defaults);

        let counts = set.counts();
        debug!(
            "Loaded rules for {} schema {}: {} table names, {} schema/{} table/{} column datatype, \
             {} builtin types, {} global/{} column defaults",
            pair,
            source_schema,
            counts.table_names,
            counts.schema_datatypes,
            counts.table_datatypes,
            counts.column_datatypes,
            counts.builtin_types,
            counts.global_defaults,
            counts.column_defaults,
        );

        Ok(set)
    }

    /// Build a rule set directly from collections (no store round-trip).
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    fn index_table_names(&mut self, rules: &[TableNameRule]) {
        for r in rules {
            self.table_names
                .entry(key(&r.source_table))
                .or_insert_with(|| key(&r.target_table));
        }
    }

    fn index_schema_types(&mut self, rules: &[SchemaDatatypeRule]) {
        for r in rules {
            self.schema_types
                .entry(key(&r.source_type))
                .or_insert_with(|| key(&r.target_type));
        }
    }

    fn index_table_types(&mut self, rules: &[TableDatatypeRule]) {
        for r in rules {
            self.table_types
                .entry((key(&r.table), key(&r.source_type)))
                .or_insert_with(|| key(&r.target_type));
        }
    }

    fn index_column_types(&mut self, rules: &[ColumnDatatypeRule]) {
        for r in rules {
            self.column_types
                .entry((key(&r.table), key(&r.column), key(&r.source_type)))
                .or_insert_with(|| key(&r.target_type));
        }
    }

    fn index_global_defaults(&mut self, rules: &[GlobalDefaultRule]) {
        for r in rules {
            self.global_defaults
                .entry((key(&r.source_type), default_key(&r.source_default)))
                .or_insert_with(|| r.target_default.clone());
        }
    }

    fn index_column_defaults(&mut self, rules: &[ColumnDefaultRule]) {
        for r in rules {
            self.column_defaults
                .entry((key(&r.table), key(&r.column)))
                .or_insert_with(|| r.target_default.clone());
        }
    }

    /// Distinct rule keys held per collection.
    pub fn counts(&self) -> RuleCounts {
        RuleCounts {
            table_names: self.table_names.len(),
            schema_datatypes: self.schema_types.len(),
            table_datatypes: self.table_types.len(),
            column_datatypes: self.column_types.len(),
            builtin_types: self.builtin.len(),
            global_defaults: self.global_defaults.len(),
            column_defaults: self.column_defaults.len(),
        }
    }

    /// Builtin mapper compiled from the run's catalog.
    pub fn builtin(&self) -> &BuiltinMapper {
        &self.builtin
    }

    /// Explicit rename for a table, upper-cased.
    pub fn table_name(&self, table: &str) -> Option<&str> {
        self.table_names.get(&key(table)).map(String::as_str)
    }

    /// Whether any column-scoped datatype rule exists for this run.
    pub fn has_column_types(&self) -> bool {
        !self.column_types.is_empty()
    }

    pub fn column_type(&self, table: &str, column: &str, source_type: &str) -> Option<&str> {
        self.column_types
            .get(&(key(table), key(column), key(source_type)))
            .map(String::as_str)
    }

    pub fn table_type(&self, table: &str, source_type: &str) -> Option<&str> {
        self.table_types
            .get(&(key(table), key(source_type)))
            .map(String::as_str)
    }

    pub fn schema_type(&self, source_type: &str) -> Option<&str> {
        self.schema_types.get(&key(source_type)).map(String::as_str)
    }

    pub fn global_default(&self, source_type: &str, literal: &str) -> Option<&str> {
        self.global_defaults
            .get(&(key(source_type), default_key(literal)))
            .map(String::as_str)
    }

    pub fn column_default(&self, table: &str, column: &str) -> Option<&str> {
        self.column_defaults
            .get(&(key(table), key(column)))
            .map(String::as_str)
    }
}

fn as_store_error(collection: &str, err: MapError) -> MapError {
    match err {
        MapError::RuleStore(_) | MapError::Cancelled => err,
        other => MapError::rule_store(collection, other),
    }
}

/// Assembles a [`RuleSet`] from in-memory collections.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    table_names: Vec<TableNameRule>,
    schema_types: Vec<SchemaDatatypeRule>,
    table_types: Vec<TableDatatypeRule>,
    column_types: Vec<ColumnDatatypeRule>,
    builtin: Vec<super::BuiltinDatatypeRule>,
    global_defaults: Vec<GlobalDefaultRule>,
    column_defaults: Vec<ColumnDefaultRule>,
}

impl RuleSetBuilder {
    pub fn table_name(mut self, source: &str, target: &str) -> Self {
        self.table_names.push(TableNameRule {
            source_schema: String::new(),
            target_schema: String::new(),
            source_table: source.into(),
            target_table: target.into(),
        });
        self
    }

    pub fn schema_type(mut self, source_type: &str, target_type: &str) -> Self {
        self.schema_types.push(SchemaDatatypeRule {
            schema: String::new(),
            source_type: source_type.into(),
            target_type: target_type.into(),
        });
        self
    }

    pub fn table_type(mut self, table: &str, source_type: &str, target_type: &str) -> Self {
        self.table_types.push(TableDatatypeRule {
            schema: String::new(),
            table: table.into(),
            source_type: source_type.into(),
            target_type: target_type.into(),
        });
        self
    }

    pub fn column_type(
        mut self,
        table: &str,
        column: &str,
        source_type: &str,
        target_type: &str,
    ) -> Self {
        self.column_types.push(ColumnDatatypeRule {
            schema: String::new(),
            table: table.into(),
            column: column.into(),
            source_type: source_type.into(),
            target_type: target_type.into(),
        });
        self
    }

    pub fn builtin(mut self, source_type: &str, target_type: &str) -> Self {
        self.builtin
            .push(super::BuiltinDatatypeRule::new(source_type, target_type));
        self
    }

    pub fn global_default(mut self, source_type: &str, from: &str, to: &str) -> Self {
        self.global_defaults.push(GlobalDefaultRule {
            source_type: source_type.into(),
            source_default: from.into(),
            target_default: to.into(),
        });
        self
    }

    pub fn column_default(mut self, table: &str, column: &str, to: &str) -> Self {
        self.column_defaults.push(ColumnDefaultRule {
            schema: String::new(),
            table: table.into(),
            column: column.into(),
            target_default: to.into(),
        });
        self
    }

    pub fn build(self) -> Result<RuleSet> {
        let mut set = RuleSet {
            builtin: BuiltinMapper::compile(&self.builtin)?,
            ..Default::default()
        };
        set.index_table_names(&self.table_names);
        set.index_schema_types(&self.schema_types);
        set.index_table_types(&self.table_types);
        set.index_column_types(&self.column_types);
        set.index_global_defaults(&self.global_defaults);
        set.index_column_defaults(&self.column_defaults);
        Ok(set)
    }
}
