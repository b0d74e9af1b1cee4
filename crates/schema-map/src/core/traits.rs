//! Collaborator traits consumed by the resolution engine.
//!
//! - [`RuleStore`]: hands out override rules and the builtin catalog by scope key
//! - [`SourceCatalog`]: reports column metadata for one source table
//!
//! Both are read-only from the engine's point of view. Neither is retried
//! internally; a failing call aborts the run.

use async_trait::async_trait;

use crate::error::Result;
use crate::rules::{
    BuiltinDatatypeRule, ColumnDatatypeRule, ColumnDefaultRule, GlobalDefaultRule,
    SchemaDatatypeRule, TableDatatypeRule, TableNameRule,
};

use super::schema::{ColumnMetadata, DbType, EnginePair};

/// Persistent store of override rules.
///
/// Every query is scoped by engine pair and, where the rule kind has one,
/// by source schema. Implementations return rules in store order; when two
/// rules share a lookup key the first one wins.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Table rename rules between a source and a target schema.
    async fn table_name_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
        target_schema: &str,
    ) -> Result<Vec<TableNameRule>>;

    /// Schema-wide datatype overrides.
    async fn schema_datatype_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
    ) -> Result<Vec<SchemaDatatypeRule>>;

    /// Table-scoped datatype overrides for every table of the schema.
    async fn table_datatype_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
    ) -> Result<Vec<TableDatatypeRule>>;

    /// Column-scoped datatype overrides for every table of the schema.
    async fn column_datatype_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
    ) -> Result<Vec<ColumnDatatypeRule>>;

    /// Builtin datatype catalog for the pair.
    async fn builtin_datatype_catalog(&self, pair: EnginePair) -> Result<Vec<BuiltinDatatypeRule>>;

    /// Global default-value rewrites for the pair.
    async fn global_default_rules(&self, pair: EnginePair) -> Result<Vec<GlobalDefaultRule>>;

    /// Column-scoped default-value overrides for the schema.
    async fn column_default_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
    ) -> Result<Vec<ColumnDefaultRule>>;
}

/// Column metadata from the source engine's catalog.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Columns of one table, in ordinal order.
    ///
    /// A missing table or a failed query is reported as
    /// [`MapError::CatalogFetch`](crate::error::MapError::CatalogFetch).
    async fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>>;

    /// Names of all base tables in a schema.
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>>;

    /// Engine the catalog reads from.
    fn db_type(&self) -> DbType;
}
