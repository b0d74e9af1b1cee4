//! File-backed source catalog.
//!
//! A snapshot is a YAML mapping of `schema -> table -> [column]`, typically
//! exported once from the source engine so resolution can run offline.
//!
//! ```yaml
//! shop:
//!   orders:
//!     - { name: id, native_type: int, precision: 10 }
//!     - { name: total, native_type: decimal, precision: 10, scale: 2 }
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::core::schema::{ColumnMetadata, DbType};
use crate::core::traits::SourceCatalog;
use crate::error::{MapError, Result};

type Snapshot = BTreeMap<String, BTreeMap<String, Vec<ColumnMetadata>>>;

#[derive(Debug, Clone)]
struct SnapshotTable {
    name: String,
    columns: Vec<ColumnMetadata>,
}

/// Source catalog served from an in-memory snapshot.
///
/// Schema and table lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    db_type: DbType,
    schemas: HashMap<String, HashMap<String, SnapshotTable>>,
}

impl StaticCatalog {
    /// An empty catalog for an engine.
    pub fn new(db_type: DbType) -> Self {
        Self {
            db_type,
            schemas: HashMap::new(),
        }
    }

    /// Load a snapshot from a YAML file.
    pub fn load<P: AsRef<Path>>(db_type: DbType, path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(db_type, &content)
    }

    /// Parse a snapshot from a YAML string.
    pub fn from_yaml(db_type: DbType, yaml: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_yaml::from_str(yaml)?;
        let mut catalog = Self::new(db_type);
        for (schema, tables) in snapshot {
            for (table, columns) in tables {
                catalog.insert(&schema, &table, columns);
            }
        }
        Ok(catalog)
    }

    /// Add or replace a table.
    pub fn insert(&mut self, schema: &str, table: &str, columns: Vec<ColumnMetadata>) {
        self.schemas
            .entry(schema.to_uppercase())
            .or_default()
            .insert(
                table.to_uppercase(),
                SnapshotTable {
                    name: table.to_string(),
                    columns,
                },
            );
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_table(mut self, schema: &str, table: &str, columns: Vec<ColumnMetadata>) -> Self {
        self.insert(schema, table, columns);
        self
    }
}

#[async_trait]
impl SourceCatalog for StaticCatalog {
    async fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>> {
        self.schemas
            .get(&schema.to_uppercase())
            .and_then(|tables| tables.get(&table.to_uppercase()))
            .map(|t| t.columns.clone())
            .ok_or_else(|| {
                MapError::catalog(table, format!("table not found in schema {}", schema))
            })
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .schemas
            .get(&schema.to_uppercase())
            .map(|tables| tables.values().map(|t| t.name.clone()).collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    fn db_type(&self) -> DbType {
        self.db_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
shop:
  orders:
    - { name: id, native_type: int, precision: 10 }
    - { name: total, native_type: decimal, precision: 10, scale: 2 }
    - { name: created, native_type: datetime, nullable: false, default: CURRENT_TIMESTAMP }
  customers:
    - { name: id, native_type: bigint }
"#;

    #[tokio::test]
    async fn test_snapshot_lookup_is_case_insensitive() {
        let catalog = StaticCatalog::from_yaml(DbType::Mysql, SNAPSHOT).unwrap();
        let columns = catalog.table_columns("SHOP", "Orders").await.unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[1].scale, 2);
        assert!(!columns[2].nullable);
        assert_eq!(columns[2].default.as_deref(), Some("CURRENT_TIMESTAMP"));
        assert!(columns[0].nullable);
    }

    #[tokio::test]
    async fn test_missing_table_is_catalog_error() {
        let catalog = StaticCatalog::from_yaml(DbType::Mysql, SNAPSHOT).unwrap();
        let err = catalog.table_columns("shop", "nope").await.unwrap_err();
        match err {
            MapError::CatalogFetch { table, .. } => assert_eq!(table, "nope"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_tables_sorted() {
        let catalog = StaticCatalog::from_yaml(DbType::Mysql, SNAPSHOT).unwrap();
        assert_eq!(
            catalog.list_tables("shop").await.unwrap(),
            vec!["customers".to_string(), "orders".to_string()]
        );
        assert!(catalog.list_tables("other").await.unwrap().is_empty());
    }
}
