//! YAML rule document and the in-memory store built from it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::{
    builtin, BuiltinDatatypeRule, ColumnDatatypeRule, ColumnDefaultRule, GlobalDefaultRule,
    SchemaDatatypeRule, TableDatatypeRule, TableNameRule,
};
use crate::core::schema::{DbType, EnginePair};
use crate::core::traits::RuleStore;
use crate::error::{MapError, Result};

/// Every rule collection for one engine pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairRules {
    pub source: Option<DbType>,
    pub target: Option<DbType>,

    #[serde(default)]
    pub table_names: Vec<TableNameRule>,

    #[serde(default)]
    pub schema_datatypes: Vec<SchemaDatatypeRule>,

    #[serde(default)]
    pub table_datatypes: Vec<TableDatatypeRule>,

    #[serde(default)]
    pub column_datatypes: Vec<ColumnDatatypeRule>,

    /// Overrides the compiled-in builtin catalog when non-empty.
    #[serde(default)]
    pub builtin_datatypes: Vec<BuiltinDatatypeRule>,

    /// Overrides the compiled-in global defaults when non-empty.
    #[serde(default)]
    pub global_defaults: Vec<GlobalDefaultRule>,

    #[serde(default)]
    pub column_defaults: Vec<ColumnDefaultRule>,
}

impl PairRules {
    pub fn new(pair: EnginePair) -> Self {
        Self {
            source: Some(pair.source),
            target: Some(pair.target),
            ..Default::default()
        }
    }

    fn pair(&self) -> Result<EnginePair> {
        match (self.source, self.target) {
            (Some(source), Some(target)) => Ok(EnginePair::new(source, target)),
            _ => Err(MapError::Config(
                "every rule set needs both 'source' and 'target' engines".into(),
            )),
        }
    }
}

/// Serialized form of a rule store.
///
/// ```yaml
/// rule_sets:
///   - source: mysql
///     target: oracle
///     column_datatypes:
///       - { schema: shop, table: orders, column: total, source_type: decimal, target_type: "NUMBER(10,2)" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub rule_sets: Vec<PairRules>,
}

impl RuleDocument {
    /// Load a rule document from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a rule document from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let doc: RuleDocument = serde_yaml::from_str(yaml)?;
        for set in &doc.rule_sets {
            set.pair()?;
        }
        Ok(doc)
    }
}

/// Rule store backed by a fully loaded [`RuleDocument`].
///
/// Rule sets for the same pair are concatenated in document order.
#[derive(Debug, Clone, Default)]
pub struct StaticRuleStore {
    sets: HashMap<EnginePair, PairRules>,
}

impl StaticRuleStore {
    /// An empty store. Only the compiled-in builtin catalog is served.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a parsed document.
    pub fn from_document(doc: RuleDocument) -> Result<Self> {
        let mut store = Self::new();
        for set in doc.rule_sets {
            store.insert(set)?;
        }
        Ok(store)
    }

    /// Load a store from a YAML rule document.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = RuleDocument::load(path)?;
        Self::from_document(doc)
    }

    /// Add a rule set, appending to any set already held for its pair.
    pub fn insert(&mut self, set: PairRules) -> Result<()> {
        let pair = set.pair()?;
        let entry = self.sets.entry(pair).or_insert_with(|| PairRules::new(pair));
        entry.table_names.extend(set.table_names);
        entry.schema_datatypes.extend(set.schema_datatypes);
        entry.table_datatypes.extend(set.table_datatypes);
        entry.column_datatypes.extend(set.column_datatypes);
        entry.builtin_datatypes.extend(set.builtin_datatypes);
        entry.global_defaults.extend(set.global_defaults);
        entry.column_defaults.extend(set.column_defaults);
        Ok(())
    }

    /// Rule sets held by the store, for reporting.
    pub fn rule_sets(&self) -> impl Iterator<Item = &PairRules> {
        self.sets.values()
    }

    fn set(&self, pair: EnginePair) -> Option<&PairRules> {
        self.sets.get(&pair)
    }

    fn scoped<'a, T: Clone + 'a>(
        rules: impl Iterator<Item = &'a T>,
        matches: impl Fn(&T) -> bool,
    ) -> Vec<T> {
        rules.filter(|r| matches(r)).cloned().collect()
    }
}

#[async_trait]
impl RuleStore for StaticRuleStore {
    async fn table_name_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
        target_schema: &str,
    ) -> Result<Vec<TableNameRule>> {
        Ok(self
            .set(pair)
            .map(|s| {
                Self::scoped(s.table_names.iter(), |r| {
                    r.source_schema.eq_ignore_ascii_case(source_schema)
                        && r.target_schema.eq_ignore_ascii_case(target_schema)
                })
            })
            .unwrap_or_default())
    }

    async fn schema_datatype_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
    ) -> Result<Vec<SchemaDatatypeRule>> {
        Ok(self
            .set(pair)
            .map(|s| {
                Self::scoped(s.schema_datatypes.iter(), |r| {
                    r.schema.eq_ignore_ascii_case(source_schema)
                })
            })
            .unwrap_or_default())
    }

    async fn table_datatype_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
    ) -> Result<Vec<TableDatatypeRule>> {
        Ok(self
            .set(pair)
            .map(|s| {
                Self::scoped(s.table_datatypes.iter(), |r| {
                    r.schema.eq_ignore_ascii_case(source_schema)
                })
            })
            .unwrap_or_default())
    }

    async fn column_datatype_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
    ) -> Result<Vec<ColumnDatatypeRule>> {
        Ok(self
            .set(pair)
            .map(|s| {
                Self::scoped(s.column_datatypes.iter(), |r| {
                    r.schema.eq_ignore_ascii_case(source_schema)
                })
            })
            .unwrap_or_default())
    }

    async fn builtin_datatype_catalog(&self, pair: EnginePair) -> Result<Vec<BuiltinDatatypeRule>> {
        match self.set(pair) {
            Some(s) if !s.builtin_datatypes.is_empty() => Ok(s.builtin_datatypes.clone()),
            _ => {
                debug!("Using compiled-in builtin catalog for {}", pair);
                Ok(builtin::datatype_catalog(pair))
            }
        }
    }

    async fn global_default_rules(&self, pair: EnginePair) -> Result<Vec<GlobalDefaultRule>> {
        match self.set(pair) {
            Some(s) if !s.global_defaults.is_empty() => Ok(s.global_defaults.clone()),
            _ => Ok(builtin::global_defaults(pair)),
        }
    }

    async fn column_default_rules(
        &self,
        pair: EnginePair,
        source_schema: &str,
    ) -> Result<Vec<ColumnDefaultRule>> {
        Ok(self
            .set(pair)
            .map(|s| {
                Self::scoped(s.column_defaults.iter(), |r| {
                    r.schema.eq_ignore_ascii_case(source_schema)
                })
            })
            .unwrap_or_default())
    }
}
