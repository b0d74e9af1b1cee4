//! Resolution orchestrator - runs the per-table phases over a table set.

mod fanout;
mod report;

pub use report::{digest_maps, ResolutionReport};

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::schema::{ColumnMetadata, EnginePair};
use crate::core::traits::{RuleStore, SourceCatalog};
use crate::error::{MapError, Result};
use crate::resolve::{resolve_table_datatypes, resolve_table_defaults, ColumnMap};
use crate::rules::RuleSet;
use fanout::FanOut;

/// Upper-cased source table -> upper-cased target table.
pub type TableNameMap = BTreeMap<String, String>;

/// Source table -> column -> resolved target type.
pub type DatatypeMap = BTreeMap<String, ColumnMap>;

/// Source table -> column -> resolved target default.
pub type DefaultMap = BTreeMap<String, ColumnMap>;

/// Scope and limits for one resolution run.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub pair: EnginePair,
    pub source_schema: String,
    pub target_schema: String,
    pub threads: usize,
    pub channel_buffer: usize,
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pair: config.engine_pair(),
            source_schema: config.source.schema.clone(),
            target_schema: config.target.schema.clone(),
            threads: config.resolution.get_threads(),
            channel_buffer: config.resolution.get_channel_buffer(),
        }
    }
}

/// Resolves table names, column datatypes and column defaults for a set of
/// tables against one loaded rule set.
pub struct Resolver {
    settings: ResolverSettings,
    rules: Arc<RuleSet>,
    catalog: Arc<dyn SourceCatalog>,
    cancel: CancellationToken,
}

impl Resolver {
    /// Load every rule collection for the run, then build the resolver.
    ///
    /// A rule store failure aborts here, before any table work is dispatched.
    /// `cancel` covers the load as well as every later phase.
    pub async fn new(
        settings: ResolverSettings,
        store: &dyn RuleStore,
        catalog: Arc<dyn SourceCatalog>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let started = Instant::now();
        let rules = RuleSet::load(
            store,
            settings.pair,
            &settings.source_schema,
            &settings.target_schema,
            &cancel,
        )
        .await?;
        info!(
            "Loaded rules for {} in {:.3}s",
            settings.pair,
            started.elapsed().as_secs_f64()
        );
        Ok(Self::from_rules(settings, rules, catalog).with_cancel(cancel))
    }

    /// Build a resolver over an already indexed rule set.
    pub fn from_rules(
        settings: ResolverSettings,
        rules: RuleSet,
        catalog: Arc<dyn SourceCatalog>,
    ) -> Self {
        Self {
            settings,
            rules: Arc::new(rules),
            catalog,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie the resolver to an outer cancellation token (e.g. Ctrl-C).
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Map every table to its target name. Tables without an override keep
    /// their own name, upper-cased.
    pub fn resolve_table_names(&self, tables: &[String]) -> TableNameMap {
        dedupe_tables(tables)
            .into_iter()
            .map(|table| {
                let source = table.to_uppercase();
                let target = self
                    .rules
                    .table_name(&source)
                    .map(str::to_uppercase)
                    .unwrap_or_else(|| source.clone());
                (source, target)
            })
            .collect()
    }

    /// Fetch each table's columns and resolve their target datatypes.
    pub async fn resolve_datatypes(&self, tables: &[String]) -> Result<DatatypeMap> {
        let started = Instant::now();
        let tables = dedupe_tables(tables);
        let count = tables.len();

        let datatypes = self
            .resolve_columns("datatypes", tables, resolve_table_datatypes)
            .await?;

        info!(
            "Resolved datatypes for {} tables in {:.3}s",
            count,
            started.elapsed().as_secs_f64()
        );
        Ok(datatypes)
    }

    /// Fetch each table's columns and resolve their target defaults.
    pub async fn resolve_defaults(&self, tables: &[String]) -> Result<DefaultMap> {
        let started = Instant::now();
        let tables = dedupe_tables(tables);
        let count = tables.len();

        let defaults = self
            .resolve_columns("defaults", tables, resolve_table_defaults)
            .await?;

        info!(
            "Resolved defaults for {} tables in {:.3}s",
            count,
            started.elapsed().as_secs_f64()
        );
        Ok(defaults)
    }

    /// Fetch each table's columns once, under the fan-out limits, and hand
    /// them to `resolve`.
    async fn resolve_columns<T, F>(
        &self,
        phase: &'static str,
        tables: Vec<String>,
        resolve: F,
    ) -> Result<BTreeMap<String, T>>
    where
        T: Send + 'static,
        F: Fn(&RuleSet, &str, &[ColumnMetadata]) -> T + Send + Sync + 'static,
    {
        let rules = self.rules.clone();
        let catalog = self.catalog.clone();
        let schema = self.settings.source_schema.clone();
        let resolve = Arc::new(resolve);

        let fan_out = FanOut {
            threads: self.settings.threads,
            channel_buffer: self.settings.channel_buffer,
            cancel: self.cancel.clone(),
        };
        fan_out
            .run(phase, tables, move |table| {
                let rules = rules.clone();
                let catalog = catalog.clone();
                let schema = schema.clone();
                let resolve = resolve.clone();
                async move {
                    let columns = fetch_columns(catalog.as_ref(), &schema, &table).await?;
                    Ok((*resolve)(rules.as_ref(), table.as_str(), &columns))
                }
            })
            .await
    }

    /// Resolve names, datatypes and defaults and assemble the report.
    ///
    /// Datatypes and defaults share one fetch per table.
    pub async fn run(&self, tables: &[String]) -> Result<ResolutionReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let tables = dedupe_tables(tables);

        info!(
            "Starting resolution run {}: {} {} -> {}, {} tables, {} threads",
            run_id,
            self.settings.pair,
            self.settings.source_schema,
            self.settings.target_schema,
            tables.len(),
            self.settings.threads
        );

        info!("Phase 1: Resolving table names");
        let table_names = self.resolve_table_names(&tables);

        info!("Phase 2: Resolving column datatypes and defaults");
        let phase_started = Instant::now();
        let resolved = self
            .resolve_columns("columns", tables.clone(), |rules, table, columns| {
                (
                    resolve_table_datatypes(rules, table, columns),
                    resolve_table_defaults(rules, table, columns),
                )
            })
            .await?;
        info!(
            "Resolved columns for {} tables in {:.3}s",
            resolved.len(),
            phase_started.elapsed().as_secs_f64()
        );

        let mut datatypes = DatatypeMap::new();
        let mut defaults = DefaultMap::new();
        for (table, (types, values)) in resolved {
            datatypes.insert(table.clone(), types);
            defaults.insert(table, values);
        }

        let digest = digest_maps(&table_names, &datatypes, &defaults)?;
        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let report = ResolutionReport {
            run_id,
            pair: self.settings.pair,
            source_schema: self.settings.source_schema.clone(),
            target_schema: self.settings.target_schema.clone(),
            started_at,
            completed_at,
            duration_seconds: duration,
            tables_total: tables.len(),
            table_names,
            datatypes,
            defaults,
            digest,
        };

        info!(
            "Resolution completed: {} tables in {:.1}s (digest {})",
            report.tables_total,
            report.duration_seconds,
            &report.digest[..12]
        );
        Ok(report)
    }
}

/// Fetch one table's columns, attributing any failure to the table.
async fn fetch_columns(
    catalog: &dyn SourceCatalog,
    schema: &str,
    table: &str,
) -> Result<Vec<ColumnMetadata>> {
    catalog
        .table_columns(schema, table)
        .await
        .map_err(|e| match e {
            MapError::CatalogFetch { .. } | MapError::Cancelled => e,
            other => MapError::catalog(table, other),
        })
}

/// Drop repeated table names (case-insensitive), keeping the first spelling.
fn dedupe_tables(tables: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tables.len());
    let mut unique = Vec::with_capacity(tables.len());
    for table in tables {
        if seen.insert(table.to_uppercase()) {
            unique.push(table.clone());
        } else {
            warn!("Table {} listed more than once, resolving it once", table);
        }
    }
    unique
}
