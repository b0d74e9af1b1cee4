//! Configuration type definitions with auto-tuning based on system resources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use sysinfo::System;
use tracing::info;

use crate::core::schema::{DbType, EnginePair};

/// System resource information for auto-tuning.
#[derive(Debug, Clone)]
pub struct SystemResources {
    /// Total RAM in GB.
    pub total_memory_gb: f64,
    /// Number of CPU cores.
    pub cpu_cores: usize,
}

impl SystemResources {
    /// Detect system resources.
    pub fn detect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let total_memory_gb = sys.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
        let cpu_cores = sys.cpus().len();

        Self {
            total_memory_gb,
            cpu_cores,
        }
    }

    /// Log detected system resources.
    pub fn log(&self) {
        info!(
            "System resources: {:.1} GB RAM, {} CPU cores",
            self.total_memory_gb, self.cpu_cores
        );
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source engine, schema and catalog.
    pub source: SourceConfig,

    /// Target engine and schema.
    pub target: TargetConfig,

    /// Path to a YAML rule document. Without one only the builtin catalog applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<PathBuf>,

    /// Resolution run behavior.
    #[serde(default)]
    pub resolution: ResolutionConfig,
}

impl Config {
    /// Apply auto-tuned defaults based on system resources.
    /// Only fills in values that weren't explicitly set in the config file.
    pub fn with_auto_tuning(mut self) -> Self {
        let resources = SystemResources::detect();
        resources.log();
        self.resolution = self.resolution.with_auto_tuning(&resources);
        self
    }

    /// Engine pair every rule lookup is keyed by.
    pub fn engine_pair(&self) -> EnginePair {
        EnginePair::new(self.source.engine, self.target.engine)
    }
}

/// Source side of the migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source engine.
    pub engine: DbType,

    /// Source schema.
    pub schema: String,

    /// Where column metadata comes from.
    pub catalog: CatalogConfig,
}

/// Target side of the migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target engine.
    pub engine: DbType,

    /// Target schema.
    pub schema: String,
}

/// Source catalog backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogConfig {
    /// YAML snapshot of `schema -> table -> columns`.
    File { path: PathBuf },

    /// Live MySQL/TiDB `INFORMATION_SCHEMA` (requires the `mysql` feature).
    Mysql(MysqlCatalogConfig),
}

/// Connection settings for a live MySQL catalog.
#[derive(Clone, Serialize, Deserialize)]
pub struct MysqlCatalogConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Maximum pooled connections. Defaults to the resolution thread count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<usize>,
}

impl fmt::Debug for MysqlCatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlCatalogConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Resolution run configuration.
/// Performance fields use Option<T> to distinguish between
/// "not set" (use auto-tuned default) and "explicitly set" (use provided value).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResolutionConfig {
    /// Concurrent per-table resolution tasks. Auto-tuned based on CPU cores if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,

    /// Capacity of the channel feeding the aggregator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_buffer: Option<usize>,

    /// Explicit table list. Empty means every table the catalog lists.
    #[serde(default)]
    pub tables: Vec<String>,

    /// Tables to include (glob patterns).
    #[serde(default)]
    pub include_tables: Vec<String>,

    /// Tables to exclude (glob patterns).
    #[serde(default)]
    pub exclude_tables: Vec<String>,
}

impl ResolutionConfig {
    /// Apply auto-tuned defaults based on system resources.
    /// Only fills in values that are None (not explicitly set).
    pub fn with_auto_tuning(mut self, resources: &SystemResources) -> Self {
        // Catalog fetches are I/O bound: one task per core, 2-32
        if self.threads.is_none() {
            self.threads = Some(resources.cpu_cores.clamp(2, 32));
        }

        if self.channel_buffer.is_none() {
            self.channel_buffer = Some((self.get_threads() * 4).max(16));
        }

        info!(
            "Auto-tuned config: threads={}, channel_buffer={}",
            self.get_threads(),
            self.get_channel_buffer()
        );

        self
    }

    pub fn get_threads(&self) -> usize {
        self.threads.unwrap_or(4)
    }

    pub fn get_channel_buffer(&self) -> usize {
        self.channel_buffer.unwrap_or(64)
    }
}

fn default_mysql_port() -> u16 {
    3306
}
