//! # schema-map
//!
//! Resolves how a source schema lands on a different database engine.
//!
//! For a set of tables this library produces three maps that a DDL
//! generator consumes:
//!
//! - **Table names**: source table to target table, with overrides
//! - **Datatypes**: per column, chosen by a column > table > schema > builtin
//!   rule cascade
//! - **Defaults**: per column, normalized then chosen by a column > global
//!   rule cascade
//!
//! Table names come from a direct lookup. Column datatypes and defaults are
//! resolved concurrently under a configurable limit and merged by a single
//! aggregator; any failure fails the whole run.
//!
//! ## Example
//!
//! ```rust,no_run
//! use schema_map::{open_catalog, Config, Resolver, ResolverSettings, StaticRuleStore};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.yaml")?.with_auto_tuning();
//!     let store = match &config.rules {
//!         Some(path) => StaticRuleStore::load(path)?,
//!         None => StaticRuleStore::new(),
//!     };
//!     let catalog = open_catalog(&config).await?;
//!     let settings = ResolverSettings::from_config(&config);
//!     let cancel = CancellationToken::new();
//!     let resolver = Resolver::new(settings, &store, catalog, cancel).await?;
//!     let report = resolver.run(&["orders".to_string()]).await?;
//!     println!("{}", report.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod resolve;
pub mod rules;
pub mod source;
pub mod typemap;

// Re-exports for convenient access
pub use crate::core::{ColumnMetadata, DbType, EnginePair, RuleStore, SourceCatalog, TableFilter};
pub use config::{CatalogConfig, Config, ResolutionConfig, SourceConfig, TargetConfig};
pub use error::{MapError, Result};
pub use orchestrator::{
    DatatypeMap, DefaultMap, ResolutionReport, Resolver, ResolverSettings, TableNameMap,
};
pub use rules::{RuleDocument, RuleSet, StaticRuleStore};
pub use source::{open_catalog, StaticCatalog};
pub use typemap::BuiltinMapper;
