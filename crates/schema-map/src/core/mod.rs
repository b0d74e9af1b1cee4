//! Core abstractions shared across resolution stages.
//!
//! - [`schema`]: engine identifiers and column metadata
//! - [`traits`]: the rule store and source catalog collaborators
//! - [`filter`]: include/exclude table filtering

pub mod filter;
pub mod schema;
pub mod traits;

pub use filter::TableFilter;
pub use schema::{ColumnMetadata, DbType, EnginePair};
pub use traits::{RuleStore, SourceCatalog};
