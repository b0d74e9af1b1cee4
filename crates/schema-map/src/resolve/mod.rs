//! Pure per-column resolution: default normalization and the rule cascade.

pub mod cascade;
pub mod normalize;

pub use cascade::{
    resolve_datatype, resolve_default, resolve_table_datatypes, resolve_table_defaults, ColumnMap,
};
pub use normalize::{is_default_sensitive, normalize_default, DEFAULT_SENSITIVE_TYPES};
