//! Error types for the resolution library.

use thiserror::Error;

/// Main error type for resolution runs.
#[derive(Error, Debug)]
pub enum MapError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A rule collection could not be fetched from the rule store
    #[error("Rule store error: {0}")]
    RuleStore(String),

    /// Column metadata could not be fetched for a specific table
    #[error("Catalog fetch failed for table {table}: {message}")]
    CatalogFetch { table: String, message: String },

    /// Malformed rule data (unparseable pattern, conflicting keys)
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// A per-table worker panicked
    #[error("Resolution task for table {table} panicked: {message}")]
    TaskPanicked { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run was cancelled (SIGINT, caller token, etc.)
    #[error("Resolution cancelled")]
    Cancelled,
}

impl MapError {
    /// Create a CatalogFetch error
    pub fn catalog(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MapError::CatalogFetch {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a RuleStore error with the collection that failed
    pub fn rule_store(collection: &str, message: impl std::fmt::Display) -> Self {
        MapError::RuleStore(format!("{}: {}", collection, message))
    }

    /// Exit code used by the CLI for this kind of failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            MapError::Config(_) | MapError::Yaml(_) => 2,
            MapError::RuleStore(_) | MapError::Resolution(_) => 3,
            MapError::CatalogFetch { .. } => 4,
            MapError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_names_table() {
        let err = MapError::catalog("ORDERS", "connection reset");
        assert_eq!(
            err.to_string(),
            "Catalog fetch failed for table ORDERS: connection reset"
        );
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "rules.yaml");
        let err = MapError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error: rules.yaml"));
    }
}
