//! Resolution run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{DatatypeMap, DefaultMap, TableNameMap};
use crate::core::schema::EnginePair;
use crate::error::Result;

/// Result of a resolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Source and target engines.
    pub pair: EnginePair,

    pub source_schema: String,
    pub target_schema: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Tables resolved (after duplicate collapse).
    pub tables_total: usize,

    /// Upper-cased source table -> upper-cased target table.
    pub table_names: TableNameMap,

    /// Table -> column -> target type.
    pub datatypes: DatatypeMap,

    /// Table -> column -> target default literal ("" means none).
    pub defaults: DefaultMap,

    /// SHA-256 over the canonical JSON of the three maps.
    pub digest: String,
}

#[derive(Serialize)]
struct Maps<'a> {
    table_names: &'a TableNameMap,
    datatypes: &'a DatatypeMap,
    defaults: &'a DefaultMap,
}

/// Hex SHA-256 of the resolved maps. Maps are ordered, so equal inputs give
/// equal digests across runs.
pub fn digest_maps(
    table_names: &TableNameMap,
    datatypes: &DatatypeMap,
    defaults: &DefaultMap,
) -> Result<String> {
    let canonical = serde_json::to_vec(&Maps {
        table_names,
        datatypes,
        defaults,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}

impl ResolutionReport {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Recompute the digest and compare with the stored one.
    pub fn verify_digest(&self) -> Result<bool> {
        Ok(digest_maps(&self.table_names, &self.datatypes, &self.defaults)? == self.digest)
    }
}
