//! Engine and column metadata types shared by every resolution stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MapError;

/// Relational engine a schema is migrated from or to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Mysql,
    Tidb,
    Oracle,
    Postgres,
    Mssql,
}

impl DbType {
    /// Lowercase identifier used in config files and rule documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Mysql => "mysql",
            DbType::Tidb => "tidb",
            DbType::Oracle => "oracle",
            DbType::Postgres => "postgres",
            DbType::Mssql => "mssql",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DbType::Mysql),
            "tidb" => Ok(DbType::Tidb),
            "oracle" => Ok(DbType::Oracle),
            "postgres" | "postgresql" => Ok(DbType::Postgres),
            "mssql" | "sqlserver" => Ok(DbType::Mssql),
            other => Err(MapError::Config(format!("unknown engine '{}'", other))),
        }
    }
}

/// Source/target engine pair. Every rule is keyed by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnginePair {
    pub source: DbType,
    pub target: DbType,
}

impl EnginePair {
    pub fn new(source: DbType, target: DbType) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for EnginePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// Column metadata as reported by the source catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,

    /// Native type name without attributes (e.g., "decimal", "varchar").
    pub native_type: String,

    /// Character length for string/binary types (0 when not applicable).
    #[serde(default)]
    pub length: i64,

    /// Numeric precision (0 when not applicable).
    #[serde(default)]
    pub precision: i32,

    /// Numeric scale.
    #[serde(default)]
    pub scale: i32,

    /// Whether the column allows NULL.
    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Raw default literal. `None` when the column has no default.
    #[serde(default)]
    pub default: Option<String>,

    /// Column comment.
    #[serde(default)]
    pub comment: String,
}

impl ColumnMetadata {
    /// Create a column with only a name and native type set.
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            length: 0,
            precision: 0,
            scale: 0,
            nullable: true,
            default: None,
            comment: String::new(),
        }
    }

    pub fn with_length(mut self, length: i64) -> Self {
        self.length = length;
        self
    }

    pub fn with_precision(mut self, precision: i32, scale: i32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Upper-cased native type name.
    pub fn type_name(&self) -> String {
        self.native_type.trim().to_uppercase()
    }

    /// Native type rendered with its attributes: `TYPE(p,s)`, `TYPE(len)` or `TYPE`.
    pub fn rendered_type(&self) -> String {
        let name = self.type_name();
        if self.precision > 0 {
            format!("{}({},{})", name, self.precision, self.scale)
        } else if self.length > 0 {
            format!("{}({})", name, self.length)
        } else {
            name
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_type() {
        let dec = ColumnMetadata::new("amount", "decimal").with_precision(10, 2);
        assert_eq!(dec.rendered_type(), "DECIMAL(10,2)");

        let vc = ColumnMetadata::new("name", "varchar").with_length(255);
        assert_eq!(vc.rendered_type(), "VARCHAR(255)");

        let dt = ColumnMetadata::new("created", "datetime");
        assert_eq!(dt.rendered_type(), "DATETIME");
    }

    #[test]
    fn test_db_type_parse() {
        assert_eq!("MySQL".parse::<DbType>().unwrap(), DbType::Mysql);
        assert_eq!("postgresql".parse::<DbType>().unwrap(), DbType::Postgres);
        assert!("db2".parse::<DbType>().is_err());
    }

    #[test]
    fn test_engine_pair_display() {
        let pair = EnginePair::new(DbType::Mysql, DbType::Oracle);
        assert_eq!(pair.to_string(), "mysql->oracle");
    }
}
