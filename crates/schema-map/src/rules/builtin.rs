//! Compiled-in builtin catalog.
//!
//! Used for an engine pair when the rule store carries no builtin entries of
//! its own. Entries are scanned in order, so narrower patterns come first.

use super::{BuiltinDatatypeRule, GlobalDefaultRule};
use crate::core::schema::{DbType, EnginePair};

/// Builtin datatype catalog for an engine pair (empty when none is shipped).
pub fn datatype_catalog(pair: EnginePair) -> Vec<BuiltinDatatypeRule> {
    match (pair.source, pair.target) {
        (DbType::Mysql | DbType::Tidb, DbType::Oracle) => mysql_to_oracle(),
        _ => Vec::new(),
    }
}

/// Builtin global default rewrites for an engine pair.
pub fn global_defaults(pair: EnginePair) -> Vec<GlobalDefaultRule> {
    match (pair.source, pair.target) {
        (DbType::Mysql | DbType::Tidb, DbType::Oracle) => {
            let rule = |source_type: &str, source_default: &str, target_default: &str| {
                GlobalDefaultRule {
                    source_type: source_type.to_string(),
                    source_default: source_default.to_string(),
                    target_default: target_default.to_string(),
                }
            };
            vec![
                rule("DATETIME", "CURRENT_TIMESTAMP", "SYSDATE"),
                rule("DATETIME", "now()", "SYSDATE"),
                rule("TIMESTAMP", "CURRENT_TIMESTAMP", "SYSTIMESTAMP"),
                rule("TIMESTAMP", "now()", "SYSTIMESTAMP"),
                rule("DATE", "curdate()", "TRUNC(SYSDATE)"),
            ]
        }
        _ => Vec::new(),
    }
}

fn mysql_to_oracle() -> Vec<BuiltinDatatypeRule> {
    let r = BuiltinDatatypeRule::new;
    vec![
        // Integer types
        r("TINYINT", "NUMBER(3,0)"),
        r("SMALLINT", "NUMBER(5,0)"),
        r("MEDIUMINT", "NUMBER(7,0)"),
        r("INT", "NUMBER(10,0)"),
        r("INTEGER", "NUMBER(10,0)"),
        r("BIGINT", "NUMBER(19,0)"),
        // Decimal/numeric
        r("DECIMAL", "NUMBER({precision},{scale})").when(r"^DECIMAL\(\d+,\d+\)$"),
        r("DECIMAL", "NUMBER"),
        r("NUMERIC", "NUMBER({precision},{scale})").when(r"^NUMERIC\(\d+,\d+\)$"),
        r("NUMERIC", "NUMBER"),
        // Floating point
        r("FLOAT", "BINARY_FLOAT"),
        r("REAL", "BINARY_FLOAT"),
        r("DOUBLE", "BINARY_DOUBLE"),
        r("DOUBLE PRECISION", "BINARY_DOUBLE"),
        // Character types; Oracle caps VARCHAR2 at 4000 bytes
        r("CHAR", "CHAR({length})").when(r"^CHAR\(\d+\)$"),
        r("CHAR", "CHAR(1)"),
        r("VARCHAR", "CLOB")
            .when(r"^VARCHAR\((\d{5,}|[5-9]\d{3}|4\d{2}[1-9]|4\d[1-9]\d|4[1-9]\d{2})\)$"),
        r("VARCHAR", "VARCHAR2({length} CHAR)").when(r"^VARCHAR\(\d+\)$"),
        r("VARCHAR", "VARCHAR2(4000 CHAR)"),
        r("TINYTEXT", "VARCHAR2(255 CHAR)"),
        r("TEXT", "CLOB"),
        r("MEDIUMTEXT", "CLOB"),
        r("LONGTEXT", "CLOB"),
        r("ENUM", "VARCHAR2({length} CHAR)").when(r"^ENUM\(\d+\)$"),
        r("SET", "VARCHAR2({length} CHAR)").when(r"^SET\(\d+\)$"),
        r("ENUM", "VARCHAR2(4000 CHAR)"),
        r("SET", "VARCHAR2(4000 CHAR)"),
        r("JSON", "CLOB"),
        // Binary types
        r("BIT", "RAW(8)"),
        r("BINARY", "RAW({length})").when(r"^BINARY\(\d+\)$"),
        r("BINARY", "RAW(1)"),
        r("VARBINARY", "RAW({length})").when(r"^VARBINARY\(\d+\)$"),
        r("VARBINARY", "RAW(2000)"),
        r("TINYBLOB", "BLOB"),
        r("BLOB", "BLOB"),
        r("MEDIUMBLOB", "BLOB"),
        r("LONGBLOB", "BLOB"),
        // Date/time types
        r("DATE", "DATE"),
        r("TIME", "DATE"),
        r("DATETIME", "DATE"),
        r("TIMESTAMP", "TIMESTAMP"),
        r("YEAR", "NUMBER"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_and_tidb_share_catalog() {
        let mysql = datatype_catalog(EnginePair::new(DbType::Mysql, DbType::Oracle));
        let tidb = datatype_catalog(EnginePair::new(DbType::Tidb, DbType::Oracle));
        assert!(!mysql.is_empty());
        assert_eq!(mysql, tidb);
    }

    #[test]
    fn test_unknown_pair_is_empty() {
        let pair = EnginePair::new(DbType::Postgres, DbType::Mssql);
        assert!(datatype_catalog(pair).is_empty());
        assert!(global_defaults(pair).is_empty());
    }

    #[test]
    fn test_patterns_precede_catch_all() {
        let catalog = mysql_to_oracle();
        let first_varchar = catalog
            .iter()
            .find(|r| r.source_type == "VARCHAR")
            .unwrap();
        assert!(first_varchar.attributes_pattern.is_some());
    }
}
