//! CLI integration tests for schema-map.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes, and end-to-end resolution over file fixtures.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command for the schema-map binary.
fn cmd() -> Command {
    Command::cargo_bin("schema-map").unwrap()
}

const CATALOG: &str = r#"
shop:
  orders:
    - { name: id, native_type: int, precision: 10 }
    - { name: total, native_type: decimal, precision: 10, scale: 2 }
    - { name: created, native_type: datetime, default: CURRENT_TIMESTAMP }
    - { name: status, native_type: varchar, length: 16, default: new }
  customers:
    - { name: id, native_type: bigint, precision: 19 }
    - { name: notes, native_type: text }
  orders_bak:
    - { name: id, native_type: int, precision: 10 }
"#;

const RULES: &str = r#"
rule_sets:
  - source: mysql
    target: oracle
    table_names:
      - { source_schema: shop, target_schema: SHOP, source_table: customers, target_table: clients }
    column_datatypes:
      - { schema: shop, table: orders, column: total, source_type: "decimal(10,2)", target_type: "NUMBER(12,2)" }
"#;

const CONFIG: &str = r#"
source:
  engine: mysql
  schema: shop
  catalog:
    type: file
    path: catalog.yaml
target:
  engine: oracle
  schema: SHOP
rules: rules.yaml
resolution:
  threads: 2
  exclude_tables: ["*_bak"]
"#;

/// Write config, rules and catalog fixtures into a fresh directory.
fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "catalog.yaml", CATALOG);
    write(dir.path(), "rules.yaml", RULES);
    let config = write(dir.path(), "config.yaml", CONFIG);
    (dir, config)
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn resolve_json(config: &Path, extra: &[&str]) -> serde_json::Value {
    let output = cmd()
        .arg("--config")
        .arg(config)
        .args(["--output-json", "--verbosity", "error", "resolve"])
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("builtin"));
}

#[test]
fn test_resolve_subcommand_help() {
    cmd()
        .args(["resolve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--tables"))
        .stdout(predicate::str::contains("--threads"))
        .stdout(predicate::str::contains("--source-schema"))
        .stdout(predicate::str::contains("--target-schema"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("schema-map"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_global_flags_and_defaults() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"))
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// =============================================================================
// Configuration Error Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_1() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_invalid_yaml_exits_with_code_2() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source: [unclosed").unwrap();

    cmd()
        .arg("--config")
        .arg(file.path())
        .arg("check")
        .assert()
        .code(2);
}

#[test]
fn test_same_engines_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "source:\n  engine: mysql\n  schema: a\n  catalog: {{ type: file, path: x.yaml }}\ntarget:\n  engine: mysql\n  schema: b\n"
    )
    .unwrap();

    cmd()
        .arg("--config")
        .arg(file.path())
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_unknown_verbosity_rejected() {
    let (_dir, config) = fixture();
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["--verbosity", "loud", "check"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown verbosity"));
}

#[test]
fn test_zero_threads_rejected() {
    let (_dir, config) = fixture();
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["resolve", "--threads", "0"])
        .assert()
        .code(2);
}

// =============================================================================
// Check and Builtin Tests
// =============================================================================

#[test]
fn test_check_reports_rule_counts() {
    let (_dir, config) = fixture();
    cmd()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"))
        .stdout(predicate::str::contains("mysql->oracle"))
        .stdout(predicate::str::contains("Table name rules: 1"))
        .stdout(predicate::str::contains("0 schema, 0 table, 1 column"));
}

#[test]
fn test_builtin_lists_catalog() {
    let (_dir, config) = fixture();
    cmd()
        .arg("--config")
        .arg(&config)
        .arg("builtin")
        .assert()
        .success()
        .stdout(predicate::str::contains("DECIMAL"))
        .stdout(predicate::str::contains("VARCHAR2({length} CHAR)"));
}

#[test]
fn test_builtin_json_is_parseable() {
    let (_dir, config) = fixture();
    let output = cmd()
        .arg("--config")
        .arg(&config)
        .args(["--output-json", "builtin"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let catalog: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = catalog.as_array().unwrap();
    assert!(entries
        .iter()
        .any(|e| e["source_type"] == "INT" && e["target_type"] == "NUMBER(10,0)"));
}

// =============================================================================
// Resolve Tests
// =============================================================================

#[test]
fn test_resolve_whole_schema() {
    let (_dir, config) = fixture();
    let report = resolve_json(&config, &[]);

    // orders_bak is excluded by pattern
    assert_eq!(report["tables_total"], 2);
    assert_eq!(report["table_names"]["CUSTOMERS"], "CLIENTS");
    assert_eq!(report["table_names"]["ORDERS"], "ORDERS");

    let orders = &report["datatypes"]["orders"];
    assert_eq!(orders["id"], "NUMBER(10,0)");
    assert_eq!(orders["total"], "NUMBER(12,2)");
    assert_eq!(orders["created"], "DATE");
    assert_eq!(orders["status"], "VARCHAR2(16 CHAR)");
    assert_eq!(report["datatypes"]["customers"]["notes"], "CLOB");

    let defaults = &report["defaults"]["orders"];
    assert_eq!(defaults["created"], "SYSDATE");
    assert_eq!(defaults["status"], "new");
    assert_eq!(defaults["id"], "");
}

#[test]
fn test_resolve_explicit_tables() {
    let (_dir, config) = fixture();
    let report = resolve_json(&config, &["--tables", "orders,orders", "--threads", "1"]);

    assert_eq!(report["tables_total"], 1);
    assert_eq!(report["table_names"].as_object().unwrap().len(), 1);
    assert!(report["datatypes"].get("customers").is_none());
}

#[test]
fn test_resolve_is_repeatable() {
    let (_dir, config) = fixture();
    let first = resolve_json(&config, &["--threads", "1"]);
    let second = resolve_json(&config, &["--threads", "8"]);

    assert_eq!(first["digest"], second["digest"]);
    assert_eq!(first["datatypes"], second["datatypes"]);
    assert_ne!(first["run_id"], second["run_id"]);
}

#[test]
fn test_resolve_unknown_table_exits_with_code_4() {
    let (_dir, config) = fixture();
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["resolve", "--tables", "orders,ghost"])
        .assert()
        .code(4)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_resolve_text_output() {
    let (_dir, config) = fixture();
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["resolve", "--tables", "customers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolution completed!"))
        .stdout(predicate::str::contains("customers -> CLIENTS"))
        .stdout(predicate::str::contains("NUMBER(19,0)"));
}

#[test]
fn test_json_log_format() {
    let (_dir, config) = fixture();
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["--log-format", "json", "check"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\"level\":\"INFO\""));
}
