//! MySQL/TiDB source catalog over `INFORMATION_SCHEMA`.
//!
//! Only compiled with the `mysql` feature. Uses SQLx for connection pooling;
//! each `table_columns` call checks out one pooled connection.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::Row;
use tracing::{debug, info};

use crate::config::MysqlCatalogConfig;
use crate::core::schema::{ColumnMetadata, DbType};
use crate::core::traits::SourceCatalog;
use crate::error::{MapError, Result};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Live MySQL/TiDB catalog.
pub struct MysqlCatalog {
    pool: MySqlPool,
    db_type: DbType,
}

impl MysqlCatalog {
    /// Connect to the source and verify the connection.
    pub async fn connect(
        config: &MysqlCatalogConfig,
        db_type: DbType,
        max_conns: usize,
    ) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(MySqlSslMode::Preferred);

        let pool = MySqlPoolOptions::new()
            .max_connections(max_conns.max(1) as u32)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| MapError::Config(format!("connecting to MySQL catalog: {}", e)))?;

        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| MapError::Config(format!("testing MySQL catalog connection: {}", e)))?;

        info!(
            "Connected to {} catalog: {}:{}",
            db_type, config.host, config.port
        );

        Ok(Self { pool, db_type })
    }

    fn column_from_row(row: &MySqlRow) -> std::result::Result<ColumnMetadata, sqlx::Error> {
        Ok(ColumnMetadata {
            name: row.try_get("COLUMN_NAME")?,
            native_type: row.try_get("DATA_TYPE")?,
            length: row.try_get("data_length")?,
            precision: row.try_get::<i64, _>("data_precision")? as i32,
            scale: row.try_get::<i64, _>("data_scale")? as i32,
            nullable: row.try_get::<i64, _>("nullable")? == 1,
            default: row.try_get("COLUMN_DEFAULT")?,
            comment: row.try_get("COLUMN_COMMENT")?,
        })
    }
}

#[async_trait]
impl SourceCatalog for MysqlCatalog {
    async fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>> {
        // CAST string columns to CHAR and numerics to SIGNED to sidestep collation
        // and unsigned type differences. Datetime precision stands in for
        // numeric precision on temporal types.
        let query = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(UPPER(DATA_TYPE) AS CHAR(255)) AS DATA_TYPE,
                CAST(COALESCE(CHARACTER_MAXIMUM_LENGTH, 0) AS SIGNED) AS data_length,
                CAST(COALESCE(NUMERIC_PRECISION, DATETIME_PRECISION, 0) AS SIGNED) AS data_precision,
                CAST(COALESCE(NUMERIC_SCALE, 0) AS SIGNED) AS data_scale,
                IF(IS_NULLABLE = 'YES', 1, 0) AS nullable,
                CAST(COLUMN_DEFAULT AS CHAR(4000)) AS COLUMN_DEFAULT,
                CAST(COLUMN_COMMENT AS CHAR(1024)) AS COLUMN_COMMENT
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(schema)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MapError::catalog(table, e))?;

        if rows.is_empty() {
            return Err(MapError::catalog(
                table,
                format!("no columns found in schema {}", schema),
            ));
        }

        let columns = rows
            .iter()
            .map(Self::column_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MapError::catalog(table, e))?;

        debug!("{}.{}: {} columns", schema, table, columns.len());
        Ok(columns)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        let query = r#"
            SELECT CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(schema)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MapError::Config(format!("listing tables of {}: {}", schema, e)))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("TABLE_NAME"))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MapError::Config(format!("listing tables of {}: {}", schema, e)))
    }

    fn db_type(&self) -> DbType {
        self.db_type
    }
}
