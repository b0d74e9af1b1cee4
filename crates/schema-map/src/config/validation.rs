//! Configuration validation.

use super::{CatalogConfig, Config};
use crate::error::{MapError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.schema.trim().is_empty() {
        return Err(MapError::Config("source.schema is required".into()));
    }
    if config.target.schema.trim().is_empty() {
        return Err(MapError::Config("target.schema is required".into()));
    }

    // Resolution only makes sense across engines
    if config.source.engine == config.target.engine {
        return Err(MapError::Config(format!(
            "source and target engines must differ, both are '{}'",
            config.source.engine
        )));
    }

    match &config.source.catalog {
        CatalogConfig::File { path } => {
            if path.as_os_str().is_empty() {
                return Err(MapError::Config("source.catalog.path is required".into()));
            }
        }
        CatalogConfig::Mysql(mysql) => {
            if mysql.host.is_empty() {
                return Err(MapError::Config("source.catalog.host is required".into()));
            }
            if mysql.user.is_empty() {
                return Err(MapError::Config("source.catalog.user is required".into()));
            }
            if let Some(0) = mysql.max_connections {
                return Err(MapError::Config(
                    "source.catalog.max_connections must be at least 1".into(),
                ));
            }
        }
    }

    // Resolution config validation - only check if explicitly set
    if let Some(0) = config.resolution.threads {
        return Err(MapError::Config(
            "resolution.threads must be at least 1".into(),
        ));
    }
    if let Some(0) = config.resolution.channel_buffer {
        return Err(MapError::Config(
            "resolution.channel_buffer must be at least 1".into(),
        ));
    }

    Ok(())
}
