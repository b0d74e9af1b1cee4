//! Source catalog implementations.
//!
//! - [`StaticCatalog`]: YAML snapshot, always available
//! - [`MysqlCatalog`]: live MySQL/TiDB `INFORMATION_SCHEMA` (feature `mysql`)

#[cfg(feature = "mysql")]
mod mysql;
mod snapshot;

#[cfg(feature = "mysql")]
pub use mysql::MysqlCatalog;
pub use snapshot::StaticCatalog;

use std::sync::Arc;

use crate::config::{CatalogConfig, Config};
use crate::core::traits::SourceCatalog;
use crate::error::Result;

/// Open the source catalog described by the configuration.
pub async fn open_catalog(config: &Config) -> Result<Arc<dyn SourceCatalog>> {
    match &config.source.catalog {
        CatalogConfig::File { path } => {
            let catalog = StaticCatalog::load(config.source.engine, path)?;
            Ok(Arc::new(catalog))
        }
        #[cfg(feature = "mysql")]
        CatalogConfig::Mysql(mysql) => {
            let max_conns = mysql
                .max_connections
                .unwrap_or_else(|| config.resolution.get_threads());
            let catalog = MysqlCatalog::connect(mysql, config.source.engine, max_conns).await?;
            Ok(Arc::new(catalog))
        }
        #[cfg(not(feature = "mysql"))]
        CatalogConfig::Mysql(_) => Err(crate::error::MapError::Config(
            "source.catalog type 'mysql' requires the 'mysql' feature".into(),
        )),
    }
}
