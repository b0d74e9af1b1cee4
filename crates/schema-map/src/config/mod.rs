//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// Relative `rules` and catalog file paths are resolved against the
    /// directory holding the config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(dir) = path.parent() {
            config.rebase_paths(dir);
        }
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    fn rebase_paths(&mut self, dir: &Path) {
        if let Some(rules) = self.rules.as_mut() {
            if rules.is_relative() {
                *rules = dir.join(&*rules);
            }
        }
        if let CatalogConfig::File { path } = &mut self.source.catalog {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}
