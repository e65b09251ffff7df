use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::Config;

/// Application state and lifecycle manager
pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance from the config file at `config_path`
    /// (or the default location).
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let (config, _) = Config::load_validated(config_path)?;
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Ensure the data directory exists and return the database path
    pub fn initialize(&self) -> Result<PathBuf> {
        let db_path = self.config.database_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory {}", parent.display())
            })?;
        }

        tracing::info!("Application initialized (database: {})", db_path.display());
        Ok(db_path)
    }

    pub fn shutdown(&self) {
        tracing::info!("Shutting down application");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.config_dir = dir.path().join("nested");

        let app = App::with_config(config);
        let db_path = app.initialize().unwrap();

        assert!(dir.path().join("nested").is_dir());
        assert_eq!(db_path, dir.path().join("nested").join("saved_locations.db"));
    }
}
