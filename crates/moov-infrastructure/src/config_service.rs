//! Configuration service implementation.
//!
//! Loads `MoovConfig` from `config.toml` (`~/.config/moov/config.toml` by
//! default), writing a file with defaults the first time.

use crate::paths::MoovPaths;
use crate::storage::AtomicTomlFile;
use moov_core::config::MoovConfig;
use moov_core::{MoovError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the configuration.
#[derive(Clone)]
pub struct ConfigService {
    file: Arc<AtomicTomlFile<MoovConfig>>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<MoovConfig>>>,
}

impl ConfigService {
    /// Service for the default config file location.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(MoovPaths::config_file()?))
    }

    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file is created with defaults. A file that exists but
    /// does not parse is an error; it is never overwritten.
    pub fn get_config(&self) -> Result<MoovConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|e| MoovError::internal(e.to_string()))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_or_create()?;

        {
            let mut write_lock = self
                .config
                .write()
                .map_err(|e| MoovError::internal(e.to_string()))?;
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// The session store location: the configured override or the default.
    pub fn store_path(&self, config: &MoovConfig) -> Result<PathBuf> {
        match &config.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(MoovPaths::sessions_file()?),
        }
    }

    fn load_or_create(&self) -> Result<MoovConfig> {
        match self.file.load()? {
            Some(config) => Ok(config),
            None => {
                let config = MoovConfig::default();
                self.file.save(&config)?;
                tracing::info!(path = %self.path().display(), "Created default config");
                Ok(config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::new(path.clone());

        let config = service.get_config().unwrap();

        assert_eq!(config, MoovConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_existing_file_is_read_and_cached() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "nick = \"bob\"\n[resolver]\nbinary = \"yt-dlp\"\n").unwrap();
        let service = ConfigService::new(path.clone());

        let config = service.get_config().unwrap();
        assert_eq!(config.nick, "bob");
        assert_eq!(config.resolver.binary, "yt-dlp");

        std::fs::write(&path, "nick = \"carol\"\n").unwrap();
        assert_eq!(service.get_config().unwrap().nick, "bob");
        assert_eq!(ConfigService::new(path).get_config().unwrap().nick, "carol");
    }

    #[test]
    fn test_broken_file_is_reported_not_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "nick = ").unwrap();
        let service = ConfigService::new(path.clone());

        assert!(service.get_config().is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "nick = ");
    }

    #[test]
    fn test_store_path_override() {
        let service = ConfigService::new(PathBuf::from("unused.toml"));
        let config = MoovConfig {
            store_path: Some(PathBuf::from("/tmp/s.json")),
            ..MoovConfig::default()
        };
        assert_eq!(
            service.store_path(&config).unwrap(),
            PathBuf::from("/tmp/s.json")
        );
    }
}
