//! Unified path management for Moov files.
//!
//! Platform directories come from the `dirs` crate (XDG on Linux, the usual
//! locations on macOS and Windows).

use std::path::PathBuf;
use thiserror::Error;

const APP_NAME: &str = "moov";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Home directory could not be determined.
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

impl From<PathError> for moov_core::MoovError {
    fn from(err: PathError) -> Self {
        moov_core::MoovError::config(err.to_string())
    }
}

/// Unified path management for Moov.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/moov/              # Config directory
/// └── config.toml              # Application configuration
///
/// ~/.local/share/moov/         # Data directory
/// ├── sessions.json            # Remembered videos (session store)
/// └── logs/
///     └── moov.log.YYYY-MM-DD
/// ```
pub struct MoovPaths;

impl MoovPaths {
    /// Returns the Moov configuration directory (e.g., `~/.config/moov/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the Moov data directory (e.g., `~/.local/share/moov/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default location of the session store.
    pub fn sessions_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("sessions.json"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file() {
        let config_file = MoovPaths::config_file().unwrap();
        assert!(config_file.ends_with("moov/config.toml"));
        let config_dir = MoovPaths::config_dir().unwrap();
        assert!(config_file.starts_with(&config_dir));
    }

    #[test]
    fn test_sessions_file_under_data_dir() {
        let sessions = MoovPaths::sessions_file().unwrap();
        assert!(sessions.ends_with("sessions.json"));
        assert!(sessions.starts_with(MoovPaths::data_dir().unwrap()));
    }

    #[test]
    fn test_logs_dir() {
        let logs_dir = MoovPaths::logs_dir().unwrap();
        assert!(logs_dir.ends_with("logs"));
        assert!(logs_dir.starts_with(MoovPaths::data_dir().unwrap()));
    }
}
