//! Platform-specific configuration paths

use crate::error::{CliError, CliResult};
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "FOLLOWLIST_CONFIG_DIR";

/// Configuration paths for the followlist CLI
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Base configuration directory
    pub config_dir: PathBuf,
    /// Path to config.json
    pub config_file: PathBuf,
    /// Path to session.json
    pub session_file: PathBuf,
    /// Path to credentials.enc (fallback encrypted file)
    pub credentials_file: PathBuf,
    /// Path to recent_handles.json
    pub recent_handles_file: PathBuf,
}

impl ConfigPaths {
    /// Get configuration paths for the current platform
    ///
    /// Paths:
    /// - Linux: ~/.config/followlist/
    /// - macOS: ~/Library/Application Support/followlist/
    /// - Windows: %APPDATA%\followlist\
    pub fn new() -> CliResult<Self> {
        Ok(Self::in_dir(Self::get_config_dir()?))
    }

    /// Paths rooted at an explicit directory
    pub fn in_dir(config_dir: impl AsRef<Path>) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            config_file: config_dir.join("config.json"),
            session_file: config_dir.join("session.json"),
            credentials_file: config_dir.join("credentials.enc"),
            recent_handles_file: config_dir.join("recent_handles.json"),
            config_dir,
        }
    }

    /// Get the configuration directory, respecting FOLLOWLIST_CONFIG_DIR
    fn get_config_dir() -> CliResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let base_dir = dirs::config_dir().ok_or_else(|| {
            CliError::Config("Could not determine configuration directory".to_string())
        })?;

        Ok(base_dir.join("followlist"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_dir_exists(&self) -> CliResult<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }
}
