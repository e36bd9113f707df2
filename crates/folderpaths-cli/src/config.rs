//! Configuration file location and loading.
//!
//! Lookup order:
//! 1. `--config <FILE>` (or `FOLDERPATHS_CONFIG`), which must exist
//! 2. `config.toml` in the platform config directory, e.g.
//!    `~/.config/folderpaths/config.toml` on Linux, defaults if absent

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folderpaths_core::FolderPathsConfig;

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from this file.
    File(PathBuf),
    /// No file found at this default location; built-in defaults apply.
    Defaults(PathBuf),
}

impl ConfigSource {
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::File(path) => path.display().to_string(),
            ConfigSource::Defaults(path) => format!("defaults ({} not found)", path.display()),
        }
    }
}

/// Default configuration file path.
pub fn config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("dev", "agucova", "folderpaths")
        .ok_or_else(|| anyhow::anyhow!("Could not determine configuration directory"))?;
    Ok(dirs.config_dir().join("config.toml"))
}

/// Loads the explicit file if given, otherwise the default one.
pub fn load(explicit: Option<&Path>) -> Result<(FolderPathsConfig, ConfigSource)> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let config = FolderPathsConfig::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    let path = config_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok((FolderPathsConfig::default(), ConfigSource::Defaults(path)));
    }

    let config = FolderPathsConfig::load(&path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))?;
    Ok((config, ConfigSource::File(path)))
}
