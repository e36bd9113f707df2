//! Service configuration.
//!
//! # Example
//!
//! ```toml
//! reload_interval = "10m"
//! reload_timeout = "5s"
//! periodic_reload = true
//! case_sensitivity = "insensitive"
//!
//! # Restrict the built-in catalogue (omit to load every folder)
//! folders = ["Home", "Documents", "Downloads"]
//!
//! [custom]
//! Projects = "~/src"
//! Scratch = "${SCRATCH_ROOT}/tmp"
//! ```
//!
//! Durations use humantime syntax (`"30s"`, `"5m"`, `"1h 30m"`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::folder::SpecialFolder;
use crate::normalize::CaseSensitivity;
use crate::reloader::DEFAULT_RELOAD_TIMEOUT;
use crate::scheduler::DEFAULT_RELOAD_INTERVAL;

/// Errors from loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// `folders` names something outside the built-in catalogue.
    #[error("unknown built-in folder '{0}' in `folders`")]
    UnknownFolder(String),

    /// A value is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Offending key.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Configuration for a [`FolderPathsService`](crate::FolderPathsService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolderPathsConfig {
    /// Period between scheduled reloads.
    #[serde(with = "humantime_serde")]
    pub reload_interval: Duration,

    /// Deadline for one complete provider pass.
    #[serde(with = "humantime_serde")]
    pub reload_timeout: Duration,

    /// Start the scheduler enabled.
    pub periodic_reload: bool,

    /// How paths are compared when matching.
    pub case_sensitivity: CaseSensitivity,

    /// Include built-in special folders.
    pub system_folders: bool,

    /// Restrict the built-in folders to these names. `None` loads all.
    pub folders: Option<Vec<String>>,

    /// Extra logical names mapped to path templates.
    pub custom: BTreeMap<String, String>,
}

impl Default for FolderPathsConfig {
    fn default() -> Self {
        Self {
            reload_interval: DEFAULT_RELOAD_INTERVAL,
            reload_timeout: DEFAULT_RELOAD_TIMEOUT,
            periodic_reload: false,
            case_sensitivity: CaseSensitivity::Host,
            system_folders: true,
            folders: None,
            custom: BTreeMap::new(),
        }
    }
}

impl FolderPathsConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FolderPathsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or returns the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks ranges and folder names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reload_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "reload_interval",
                reason: "must be greater than zero".into(),
            });
        }
        if self.reload_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "reload_timeout",
                reason: "must be greater than zero".into(),
            });
        }
        if let Some(name) = self.custom.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "custom",
                reason: format!("folder name {name:?} is blank"),
            });
        }
        self.builtin_folders().map(|_| ())
    }

    /// Logical names the reloader queries, built-ins first.
    ///
    /// A custom folder sharing a built-in's name replaces it.
    pub fn folder_names(&self) -> Result<Vec<String>, ConfigError> {
        let mut names: Vec<String> = self
            .builtin_folders()?
            .into_iter()
            .map(|folder| folder.name().to_string())
            .filter(|name| !self.custom.contains_key(name))
            .collect();
        names.extend(self.custom.keys().cloned());
        Ok(names)
    }

    fn builtin_folders(&self) -> Result<Vec<SpecialFolder>, ConfigError> {
        if !self.system_folders {
            return Ok(Vec::new());
        }
        let Some(folders) = &self.folders else {
            return Ok(SpecialFolder::ALL.to_vec());
        };

        let mut selected = Vec::with_capacity(folders.len());
        for name in folders {
            let folder: SpecialFolder = name
                .parse()
                .map_err(|_| ConfigError::UnknownFolder(name.clone()))?;
            if !selected.contains(&folder) {
                selected.push(folder);
            }
        }
        Ok(selected)
    }
}
