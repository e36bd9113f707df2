//! Environment providers: where raw special-folder paths come from.
//!
//! - [`EnvironmentProvider`] - the trait the reloader queries
//! - [`SystemEnvironment`] - the running host, via the `directories` crate
//! - [`ConfiguredEnvironment`] - layers configured custom folders over any
//!   provider, expanding `~` and `$VAR` templates through it

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use directories::{BaseDirs, UserDirs};

use crate::error::ProviderError;
use crate::folder::SpecialFolder;

/// Read-only source of special-folder paths and environment variables.
///
/// Implementations must be callable concurrently with themselves. Results
/// may change between calls; the service only observes changes through an
/// explicit reload.
pub trait EnvironmentProvider: Send + Sync {
    /// Resolves a logical folder name.
    ///
    /// `Ok(None)` and `Err(ProviderError::FolderUnavailable)` both record the
    /// folder as unresolvable. `Err(ProviderError::Unreachable)` aborts the
    /// reload that issued the query.
    fn folder_path(&self, name: &str) -> Result<Option<PathBuf>, ProviderError>;

    /// Reads an environment variable; `None` if unset.
    fn environment_variable(&self, name: &str) -> Option<String>;
}

impl<T: EnvironmentProvider + ?Sized> EnvironmentProvider for Arc<T> {
    fn folder_path(&self, name: &str) -> Result<Option<PathBuf>, ProviderError> {
        (**self).folder_path(name)
    }

    fn environment_variable(&self, name: &str) -> Option<String> {
        (**self).environment_variable(name)
    }
}

/// The special folders of the running host.
///
/// Every query re-reads the platform conventions (XDG user dirs, Known
/// Folders, Standard Directories), so a reload picks up redirections.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl SystemEnvironment {
    /// Creates a provider for the running host.
    pub fn new() -> Self {
        Self
    }

    fn resolve(folder: SpecialFolder) -> Result<Option<PathBuf>, ProviderError> {
        if folder == SpecialFolder::Temp {
            return Ok(Some(std::env::temp_dir()));
        }

        let base = BaseDirs::new()
            .ok_or_else(|| ProviderError::Unreachable("could not determine home directory".into()))?;

        let path = match folder {
            SpecialFolder::Home => Some(base.home_dir().to_path_buf()),
            SpecialFolder::AppData => Some(base.config_dir().to_path_buf()),
            SpecialFolder::LocalAppData => Some(base.data_local_dir().to_path_buf()),
            SpecialFolder::Cache => Some(base.cache_dir().to_path_buf()),
            SpecialFolder::Executables => base.executable_dir().map(|p| p.to_path_buf()),
            user_folder => {
                let Some(user) = UserDirs::new() else {
                    return Err(ProviderError::FolderUnavailable(user_folder.name().to_string()));
                };
                let dir = match user_folder {
                    SpecialFolder::Desktop => user.desktop_dir(),
                    SpecialFolder::Documents => user.document_dir(),
                    SpecialFolder::Downloads => user.download_dir(),
                    SpecialFolder::Music => user.audio_dir(),
                    SpecialFolder::Pictures => user.picture_dir(),
                    SpecialFolder::Videos => user.video_dir(),
                    SpecialFolder::Public => user.public_dir(),
                    SpecialFolder::Templates => user.template_dir(),
                    SpecialFolder::Fonts => user.font_dir(),
                    _ => None,
                };
                dir.map(|p| p.to_path_buf())
            }
        };

        Ok(path)
    }
}

impl EnvironmentProvider for SystemEnvironment {
    fn folder_path(&self, name: &str) -> Result<Option<PathBuf>, ProviderError> {
        let folder = name
            .parse::<SpecialFolder>()
            .map_err(|_| ProviderError::FolderUnavailable(name.to_string()))?;
        Self::resolve(folder)
    }

    fn environment_variable(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Adds configured custom folders on top of another provider.
///
/// Custom folders are path templates such as `~/src` or
/// `${PROJECTS_ROOT}/active`. `~` expands to the inner provider's `Home`
/// folder and variables come from the inner provider's environment. A
/// template referencing an unset variable makes only that folder
/// unavailable. Names not in the custom table are delegated unchanged.
#[derive(Debug, Clone)]
pub struct ConfiguredEnvironment<P> {
    inner: P,
    custom: BTreeMap<String, String>,
}

impl<P: EnvironmentProvider> ConfiguredEnvironment<P> {
    /// Wraps `inner` with the given `name -> template` table.
    pub fn new(inner: P, custom: BTreeMap<String, String>) -> Self {
        Self { inner, custom }
    }

    /// Names of the configured custom folders.
    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }

    fn expand(&self, name: &str, template: &str) -> Result<Option<PathBuf>, ProviderError> {
        let home = || {
            self.inner
                .folder_path(SpecialFolder::Home.name())
                .ok()
                .flatten()
                .map(|p| p.to_string_lossy().into_owned())
        };
        let lookup = |var: &str| -> Result<Option<String>, ProviderError> {
            match self.inner.environment_variable(var) {
                Some(value) => Ok(Some(value)),
                None => Err(ProviderError::FolderUnavailable(name.to_string())),
            }
        };

        match shellexpand::full_with_context(template, home, lookup) {
            Ok(expanded) => Ok(Some(PathBuf::from(expanded.as_ref()))),
            Err(e) => {
                tracing::debug!(
                    folder = name,
                    variable = %e.var_name,
                    "Custom folder template references an unset variable"
                );
                Err(e.cause)
            }
        }
    }
}

impl<P: EnvironmentProvider> EnvironmentProvider for ConfiguredEnvironment<P> {
    fn folder_path(&self, name: &str) -> Result<Option<PathBuf>, ProviderError> {
        match self.custom.get(name) {
            Some(template) => self.expand(name, template),
            None => self.inner.folder_path(name),
        }
    }

    fn environment_variable(&self, name: &str) -> Option<String> {
        self.inner.environment_variable(name)
    }
}
