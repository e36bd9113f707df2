//! The public façade.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::{ConfigError, FolderPathsConfig};
use crate::environment::{ConfiguredEnvironment, EnvironmentProvider, SystemEnvironment};
use crate::error::{FolderPathsError, Result};
use crate::matcher::{self, FolderMatch};
use crate::normalize::CaseSensitivity;
use crate::path_table::{FolderEntry, FolderSnapshot, PathTable};
use crate::prober::DirectoryProber;
use crate::reloader::{ReloadSummary, Reloader};
use crate::scheduler::ReloadScheduler;
use crate::stats::ReloadStats;

/// Resolves paths to special folders from a cached snapshot.
///
/// The table starts empty: call [`reload`](Self::reload) at startup and
/// whenever the environment may have changed, or attach a
/// [`ReloadScheduler`] with [`start_scheduler`](Self::start_scheduler).
/// Matching never reloads implicitly.
///
/// `F` is an opaque filename policy owned by the application. The service
/// stores it and hands it back through [`filenames`](Self::filenames)
/// without looking at it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use folderpaths_core::{FolderPathsConfig, FolderPathsService};
/// use folderpaths_core::testing::FakeEnvironment;
///
/// let env = FakeEnvironment::new().with_folder("Documents", "/u/docs");
/// let config = FolderPathsConfig {
///     folders: Some(vec!["Documents".into()]),
///     ..FolderPathsConfig::default()
/// };
/// let service = FolderPathsService::new(Arc::new(env), config).unwrap();
/// service.reload().unwrap();
///
/// let found = service.match_best_special_folder("/u/docs/a.txt").unwrap();
/// assert_eq!(found.map(|m| m.name).as_deref(), Some("Documents"));
/// ```
pub struct FolderPathsService<F = ()> {
    reloader: Arc<Reloader>,
    config: FolderPathsConfig,
    filenames: F,
}

impl<F> std::fmt::Debug for FolderPathsService<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderPathsService")
            .field("reloader", &self.reloader)
            .field("case_sensitivity", &self.config.case_sensitivity)
            .finish_non_exhaustive()
    }
}

impl FolderPathsService<()> {
    /// Creates a service over `provider` without a filename policy.
    pub fn new<P>(provider: P, config: FolderPathsConfig) -> Result<Self, ConfigError>
    where
        P: EnvironmentProvider + 'static,
    {
        Self::with_filenames(provider, config, ())
    }

    /// Creates a service over the running host.
    pub fn system(config: FolderPathsConfig) -> Result<Self, ConfigError> {
        Self::new(SystemEnvironment::new(), config)
    }
}

impl<F> FolderPathsService<F> {
    /// Creates a service carrying the application's filename policy.
    ///
    /// Custom folders from `config` are layered over `provider`.
    pub fn with_filenames<P>(
        provider: P,
        config: FolderPathsConfig,
        filenames: F,
    ) -> Result<Self, ConfigError>
    where
        P: EnvironmentProvider + 'static,
    {
        config.validate()?;
        let names = config.folder_names()?;
        let provider = ConfiguredEnvironment::new(provider, config.custom.clone());
        let reloader = Reloader::new(
            Arc::new(provider),
            names,
            Arc::new(PathTable::new()),
            config.reload_timeout,
        );
        debug!(folders = reloader.names().len(), "Folder path service created");

        Ok(Self {
            reloader: Arc::new(reloader),
            config,
            filenames,
        })
    }

    /// Re-queries the environment and publishes a new snapshot.
    ///
    /// On failure the previous snapshot keeps being served.
    pub fn reload(&self) -> Result<ReloadSummary> {
        self.reloader.reload()
    }

    /// The folder that best contains `path`, or `None`.
    ///
    /// Fails with `InvalidArgument` for an empty or relative path.
    pub fn match_best_special_folder(&self, path: impl AsRef<Path>) -> Result<Option<FolderMatch>> {
        let snapshot = self.reloader.table().get();
        matcher::match_best_special_folder(path.as_ref(), &snapshot, self.case_sensitivity())
    }

    /// Every folder containing `path`, best first.
    pub fn matching_folders(&self, path: impl AsRef<Path>) -> Result<Vec<FolderMatch>> {
        let snapshot = self.reloader.table().get();
        matcher::matching_folders(path.as_ref(), &snapshot, self.case_sensitivity())
    }

    /// The resolved path of `name` in the current snapshot.
    pub fn folder_path(&self, name: &str) -> Result<PathBuf> {
        match self.reloader.table().get().get(name) {
            Some(Some(path)) => Ok(path.to_path_buf()),
            Some(None) => Err(FolderPathsError::FolderUnresolved(name.to_string())),
            None => Err(FolderPathsError::UnknownFolder(name.to_string())),
        }
    }

    /// All entries of the current snapshot, sorted by name.
    pub fn entries(&self) -> Vec<FolderEntry> {
        self.reloader.table().get().entries()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<FolderSnapshot> {
        self.reloader.table().get()
    }

    /// Makes sure the directory for `name` exists, creating it if needed.
    ///
    /// This is the only operation that touches the filesystem, and only
    /// through `prober`.
    #[instrument(level = "debug", skip(self, prober))]
    pub fn ensure_folder(&self, name: &str, prober: &dyn DirectoryProber) -> Result<PathBuf> {
        let path = self.folder_path(name)?;
        if prober.exists(&path) {
            return Ok(path);
        }

        prober
            .create_dir_all(&path)
            .map_err(|e| FolderPathsError::Materialize {
                path: path.clone(),
                message: e.to_string(),
            })?;
        info!(folder = name, path = %path.display(), "Created special folder");
        Ok(path)
    }

    /// Starts a scheduler over this service's reloader.
    ///
    /// Interval and enabled state come from the config; change them later
    /// through the returned handle. Dropping it stops scheduled reloads.
    pub fn start_scheduler(&self) -> io::Result<ReloadScheduler> {
        ReloadScheduler::start(
            Arc::clone(&self.reloader),
            self.config.reload_interval,
            self.config.periodic_reload,
        )
    }

    /// The application's filename policy.
    pub fn filenames(&self) -> &F {
        &self.filenames
    }

    /// Reload counters.
    pub fn stats(&self) -> &ReloadStats {
        self.reloader.stats()
    }

    /// Case policy used for matching.
    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.config.case_sensitivity
    }

    /// Names queried on each reload.
    pub fn folder_names(&self) -> &[String] {
        self.reloader.names()
    }

    /// The configuration the service was built from.
    pub fn config(&self) -> &FolderPathsConfig {
        &self.config
    }
}
