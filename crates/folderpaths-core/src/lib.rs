//! Special-folder path resolution with a snapshot cache.
//!
//! This crate keeps the locations of well-known folders (Documents,
//! AppData, Desktop, ...) in memory and answers "which special folder does
//! this path live in?" without touching the filesystem.
//!
//! # Components
//!
//! ## Resolution
//!
//! - [`FolderPathsService`] - Façade: reload, match, lookup, materialize
//! - [`match_best_special_folder`] / [`matching_folders`] - Pure
//!   longest-prefix matching over a snapshot
//! - [`NormalizedPath`] / [`CaseSensitivity`] - Lexical normalization
//!
//! ## Cache and refresh
//!
//! - [`PathTable`] - Atomically swapped [`FolderSnapshot`]
//! - [`Reloader`] - Builds snapshots from an [`EnvironmentProvider`],
//!   coalescing concurrent callers onto one provider pass
//! - [`ReloadScheduler`] - Timer and worker threads for periodic reloads
//! - [`ReloadStats`] - Counters for observability
//!
//! ## Collaborators
//!
//! - [`EnvironmentProvider`] - Source of raw folder paths; [`SystemEnvironment`]
//!   for the running host, [`ConfiguredEnvironment`] for custom folders
//! - [`DirectoryProber`] - Existence checks and directory creation;
//!   [`FsProber`] for the real filesystem
//! - [`testing`] - In-memory fakes of both
//!
//! # Consistency
//!
//! Readers always see one complete snapshot. A reload that fails or times
//! out publishes nothing, so the previous snapshot stays in service. Only
//! one reload runs at a time; concurrent callers share its result.
//!
//! # Example
//!
//! ```no_run
//! use folderpaths_core::{FolderPathsConfig, FolderPathsService};
//!
//! let service = FolderPathsService::system(FolderPathsConfig::default())?;
//! service.reload()?;
//!
//! if let Some(found) = service.match_best_special_folder("/home/ann/Documents/cv.pdf")? {
//!     println!("{} ({})", found.name, found.path.display());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

mod bounded_pool;
pub mod config;
pub mod environment;
pub mod error;
pub mod folder;
pub mod matcher;
pub mod normalize;
pub mod path_table;
pub mod prober;
pub mod reloader;
pub mod scheduler;
mod service;
pub mod stats;
pub mod testing;

pub use bounded_pool::{BoundedPool, MAX_BLOCKED_THREADS, PoolError};
pub use config::{ConfigError, FolderPathsConfig};
pub use environment::{ConfiguredEnvironment, EnvironmentProvider, SystemEnvironment};
pub use error::{FolderPathsError, ProviderError, Result};
pub use folder::{SpecialFolder, UnknownSpecialFolder};
pub use matcher::{FolderMatch, match_best_special_folder, matching_folders};
pub use normalize::{CaseSensitivity, NormalizedPath};
pub use path_table::{FolderEntries, FolderEntry, FolderSnapshot, PathTable};
pub use prober::{DEFAULT_PROBE_TIMEOUT, DirectoryProber, FsProber};
pub use reloader::{DEFAULT_RELOAD_TIMEOUT, ReloadSummary, Reloader};
pub use scheduler::{DEFAULT_RELOAD_INTERVAL, ReloadScheduler};
pub use service::FolderPathsService;
pub use stats::{ReloadStats, ReloadStatsSnapshot};
