//! Error types for special-folder resolution.
//!
//! Two layers exist:
//! - [`ProviderError`] is what an [`EnvironmentProvider`](crate::EnvironmentProvider)
//!   reports for a single lookup. The reloader decides whether it is fatal.
//! - [`FolderPathsError`] is what the public façade returns.
//!
//! "No match" is never an error: matching returns `Ok(None)` for a path
//! outside every known folder.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure reported by an environment provider for one lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The folder cannot be resolved on this host (not redirected, no such
    /// concept on this platform, ...). Only this entry is affected.
    #[error("special folder '{0}' is not available on this host")]
    FolderUnavailable(String),

    /// The provider itself cannot be queried. Aborts the whole reload.
    #[error("environment provider unreachable: {0}")]
    Unreachable(String),
}

impl ProviderError {
    /// Returns true if this failure must abort the whole reload.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderError::Unreachable(_))
    }
}

/// Errors surfaced by [`FolderPathsService`](crate::FolderPathsService).
///
/// The type is `Clone` so that callers coalesced onto one in-flight reload
/// all receive the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FolderPathsError {
    /// Malformed input path (empty, or relative where an absolute path is
    /// required).
    #[error("invalid path argument '{path}': {reason}")]
    InvalidArgument {
        /// The offending input, lossily converted for display.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A reload could not refresh the table. The previous snapshot is
    /// still being served.
    #[error("environment unavailable: {reason}")]
    EnvironmentUnavailable {
        /// Description of the underlying failure.
        reason: String,
    },

    /// The reload did not finish within its deadline.
    #[error("environment query timed out after {0:?}")]
    ReloadTimedOut(Duration),

    /// The named folder is not in the current snapshot.
    #[error("unknown special folder '{0}'")]
    UnknownFolder(String),

    /// The named folder is known but has no path on this host.
    #[error("special folder '{0}' has no path on this host")]
    FolderUnresolved(String),

    /// A directory prober operation failed.
    #[error("failed to materialize {}: {message}", path.display())]
    Materialize {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error message.
        message: String,
    },
}

impl FolderPathsError {
    pub(crate) fn invalid(path: impl Into<String>, reason: &'static str) -> Self {
        FolderPathsError::InvalidArgument {
            path: path.into(),
            reason,
        }
    }

    /// Returns true if this error means the served data may be stale.
    ///
    /// Timeouts count as an unavailable environment.
    pub fn is_environment_unavailable(&self) -> bool {
        matches!(
            self,
            FolderPathsError::EnvironmentUnavailable { .. } | FolderPathsError::ReloadTimedOut(_)
        )
    }
}

impl From<ProviderError> for FolderPathsError {
    fn from(err: ProviderError) -> Self {
        FolderPathsError::EnvironmentUnavailable {
            reason: err.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = FolderPathsError> = std::result::Result<T, E>;
