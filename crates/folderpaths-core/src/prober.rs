//! Directory probing for callers that materialize resolved folders.
//!
//! The service never creates directories on its own; callers pass a
//! [`DirectoryProber`] to [`ensure_folder`](crate::FolderPathsService::ensure_folder)
//! when they want a resolved folder to exist on disk.

use std::io;
use std::path::Path;
use std::time::Duration;

use crate::bounded_pool::{BoundedPool, MAX_BLOCKED_THREADS, PoolError};

/// Default deadline for a single filesystem probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Answers existence questions and creates directories.
pub trait DirectoryProber: Send + Sync {
    /// True if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Creates `path` and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Prober over the real filesystem.
///
/// Each call runs with a deadline so a folder redirected to an unreachable
/// network share reports "missing" (or a timeout error) instead of hanging
/// the caller.
#[derive(Debug, Clone)]
pub struct FsProber {
    pool: BoundedPool,
    timeout: Duration,
}

impl FsProber {
    /// Creates a prober with the given per-call deadline.
    pub fn new(timeout: Duration) -> Self {
        Self {
            pool: BoundedPool::new("folderpaths-probe", MAX_BLOCKED_THREADS),
            timeout,
        }
    }
}

impl Default for FsProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl DirectoryProber for FsProber {
    fn exists(&self, path: &Path) -> bool {
        let path = path.to_path_buf();
        self.pool
            .run_with_timeout(self.timeout, move || std::fs::metadata(&path).is_ok())
            .unwrap_or(false)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let target = path.to_path_buf();
        match self
            .pool
            .run_with_timeout(self.timeout, move || std::fs::create_dir_all(&target))
        {
            Ok(result) => result,
            Err(PoolError::TimedOut(_)) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("creating {} timed out", path.display()),
            )),
            Err(e @ PoolError::Exhausted { .. }) => {
                Err(io::Error::new(io::ErrorKind::ResourceBusy, e.to_string()))
            }
            Err(e @ PoolError::Terminated) => Err(io::Error::other(e.to_string())),
        }
    }
}
