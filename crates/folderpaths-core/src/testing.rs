//! In-memory collaborators for tests and examples.
//!
//! - [`FakeEnvironment`] - a scriptable [`EnvironmentProvider`]: per-name
//!   failures, whole-provider outages, artificial latency, a pause gate and
//!   query counting
//! - [`MemoryProber`] - a [`DirectoryProber`] over an in-memory set of paths

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, RwLock};

use crate::environment::EnvironmentProvider;
use crate::error::ProviderError;
use crate::prober::DirectoryProber;

/// Scriptable environment provider.
///
/// Builder methods (`with_*`) configure the initial state; `set_*` methods
/// change it while a service is running, which is how tests simulate the
/// host environment changing between reloads.
#[derive(Debug, Default)]
pub struct FakeEnvironment {
    folders: RwLock<BTreeMap<String, PathBuf>>,
    failing: RwLock<BTreeSet<String>>,
    vars: RwLock<BTreeMap<String, String>>,
    unreachable: AtomicBool,
    delay: Mutex<Duration>,
    queries: AtomicU64,
    gate: Gate,
}

#[derive(Debug, Default)]
struct Gate {
    paused: Mutex<bool>,
    released: Condvar,
    blocked: AtomicUsize,
}

impl FakeEnvironment {
    /// Creates an empty environment: every folder is unresolvable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a folder.
    #[must_use]
    pub fn with_folder(self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.set_folder(name, path);
        self
    }

    /// Makes lookups of `name` fail with `FolderUnavailable`.
    #[must_use]
    pub fn with_failing(self, name: &str) -> Self {
        self.fail_folder(name);
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_var(self, name: &str, value: &str) -> Self {
        self.vars.write().insert(name.to_string(), value.to_string());
        self
    }

    /// Sets or replaces a folder path.
    pub fn set_folder(&self, name: &str, path: impl Into<PathBuf>) {
        self.failing.write().remove(name);
        self.folders.write().insert(name.to_string(), path.into());
    }

    /// Removes a folder so it resolves to nothing.
    pub fn remove_folder(&self, name: &str) {
        self.folders.write().remove(name);
    }

    /// Makes lookups of `name` fail with `FolderUnavailable`.
    pub fn fail_folder(&self, name: &str) {
        self.failing.write().insert(name.to_string());
    }

    /// Makes every lookup fail with `Unreachable` while set.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Adds latency to every folder lookup.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Blocks every subsequent folder lookup until [`resume`](Self::resume).
    pub fn pause(&self) {
        *self.gate.paused.lock() = true;
    }

    /// Releases lookups blocked by [`pause`](Self::pause).
    pub fn resume(&self) {
        let mut paused = self.gate.paused.lock();
        *paused = false;
        self.gate.released.notify_all();
    }

    /// Number of lookups currently parked on the pause gate.
    pub fn blocked_queries(&self) -> usize {
        self.gate.blocked.load(Ordering::SeqCst)
    }

    /// Total number of folder lookups served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    fn wait_for_gate(&self) {
        let mut paused = self.gate.paused.lock();
        if !*paused {
            return;
        }
        self.gate.blocked.fetch_add(1, Ordering::SeqCst);
        while *paused {
            self.gate.released.wait(&mut paused);
        }
        self.gate.blocked.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EnvironmentProvider for FakeEnvironment {
    fn folder_path(&self, name: &str) -> Result<Option<PathBuf>, ProviderError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate();

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ProviderError::Unreachable("fake environment is offline".into()));
        }
        if self.failing.read().contains(name) {
            return Err(ProviderError::FolderUnavailable(name.to_string()));
        }
        Ok(self.folders.read().get(name).cloned())
    }

    fn environment_variable(&self, name: &str) -> Option<String> {
        self.vars.read().get(name).cloned()
    }
}

/// Directory prober backed by an in-memory set of existing directories.
#[derive(Debug, Default)]
pub struct MemoryProber {
    existing: Mutex<BTreeSet<PathBuf>>,
    read_only: AtomicBool,
}

impl MemoryProber {
    /// Creates a prober where nothing exists yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `path` as existing.
    #[must_use]
    pub fn with_existing(self, path: impl Into<PathBuf>) -> Self {
        self.existing.lock().insert(path.into());
        self
    }

    /// Makes every creation attempt fail with `PermissionDenied`.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Directories created or marked existing so far.
    pub fn existing(&self) -> Vec<PathBuf> {
        self.existing.lock().iter().cloned().collect()
    }
}

impl DirectoryProber for MemoryProber {
    fn exists(&self, path: &Path) -> bool {
        self.existing.lock().contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only prober"));
        }
        let mut existing = self.existing.lock();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            existing.insert(ancestor.to_path_buf());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fake_environment_modes() {
        let env = FakeEnvironment::new()
            .with_folder("Documents", "/u/docs")
            .with_failing("Music");

        assert_eq!(env.folder_path("Documents").unwrap(), Some(PathBuf::from("/u/docs")));
        assert_eq!(env.folder_path("Desktop").unwrap(), None);
        assert!(matches!(
            env.folder_path("Music"),
            Err(ProviderError::FolderUnavailable(_))
        ));

        env.set_unreachable(true);
        assert!(matches!(env.folder_path("Documents"), Err(ProviderError::Unreachable(_))));
        assert_eq!(env.query_count(), 4);
    }

    #[test]
    fn test_pause_gate_blocks_until_resume() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        env.pause();

        let worker = {
            let env = Arc::clone(&env);
            std::thread::spawn(move || env.folder_path("Documents"))
        };

        while env.blocked_queries() == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        env.resume();

        assert_eq!(worker.join().unwrap().unwrap(), Some(PathBuf::from("/u/docs")));
        assert_eq!(env.blocked_queries(), 0);
    }

    #[test]
    fn test_memory_prober_creates_ancestors() {
        let prober = MemoryProber::new();
        prober.create_dir_all(Path::new("/u/docs/inbox")).unwrap();
        assert!(prober.exists(Path::new("/u/docs")));
        assert!(prober.exists(Path::new("/u/docs/inbox")));

        prober.set_read_only(true);
        let err = prober.create_dir_all(Path::new("/x")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
