//! Snapshot (re)population from an environment provider.
//!
//! # Reload pipeline
//!
//! 1. Query the provider for every configured name on a helper thread,
//!    bounded by the reload timeout.
//! 2. Per-name failures become unresolved entries; an unreachable provider
//!    or a timeout aborts the reload.
//! 3. The complete mapping is published to the [`PathTable`] in one swap.
//!
//! An aborted reload publishes nothing, so readers keep the last good
//! snapshot.
//!
//! # Single writer, coalescing callers
//!
//! At most one reload runs at a time. A caller arriving while a reload is
//! in flight does not start another provider pass: it waits for the
//! in-flight reload to finish and returns that reload's result. When
//! `reload()` returns `Ok`, the published snapshot (or a newer one) is
//! visible to every subsequent reader.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::bounded_pool::{BoundedPool, MAX_BLOCKED_THREADS, PoolError};
use crate::environment::EnvironmentProvider;
use crate::error::{FolderPathsError, ProviderError, Result};
use crate::normalize::{CaseSensitivity, NormalizedPath};
use crate::path_table::{FolderEntries, PathTable};
use crate::stats::ReloadStats;

/// Default deadline for one complete provider pass.
pub const DEFAULT_RELOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a successful reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    /// Generation of the published snapshot.
    pub generation: u64,
    /// Names that resolved to a path.
    pub resolved: usize,
    /// Names recorded without a path.
    pub unresolved: Vec<String>,
    /// Whether the mapping differs from the previous snapshot.
    pub changed: bool,
    /// True if this caller shared another caller's reload.
    pub coalesced: bool,
}

#[derive(Debug, Default)]
struct Flight {
    in_flight: bool,
    completed: u64,
    last: Option<Result<ReloadSummary>>,
}

/// Populates a [`PathTable`] from an [`EnvironmentProvider`].
pub struct Reloader {
    provider: Arc<dyn EnvironmentProvider>,
    names: Vec<String>,
    table: Arc<PathTable>,
    timeout: Duration,
    pool: BoundedPool,
    flight: Mutex<Flight>,
    finished: Condvar,
    stats: Arc<ReloadStats>,
}

impl std::fmt::Debug for Reloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reloader")
            .field("names", &self.names)
            .field("timeout", &self.timeout)
            .field("generation", &self.table.generation())
            .finish_non_exhaustive()
    }
}

impl Reloader {
    /// Creates a reloader that resolves `names` into `table`.
    pub fn new(
        provider: Arc<dyn EnvironmentProvider>,
        names: Vec<String>,
        table: Arc<PathTable>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            names,
            table,
            timeout,
            pool: BoundedPool::new("folderpaths-reload", MAX_BLOCKED_THREADS),
            flight: Mutex::new(Flight::default()),
            finished: Condvar::new(),
            stats: Arc::new(ReloadStats::new()),
        }
    }

    /// Logical names queried on every reload.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The table this reloader writes.
    pub fn table(&self) -> &Arc<PathTable> {
        &self.table
    }

    /// Shared statistics.
    pub fn stats(&self) -> &Arc<ReloadStats> {
        &self.stats
    }

    /// Deadline for one provider pass.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True while a reload is running.
    pub fn is_reloading(&self) -> bool {
        self.flight.lock().in_flight
    }

    /// Rebuilds and publishes the snapshot.
    ///
    /// Fails with `EnvironmentUnavailable` or `ReloadTimedOut`, leaving the
    /// previous snapshot in place. Coalesces with an in-flight reload.
    #[instrument(level = "debug", name = "folderpaths::reload", skip(self))]
    pub fn reload(&self) -> Result<ReloadSummary> {
        let mut flight = self.flight.lock();

        if flight.in_flight {
            let joined = flight.completed;
            self.stats.record_coalesced();
            debug!("Reload already in flight, waiting for its result");
            while flight.completed == joined {
                self.finished.wait(&mut flight);
            }
            return match flight.last.clone() {
                Some(Ok(mut summary)) => {
                    summary.coalesced = true;
                    Ok(summary)
                }
                Some(Err(e)) => Err(e),
                None => Err(FolderPathsError::EnvironmentUnavailable {
                    reason: "in-flight reload finished without a result".into(),
                }),
            };
        }

        flight.in_flight = true;
        drop(flight);

        let mut landing = Landing {
            reloader: self,
            result: None,
        };
        let result = self.run_pass();
        landing.result = Some(result.clone());
        result
    }

    fn run_pass(&self) -> Result<ReloadSummary> {
        let started = Instant::now();
        self.stats.record_attempt();

        let provider = Arc::clone(&self.provider);
        let names = self.names.clone();
        let outcome = self
            .pool
            .run_with_timeout(self.timeout, move || build_entries(provider.as_ref(), &names));

        let entries = match outcome {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => return Err(self.abort(started, e.into())),
            Err(PoolError::TimedOut(t)) => {
                return Err(self.abort(started, FolderPathsError::ReloadTimedOut(t)));
            }
            Err(e) => {
                let err = FolderPathsError::EnvironmentUnavailable {
                    reason: e.to_string(),
                };
                return Err(self.abort(started, err));
            }
        };

        let changed = self.table.get().as_map() != &entries;
        let unresolved: Vec<String> = entries
            .iter()
            .filter(|(_, path)| path.is_none())
            .map(|(name, _)| name.clone())
            .collect();
        let resolved = entries.len() - unresolved.len();

        let snapshot = self.table.set(entries);
        let elapsed = started.elapsed();
        self.stats.record_success(elapsed);

        info!(
            generation = snapshot.generation(),
            resolved,
            unresolved = unresolved.len(),
            changed,
            ?elapsed,
            "Published special folder snapshot"
        );

        Ok(ReloadSummary {
            generation: snapshot.generation(),
            resolved,
            unresolved,
            changed,
            coalesced: false,
        })
    }

    fn abort(&self, started: Instant, err: FolderPathsError) -> FolderPathsError {
        let elapsed = started.elapsed();
        self.stats.record_failure(elapsed, &err.to_string());
        warn!(
            error = %err,
            ?elapsed,
            serving_generation = self.table.generation(),
            "Reload failed, keeping previous snapshot"
        );
        err
    }
}

/// Ends a flight and wakes coalesced waiters, even if the pass unwound.
struct Landing<'a> {
    reloader: &'a Reloader,
    result: Option<Result<ReloadSummary>>,
}

impl Drop for Landing<'_> {
    fn drop(&mut self) {
        let result = self.result.take().unwrap_or_else(|| {
            Err(FolderPathsError::EnvironmentUnavailable {
                reason: "reload panicked".into(),
            })
        });
        let mut flight = self.reloader.flight.lock();
        flight.in_flight = false;
        flight.completed += 1;
        flight.last = Some(result);
        self.reloader.finished.notify_all();
    }
}

/// Queries every name and assembles a complete mapping.
///
/// Per-name failures and non-absolute answers become `None`; only a fatal
/// provider error aborts.
fn build_entries(
    provider: &dyn EnvironmentProvider,
    names: &[String],
) -> std::result::Result<FolderEntries, ProviderError> {
    let mut entries = FolderEntries::new();

    for name in names {
        let path = match provider.folder_path(name) {
            Ok(Some(path)) => sanitize(name, path),
            Ok(None) => {
                debug!(folder = %name, "Folder not resolvable on this host");
                None
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!(folder = %name, error = %e, "Folder lookup failed, recording empty path");
                None
            }
        };
        entries.insert(name.clone(), path);
    }

    Ok(entries)
}

/// Rejects unmatchable answers (relative, not UTF-8) and strips trailing
/// separators.
fn sanitize(name: &str, path: PathBuf) -> Option<PathBuf> {
    if let Err(e) = NormalizedPath::new(&path, CaseSensitivity::Sensitive) {
        warn!(folder = %name, path = %path.display(), error = %e, "Provider returned an unusable path, ignoring");
        return None;
    }

    let text = path.to_str()?;
    let trimmed = text.trim_end_matches(['/', '\\']);
    // Keep roots ("/", "C:\") intact.
    if trimmed.is_empty() || trimmed.ends_with(':') {
        return Some(path);
    }
    Some(PathBuf::from(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEnvironment;
    use std::path::Path;

    fn reloader_for(env: Arc<FakeEnvironment>, names: &[&str]) -> Reloader {
        Reloader::new(
            env,
            names.iter().map(|n| (*n).to_string()).collect(),
            Arc::new(PathTable::new()),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_reload_publishes_snapshot() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs/"));
        let reloader = reloader_for(env, &["Documents", "Music"]);

        let summary = reloader.reload().unwrap();
        assert_eq!(summary.generation, 1);
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.unresolved, vec!["Music".to_string()]);
        assert!(summary.changed);

        let snapshot = reloader.table().get();
        assert_eq!(snapshot.get("Documents"), Some(Some(Path::new("/u/docs"))));
        assert_eq!(snapshot.get("Music"), Some(None));
    }

    #[test]
    fn test_reload_is_idempotent() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        let reloader = reloader_for(env, &["Documents"]);

        reloader.reload().unwrap();
        let first = reloader.table().get();
        let summary = reloader.reload().unwrap();
        let second = reloader.table().get();

        assert!(!summary.changed);
        assert_eq!(first.as_map(), second.as_map());
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn test_partial_failure_keeps_other_folders() {
        let env = Arc::new(
            FakeEnvironment::new()
                .with_folder("Documents", "/u/docs")
                .with_failing("Music"),
        );
        let reloader = reloader_for(env, &["Documents", "Music"]);

        let summary = reloader.reload().unwrap();
        assert_eq!(summary.unresolved, vec!["Music".to_string()]);
        assert_eq!(
            reloader.table().get().get("Documents"),
            Some(Some(Path::new("/u/docs")))
        );
    }

    #[test]
    fn test_unreachable_keeps_previous_snapshot() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        let reloader = reloader_for(Arc::clone(&env), &["Documents"]);
        reloader.reload().unwrap();

        env.set_folder("Documents", "/elsewhere");
        env.set_unreachable(true);
        let err = reloader.reload().unwrap_err();

        assert!(err.is_environment_unavailable());
        let snapshot = reloader.table().get();
        assert_eq!(snapshot.generation(), 1);
        assert_eq!(snapshot.get("Documents"), Some(Some(Path::new("/u/docs"))));
        assert_eq!(reloader.stats().snapshot().failed, 1);
    }

    #[test]
    fn test_timeout_keeps_previous_snapshot() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        let reloader = Reloader::new(
            Arc::clone(&env) as Arc<dyn EnvironmentProvider>,
            vec!["Documents".into()],
            Arc::new(PathTable::new()),
            Duration::from_millis(50),
        );
        reloader.reload().unwrap();

        env.set_delay(Duration::from_millis(400));
        let err = reloader.reload().unwrap_err();
        assert_eq!(err, FolderPathsError::ReloadTimedOut(Duration::from_millis(50)));
        assert_eq!(reloader.table().generation(), 1);
        assert!(!reloader.is_reloading());
    }

    #[test]
    fn test_relative_answer_is_unresolved() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "docs"));
        let reloader = reloader_for(env, &["Documents"]);
        reloader.reload().unwrap();
        assert_eq!(reloader.table().get().get("Documents"), Some(None));
    }

    #[test]
    fn test_sanitize_keeps_roots() {
        assert_eq!(sanitize("Root", PathBuf::from("/")), Some(PathBuf::from("/")));
        assert_eq!(sanitize("Drive", PathBuf::from("C:\\")), Some(PathBuf::from("C:\\")));
        assert_eq!(sanitize("Docs", PathBuf::from("/u/docs//")), Some(PathBuf::from("/u/docs")));
    }

    #[test]
    fn test_concurrent_reloads_coalesce() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        let reloader = Arc::new(reloader_for(Arc::clone(&env), &["Documents"]));
        env.pause();

        let leader = {
            let reloader = Arc::clone(&reloader);
            std::thread::spawn(move || reloader.reload())
        };
        while env.blocked_queries() == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }

        let follower = {
            let reloader = Arc::clone(&reloader);
            std::thread::spawn(move || reloader.reload())
        };
        while reloader.stats().coalesced() == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        env.resume();

        let leader = leader.join().unwrap().unwrap();
        let follower = follower.join().unwrap().unwrap();

        assert!(!leader.coalesced);
        assert!(follower.coalesced);
        assert_eq!(leader.generation, follower.generation);
        assert_eq!(env.query_count(), 1);
        assert_eq!(reloader.stats().attempted(), 1);
    }
}
