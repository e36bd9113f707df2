//! Reload counters for observability.
//!
//! All counters are relaxed atomics: they are monotone tallies read for
//! display, never used for synchronization.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use serde::Serialize;

/// Live reload statistics shared by the reloader and scheduler.
#[derive(Debug, Default)]
pub struct ReloadStats {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    coalesced: AtomicU64,
    ticks: AtomicU64,
    ticks_dropped: AtomicU64,
    last_duration_micros: AtomicU64,
    last_error: Mutex<Option<String>>,
    last_success: Mutex<Option<SystemTime>>,
}

impl ReloadStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_attempt(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self, elapsed: Duration) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.store_duration(elapsed);
        *self.last_success.lock() = Some(SystemTime::now());
        *self.last_error.lock() = None;
    }

    pub(crate) fn record_failure(&self, elapsed: Duration, error: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.store_duration(elapsed);
        *self.last_error.lock() = Some(error.to_string());
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tick_dropped(&self) {
        self.ticks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn store_duration(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.last_duration_micros.store(micros, Ordering::Relaxed);
    }

    /// Reloads that ran the provider (coalesced callers excluded).
    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::Relaxed)
    }

    /// Callers that joined an in-flight reload instead of starting one.
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    /// Timer ticks discarded because a scheduled reload was still pending.
    pub fn ticks_dropped(&self) -> u64 {
        self.ticks_dropped.load(Ordering::Relaxed)
    }

    /// Point-in-time copy for display.
    pub fn snapshot(&self) -> ReloadStatsSnapshot {
        let micros = self.last_duration_micros.load(Ordering::Relaxed);
        ReloadStatsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            ticks_dropped: self.ticks_dropped.load(Ordering::Relaxed),
            last_duration: (micros > 0).then(|| Duration::from_micros(micros)),
            last_error: self.last_error.lock().clone(),
            last_success: *self.last_success.lock(),
        }
    }
}

/// Serializable view of [`ReloadStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadStatsSnapshot {
    /// Reloads that ran the provider.
    pub attempted: u64,
    /// Reloads that published a snapshot.
    pub succeeded: u64,
    /// Reloads that kept the previous snapshot.
    pub failed: u64,
    /// Callers that shared an in-flight reload.
    pub coalesced: u64,
    /// Timer ticks observed.
    pub ticks: u64,
    /// Timer ticks discarded.
    pub ticks_dropped: u64,
    /// Wall time of the most recent reload.
    #[serde(with = "humantime_serde")]
    pub last_duration: Option<Duration>,
    /// Error of the most recent reload, cleared by a success.
    pub last_error: Option<String>,
    /// When a reload last succeeded.
    #[serde(with = "humantime_serde")]
    pub last_success: Option<SystemTime>,
}
