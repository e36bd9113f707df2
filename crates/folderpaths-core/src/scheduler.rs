//! Timer-driven reloads.
//!
//! [`ReloadScheduler`] owns two threads:
//!
//! - **timer**: sleeps on a condvar for the configured interval and turns
//!   each expiry into a reload request. It never reloads inline.
//! - **worker**: receives requests over a capacity-one channel and runs
//!   [`Reloader::reload`]. Failures are logged and counted; the loop keeps
//!   going.
//!
//! A tick that arrives while a scheduled reload is still pending or
//! running is dropped and counted in [`ReloadStats`](crate::ReloadStats).
//! Interval and enabled state change only through the scheduler's methods.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, trace, warn};

use crate::reloader::Reloader;

/// Default period between scheduled reloads.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct TimerState {
    interval: Duration,
    enabled: bool,
    shutdown: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<TimerState>,
    wake: Condvar,
    /// Set when a request is queued, cleared once the worker finishes it.
    pending: AtomicBool,
}

impl Shared {
    /// Hands one request to the worker unless one is already outstanding.
    fn request(&self, tx: &SyncSender<()>, reloader: &Reloader) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            reloader.stats().record_tick_dropped();
            debug!("Scheduled reload still pending, dropping tick");
            return false;
        }
        match tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                reloader.stats().record_tick_dropped();
                false
            }
            Err(TrySendError::Disconnected(())) => {
                self.pending.store(false, Ordering::Release);
                false
            }
        }
    }
}

/// Periodic reload driver for a [`Reloader`].
///
/// Dropping the scheduler stops both threads, waiting for a running reload
/// to finish.
pub struct ReloadScheduler {
    shared: Arc<Shared>,
    reloader: Arc<Reloader>,
    requests: Option<SyncSender<()>>,
    timer: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ReloadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ReloadScheduler")
            .field("interval", &state.interval)
            .field("enabled", &state.enabled)
            .field("pending", &self.shared.pending.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ReloadScheduler {
    /// Spawns the timer and worker threads.
    ///
    /// With `enabled == false` the timer idles until [`enable`](Self::enable);
    /// [`trigger`](Self::trigger) works either way.
    pub fn start(reloader: Arc<Reloader>, interval: Duration, enabled: bool) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState {
                interval,
                enabled,
                shutdown: false,
            }),
            wake: Condvar::new(),
            pending: AtomicBool::new(false),
        });
        let (tx, rx) = mpsc::sync_channel(1);

        let worker = {
            let shared = Arc::clone(&shared);
            let reloader = Arc::clone(&reloader);
            thread::Builder::new()
                .name("folderpaths-reload-worker".to_string())
                .spawn(move || worker_loop(&rx, &shared, &reloader))?
        };

        let timer = {
            let shared = Arc::clone(&shared);
            let reloader = Arc::clone(&reloader);
            let tx = tx.clone();
            thread::Builder::new()
                .name("folderpaths-reload-timer".to_string())
                .spawn(move || timer_loop(&shared, &tx, &reloader))
        };
        let timer = match timer {
            Ok(handle) => handle,
            Err(e) => {
                // Disconnect so the worker exits before we bail.
                drop(tx);
                let _ = worker.join();
                return Err(e);
            }
        };

        info!(?interval, enabled, "Reload scheduler started");

        Ok(Self {
            shared,
            reloader,
            requests: Some(tx),
            timer: Some(timer),
            worker: Some(worker),
        })
    }

    /// Changes the tick period. The next tick is due once the new interval
    /// has elapsed since the previous one.
    pub fn set_interval(&self, interval: Duration) {
        let mut state = self.shared.state.lock();
        state.interval = interval;
        self.shared.wake.notify_all();
        debug!(?interval, "Reload interval changed");
    }

    /// Current tick period.
    pub fn interval(&self) -> Duration {
        self.shared.state.lock().interval
    }

    /// Starts producing ticks.
    pub fn enable(&self) {
        let mut state = self.shared.state.lock();
        state.enabled = true;
        self.shared.wake.notify_all();
    }

    /// Stops producing ticks. A reload already running is not interrupted.
    pub fn disable(&self) {
        let mut state = self.shared.state.lock();
        state.enabled = false;
        self.shared.wake.notify_all();
    }

    /// True while the timer produces ticks.
    pub fn is_enabled(&self) -> bool {
        self.shared.state.lock().enabled
    }

    /// Requests one reload now.
    ///
    /// Returns `false` if a scheduled reload is already pending, in which
    /// case the request is dropped like a timer tick.
    pub fn trigger(&self) -> bool {
        match &self.requests {
            Some(tx) => self.shared.request(tx, &self.reloader),
            None => false,
        }
    }

    /// True while a scheduled reload is queued or running.
    pub fn is_pending(&self) -> bool {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Stops both threads and waits for them.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            self.shared.wake.notify_all();
        }

        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
        self.requests = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        info!("Reload scheduler stopped");
    }
}

impl Drop for ReloadScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn timer_loop(shared: &Shared, tx: &SyncSender<()>, reloader: &Reloader) {
    let mut state = shared.state.lock();
    // Settings changes recompute the deadline from here rather than
    // restarting the wait.
    let mut period_start = Instant::now();
    loop {
        if state.shutdown {
            break;
        }
        if !state.enabled {
            shared.wake.wait(&mut state);
            period_start = Instant::now();
            continue;
        }

        let interval = state.interval;
        let Some(due) = period_start.checked_add(interval) else {
            shared.wake.wait(&mut state);
            continue;
        };
        if Instant::now() < due {
            shared.wake.wait_until(&mut state, due);
            continue;
        }
        period_start = Instant::now();

        reloader.stats().record_tick();
        trace!(?interval, "Reload tick");
        shared.request(tx, reloader);
    }
}

fn worker_loop(rx: &Receiver<()>, shared: &Shared, reloader: &Reloader) {
    for () in rx {
        if let Err(e) = reloader.reload() {
            warn!(error = %e, "Scheduled reload failed, will retry on next tick");
        }
        shared.pending.store(false, Ordering::Release);
    }
    debug!("Reload worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_table::PathTable;
    use crate::testing::FakeEnvironment;

    fn reloader(env: &Arc<FakeEnvironment>) -> Arc<Reloader> {
        Arc::new(Reloader::new(
            Arc::clone(env) as Arc<dyn crate::EnvironmentProvider>,
            vec!["Documents".into()],
            Arc::new(PathTable::new()),
            Duration::from_secs(5),
        ))
    }

    fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        done()
    }

    #[test]
    fn test_ticks_drive_reloads() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        let reloader = reloader(&env);
        let scheduler =
            ReloadScheduler::start(Arc::clone(&reloader), Duration::from_millis(10), true).unwrap();

        assert!(wait_until(Duration::from_secs(5), || reloader.table().generation() >= 2));
        scheduler.shutdown();
        assert!(reloader.stats().snapshot().ticks >= 2);
    }

    #[test]
    fn test_disabled_scheduler_only_reloads_on_trigger() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        let reloader = reloader(&env);
        let scheduler =
            ReloadScheduler::start(Arc::clone(&reloader), Duration::from_millis(5), false).unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(reloader.table().generation(), 0);

        assert!(scheduler.trigger());
        assert!(wait_until(Duration::from_secs(5), || reloader.table().generation() == 1));
        assert!(!scheduler.is_enabled());
    }

    #[test]
    fn test_ticks_dropped_while_reload_pending() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        let reloader = reloader(&env);
        let scheduler =
            ReloadScheduler::start(Arc::clone(&reloader), Duration::from_secs(3600), false).unwrap();

        env.pause();
        assert!(scheduler.trigger());
        assert!(wait_until(Duration::from_secs(5), || env.blocked_queries() == 1));

        assert!(scheduler.is_pending());
        assert!(!scheduler.trigger());
        assert!(!scheduler.trigger());
        assert_eq!(reloader.stats().ticks_dropped(), 2);

        env.resume();
        assert!(wait_until(Duration::from_secs(5), || !scheduler.is_pending()));
        assert_eq!(env.query_count(), 1);
    }

    #[test]
    fn test_failed_tick_keeps_scheduler_running() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        env.set_unreachable(true);
        let reloader = reloader(&env);
        let scheduler =
            ReloadScheduler::start(Arc::clone(&reloader), Duration::from_millis(10), true).unwrap();

        assert!(wait_until(Duration::from_secs(5), || reloader.stats().snapshot().failed >= 2));
        env.set_unreachable(false);
        assert!(wait_until(Duration::from_secs(5), || reloader.table().generation() >= 1));
        drop(scheduler);
    }

    #[test]
    fn test_set_interval_takes_effect() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        let reloader = reloader(&env);
        let scheduler =
            ReloadScheduler::start(Arc::clone(&reloader), Duration::from_secs(3600), true).unwrap();

        thread::sleep(Duration::from_millis(30));
        assert_eq!(reloader.table().generation(), 0);

        scheduler.set_interval(Duration::from_millis(10));
        assert_eq!(scheduler.interval(), Duration::from_millis(10));
        assert!(wait_until(Duration::from_secs(5), || reloader.table().generation() >= 1));

        scheduler.disable();
        assert!(!scheduler.is_enabled());
    }

    #[test]
    fn test_frequent_setting_changes_do_not_starve_ticks() {
        let env = Arc::new(FakeEnvironment::new().with_folder("Documents", "/u/docs"));
        let reloader = reloader(&env);
        let scheduler =
            ReloadScheduler::start(Arc::clone(&reloader), Duration::from_millis(40), true).unwrap();

        let start = Instant::now();
        while reloader.table().generation() == 0 && start.elapsed() < Duration::from_secs(5) {
            scheduler.set_interval(Duration::from_millis(40));
            scheduler.enable();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(reloader.table().generation() >= 1);
        assert!(reloader.stats().snapshot().ticks >= 1);
    }
}
