//! Deadline-bounded execution of blocking environment and filesystem calls.
//!
//! Environment queries can hang (an unresponsive session bus, a folder
//! redirected to an offline network share). Each call runs on its own
//! helper thread and the caller waits at most `timeout` for the answer.
//!
//! A helper thread that misses its deadline cannot be cancelled; it keeps
//! running until the blocking call returns. The pool counts such threads
//! and refuses new work once `max_blocked` of them are outstanding, so a
//! wedged provider cannot accumulate threads without bound.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

/// Default cap on helper threads still running past their deadline.
pub const MAX_BLOCKED_THREADS: usize = 8;

/// Why a bounded call produced no result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The call did not finish within its deadline.
    #[error("operation timed out after {0:?}")]
    TimedOut(Duration),

    /// Too many earlier calls are still stuck.
    #[error("{blocked} blocked helper threads (limit {max}); refusing new work")]
    Exhausted {
        /// Helper threads currently outstanding.
        blocked: usize,
        /// Configured limit.
        max: usize,
    },

    /// The helper thread panicked or could not be spawned.
    #[error("helper thread terminated unexpectedly")]
    Terminated,
}

/// Runs closures on helper threads with a deadline, tracking stuck threads.
///
/// Clones share the same counter.
#[derive(Debug, Clone)]
pub struct BoundedPool {
    name: &'static str,
    max_blocked: usize,
    outstanding: Arc<AtomicUsize>,
}

impl BoundedPool {
    /// Creates a pool whose helper threads are named after `name`.
    pub fn new(name: &'static str, max_blocked: usize) -> Self {
        Self {
            name,
            max_blocked,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Runs `op` on a helper thread and waits up to `timeout` for it.
    pub fn run_with_timeout<T, F>(&self, timeout: Duration, op: F) -> Result<T, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let current = self.outstanding.load(Ordering::Acquire);
        if current >= self.max_blocked {
            return Err(PoolError::Exhausted {
                blocked: current,
                max: self.max_blocked,
            });
        }

        let (tx, rx) = mpsc::channel();
        let outstanding = Arc::clone(&self.outstanding);

        self.outstanding.fetch_add(1, Ordering::AcqRel);
        let spawned = std::thread::Builder::new()
            .name(format!("{}-helper", self.name))
            .spawn(move || {
                // Released on return or unwind, whether or not anyone is
                // still waiting for the answer.
                let slot = SlotGuard(outstanding);
                let result = op();
                drop(slot);
                let _ = tx.send(result);
            });

        if let Err(e) = spawned {
            self.outstanding.fetch_sub(1, Ordering::AcqRel);
            tracing::error!(pool = self.name, error = %e, "Failed to spawn helper thread");
            return Err(PoolError::Terminated);
        }

        match rx.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    pool = self.name,
                    blocked_threads = self.outstanding.load(Ordering::Acquire),
                    max_allowed = self.max_blocked,
                    ?timeout,
                    "Blocking call missed its deadline; helper thread left running"
                );
                Err(PoolError::TimedOut(timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(PoolError::Terminated),
        }
    }

    /// Helper threads currently running (including ones past deadline).
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Configured limit.
    pub fn max_blocked(&self) -> usize {
        self.max_blocked
    }

    /// True once new work would be refused.
    pub fn is_exhausted(&self) -> bool {
        self.outstanding() >= self.max_blocked
    }
}

/// Gives a helper's slot back when the helper thread ends.
struct SlotGuard(Arc<AtomicUsize>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
