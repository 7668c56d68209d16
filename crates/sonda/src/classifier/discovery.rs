//! One-shot gate for the standard-prefix discovery pass.
//!
//! Discovery runs at most once per classifier. Concurrent first callers
//! block until the single runner finishes; later callers return immediately.

use parking_lot::{Condvar, Mutex};
use serde::Serialize;

/// Lifecycle of the discovery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryState {
    /// Nobody has asked for discovery yet.
    NotStarted,
    /// One caller is walking the standard tree.
    InProgress,
    /// Discovery finished (possibly with nothing found).
    Completed,
}

/// Mutex + condvar guarding [`DiscoveryState`].
#[derive(Debug)]
pub struct DiscoveryGate {
    state: Mutex<DiscoveryState>,
    finished: Condvar,
}

impl Default for DiscoveryGate {
    fn default() -> Self {
        Self {
            state: Mutex::new(DiscoveryState::NotStarted),
            finished: Condvar::new(),
        }
    }
}

impl DiscoveryGate {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> DiscoveryState {
        *self.state.lock()
    }

    /// Run `discover` unless it already ran or is running.
    ///
    /// Returns `true` for the caller that actually ran it. Waiters return
    /// `false` once the runner has finished. The gate moves to
    /// [`DiscoveryState::Completed`] even if `discover` panics, so a failed
    /// pass is never retried.
    pub fn run_once<F: FnOnce()>(&self, discover: F) -> bool {
        {
            let mut state = self.state.lock();
            loop {
                match *state {
                    DiscoveryState::Completed => return false,
                    DiscoveryState::InProgress => self.finished.wait(&mut state),
                    DiscoveryState::NotStarted => {
                        *state = DiscoveryState::InProgress;
                        break;
                    }
                }
            }
        }

        let _complete = CompleteOnDrop(self);
        discover();
        true
    }
}

struct CompleteOnDrop<'a>(&'a DiscoveryGate);

impl Drop for CompleteOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.state.lock() = DiscoveryState::Completed;
        self.0.finished.notify_all();
    }
}
