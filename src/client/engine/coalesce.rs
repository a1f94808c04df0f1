//! Refresh coalescing.
//!
//! At most one refresh per collection runs at a time. Triggers that arrive
//! while it is in flight are absorbed into a single flag, and the refresh
//! runs exactly once more after the current pass instead of once per
//! trigger.

use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    rerun: bool,
}

#[derive(Debug, Default)]
pub struct RefreshGate {
    state: Mutex<GateState>,
    idle: Notify,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the caller should run the refresh. Otherwise the
    /// request is folded into the in-flight one.
    pub fn try_begin(&self) -> bool {
        let mut state = self.state.lock();
        if state.in_flight {
            state.rerun = true;
            false
        } else {
            state.in_flight = true;
            true
        }
    }

    /// End a pass. Returns true when absorbed triggers require one more
    /// pass, in which case the gate stays held.
    pub fn finish(&self) -> bool {
        let mut state = self.state.lock();
        if state.rerun {
            state.rerun = false;
            return true;
        }
        state.in_flight = false;
        drop(state);
        self.idle.notify_waiters();
        false
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    /// Wait until no refresh is running
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if !self.is_in_flight() {
                return;
            }
            notified.await;
        }
    }
}
