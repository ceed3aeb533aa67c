//! One-shot deferred-action queue.
//!
//! Settle delays (start scream detection shortly after arming, resume it
//! after a recording stops) are queued here instead of being captured in
//! closures.  The queue only knows *when* an action is due; the
//! [`Guardian`](crate::app::service::Guardian) re-checks its own state at
//! fire time and drops actions that no longer apply.
//!
//! ```text
//!  toggle_guard ──┐                       ┌──▶ StartScreamDetection
//!                 ├──▶ TimerQueue ──poll──┤
//!  stop_recording ┘   (fixed slots)       └──▶ ResumeScreamDetection
//! ```

use heapless::Vec;
use log::{debug, warn};

/// Maximum number of pending deferred actions (stack-allocated).
pub const MAX_TIMERS: usize = 4;

/// What to do when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Settle delay after arming guard mode.
    StartScreamDetection,
    /// Settle delay after evidence recording stopped.
    ResumeScreamDetection,
}

#[derive(Debug, Clone, Copy)]
struct Deferred {
    due_ms: u64,
    action: DeferredAction,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: Vec<Deferred, MAX_TIMERS>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to fire at `due_ms`.  An already-pending instance of
    /// the same action is replaced, so rapid re-arming never stacks
    /// restarts.  Returns `false` if the queue is full.
    pub fn schedule(&mut self, action: DeferredAction, due_ms: u64) -> bool {
        self.cancel(action);
        if self.pending.push(Deferred { due_ms, action }).is_err() {
            warn!("TimerQueue: full, dropping {:?}", action);
            return false;
        }
        debug!("TimerQueue: {:?} due at {}ms", action, due_ms);
        true
    }

    /// Drop every pending instance of `action`.  Returns `true` if any was removed.
    pub fn cancel(&mut self, action: DeferredAction) -> bool {
        let before = self.pending.len();
        self.pending.retain(|d| d.action != action);
        before != self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Remove and return the earliest action due at or before `now_ms`.
    /// Call repeatedly until it returns `None`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<DeferredAction> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, d)| d.due_ms <= now_ms)
            .min_by_key(|(_, d)| d.due_ms)
            .map(|(i, _)| i)?;
        Some(self.pending.swap_remove(idx).action)
    }

    pub fn is_pending(&self, action: DeferredAction) -> bool {
        self.pending.iter().any(|d| d.action == action)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
