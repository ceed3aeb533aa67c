//! Alert / countdown manager.
//!
//! Owns the one alert session the system may have in flight and decides
//! when countdown seconds are due.  Time is pulled, not pushed: the
//! guardian calls [`AlertManager::next_tick`] in a loop with the current
//! monotonic time, and every call yields at most one event.  A late poll
//! therefore replays each missed second as its own event instead of
//! skipping or merging them, and a [`cancel`](AlertManager::cancel)
//! between two polls is seen before the next second is counted.

use log::info;

use crate::fsm::context::{AlertContext, AlertKind};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

const TICK_MS: u64 = 1000;

/// One observable step of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTick {
    /// One second elapsed; `remaining` is the new value (reaches 0 once).
    Countdown { remaining: u16 },
    /// The countdown ran out.  Emitted exactly once per alert, after the
    /// `Countdown { remaining: 0 }` event, and the manager is back in
    /// `NoAlert` by the time the caller sees it.
    Expired(AlertKind),
}

pub struct AlertManager {
    fsm: Fsm,
    ctx: AlertContext,
    /// Monotonic time at which the next countdown event is due.
    next_due_ms: Option<u64>,
}

impl AlertManager {
    pub fn new(duration_secs: u16) -> Self {
        let mut ctx = AlertContext::new(duration_secs);
        let mut fsm = Fsm::new(build_state_table(), StateId::NoAlert);
        fsm.start(&mut ctx);
        Self {
            fsm,
            ctx,
            next_due_ms: None,
        }
    }

    /// Arm a countdown.  Returns `false` (and changes nothing) if an alert
    /// is already in flight.
    pub fn trigger(&mut self, kind: AlertKind, now_ms: u64) -> bool {
        if self.fsm.current_state() != StateId::NoAlert {
            info!("AlertManager: {} trigger dropped, alert already active", kind);
            return false;
        }
        self.ctx.kind = Some(kind);
        self.fsm.force_transition(StateId::Counting, &mut self.ctx);
        self.next_due_ms = Some(now_ms + TICK_MS);
        true
    }

    /// Stop the countdown and return to `NoAlert`.  Only valid while
    /// counting; returns `false` otherwise.
    pub fn cancel(&mut self) -> bool {
        if self.fsm.current_state() != StateId::Counting {
            return false;
        }
        self.next_due_ms = None;
        self.fsm.force_transition(StateId::NoAlert, &mut self.ctx);
        true
    }

    /// Yield the next due countdown event, if any.
    pub fn next_tick(&mut self, now_ms: u64) -> Option<AlertTick> {
        let due = self.next_due_ms?;
        if now_ms < due {
            return None;
        }

        match self.fsm.current_state() {
            StateId::Counting => {
                self.fsm.tick(&mut self.ctx);
                self.next_due_ms = if self.fsm.current_state() == StateId::Expired {
                    Some(due)
                } else {
                    Some(due + TICK_MS)
                };
                Some(AlertTick::Countdown {
                    remaining: self.ctx.remaining,
                })
            }
            StateId::Expired => {
                let kind = self.ctx.escalation.take();
                self.next_due_ms = None;
                self.fsm.force_transition(StateId::NoAlert, &mut self.ctx);
                kind.map(AlertTick::Expired)
            }
            StateId::NoAlert => {
                self.next_due_ms = None;
                None
            }
        }
    }

    /// Change the countdown length.  Takes effect from the next alert.
    pub fn set_duration(&mut self, duration_secs: u16) {
        self.ctx.duration_secs = duration_secs;
        if self.fsm.current_state() == StateId::NoAlert {
            self.ctx.remaining = duration_secs;
        }
    }

    pub fn is_active(&self) -> bool {
        self.fsm.current_state() != StateId::NoAlert
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn kind(&self) -> Option<AlertKind> {
        self.ctx.kind
    }

    pub fn remaining(&self) -> u16 {
        self.ctx.remaining
    }

    /// Configured countdown length.
    pub fn duration(&self) -> u16 {
        self.ctx.duration_secs
    }
}
