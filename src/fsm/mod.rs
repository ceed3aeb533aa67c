//! Table-driven state machine behind the alert countdown.
//!
//! ```text
//!   StateId   on_enter   on_exit   on_update (once per countdown second)
//!   NoAlert   reload     -         stay
//!   Counting  reload     log       remaining -= 1, Expired at 0
//!   Expired   escalate   -         back to NoAlert
//! ```
//!
//! [`Fsm::tick`] runs `on_update` of the current row.  A returned
//! `Some(next)` runs `on_exit` of the current row and `on_enter` of the
//! next.  Handlers only see the [`AlertContext`]; when a second is due is
//! decided by the [`AlertManager`](crate::alert::AlertManager).

pub mod context;
pub mod states;

use context::AlertContext;
use log::info;

/// Alert lifecycle states.  The discriminant is the row index in the
/// table built by [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    NoAlert = 0,
    Counting = 1,
    Expired = 2,
}

impl StateId {
    pub const COUNT: usize = 3;

    pub const ALL: [Self; Self::COUNT] = [Self::NoAlert, Self::Counting, Self::Expired];

    /// Row index into the state table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for StateId {
    type Error = usize;

    fn try_from(idx: usize) -> Result<Self, Self::Error> {
        Self::ALL.get(idx).copied().ok_or(idx)
    }
}

/// `on_enter` / `on_exit` hook.
pub type StateActionFn = fn(&mut AlertContext);

/// Per-second handler; `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut AlertContext) -> Option<StateId>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

pub struct Fsm {
    table: [StateDescriptor; StateId::COUNT],
    current: StateId,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, row)| row.id.index() == i),
            "state table rows out of order"
        );
        Self {
            table,
            current: initial,
        }
    }

    fn row(&self, id: StateId) -> &StateDescriptor {
        &self.table[id.index()]
    }

    /// Run the initial state's `on_enter`.  Call once, before the first tick.
    pub fn start(&mut self, ctx: &mut AlertContext) {
        info!("Alert FSM starting in {}", self.row(self.current).name);
        if let Some(enter) = self.row(self.current).on_enter {
            enter(ctx);
        }
    }

    /// Process one countdown second.
    pub fn tick(&mut self, ctx: &mut AlertContext) {
        if let Some(next) = (self.row(self.current).on_update)(ctx) {
            self.enter(next, ctx);
        }
    }

    /// Jump straight to `next` (trigger, cancel, escalation hand-off).
    /// A jump to the current state is ignored.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut AlertContext) {
        if next != self.current {
            self.enter(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    fn enter(&mut self, next: StateId, ctx: &mut AlertContext) {
        info!(
            "Alert FSM: {} -> {}",
            self.row(self.current).name,
            self.row(next).name
        );
        if let Some(exit) = self.row(self.current).on_exit {
            exit(ctx);
        }
        self.current = next;
        if let Some(enter) = self.row(next).on_enter {
            enter(ctx);
        }
    }
}
