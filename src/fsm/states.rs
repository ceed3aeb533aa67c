//! Countdown state handlers and table builder.
//!
//! ```text
//!  NO_ALERT ──[trigger]──▶ COUNTING ──[remaining = 0]──▶ EXPIRED
//!     ▲                       │                             │
//!     └──────[cancel]─────────┘                             │
//!     └─────────────────[escalation taken]──────────────────┘
//! ```

use super::context::AlertContext;
use super::{StateDescriptor, StateId};
use log::{info, warn};

/// Build the static state table.  Called once per alert manager.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: NoAlert
        StateDescriptor {
            id: StateId::NoAlert,
            name: "NoAlert",
            on_enter: Some(no_alert_enter),
            on_exit: None,
            on_update: no_alert_update,
        },
        // Index 1: Counting
        StateDescriptor {
            id: StateId::Counting,
            name: "Counting",
            on_enter: Some(counting_enter),
            on_exit: Some(counting_exit),
            on_update: counting_update,
        },
        // Index 2: Expired
        StateDescriptor {
            id: StateId::Expired,
            name: "Expired",
            on_enter: Some(expired_enter),
            on_exit: None,
            on_update: expired_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  NO_ALERT
// ═══════════════════════════════════════════════════════════════════════════

fn no_alert_enter(ctx: &mut AlertContext) {
    ctx.remaining = ctx.duration_secs;
    ctx.kind = None;
    ctx.escalation = None;
}

fn no_alert_update(_ctx: &mut AlertContext) -> Option<StateId> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COUNTING
// ═══════════════════════════════════════════════════════════════════════════

fn counting_enter(ctx: &mut AlertContext) {
    ctx.remaining = ctx.duration_secs;
    if let Some(kind) = ctx.kind {
        info!("COUNTING: {} alert, auto-SOS in {}s", kind, ctx.duration_secs);
    }
}

fn counting_exit(ctx: &mut AlertContext) {
    info!("COUNTING: left with {}s remaining", ctx.remaining);
}

fn counting_update(ctx: &mut AlertContext) -> Option<StateId> {
    ctx.remaining = ctx.remaining.saturating_sub(1);
    if ctx.remaining == 0 {
        return Some(StateId::Expired);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  EXPIRED: escalation pending hand-off to the SOS path
// ═══════════════════════════════════════════════════════════════════════════

fn expired_enter(ctx: &mut AlertContext) {
    ctx.escalation = ctx.kind;
    warn!("EXPIRED: countdown elapsed without cancel, escalating to auto-SOS");
}

fn expired_update(_ctx: &mut AlertContext) -> Option<StateId> {
    Some(StateId::NoAlert)
}
