//! Shared mutable context threaded through every countdown state handler.

use core::fmt;

use serde::{Deserialize, Serialize};

/// What raised the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    Fall,
    Scream,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fall => write!(f, "fall"),
            Self::Scream => write!(f, "scream"),
        }
    }
}

/// The single in-flight alert session.
pub struct AlertContext {
    /// Configured countdown length (seconds).
    pub duration_secs: u16,
    /// Seconds left before auto-SOS.  Equal to `duration_secs` outside `Counting`.
    pub remaining: u16,
    /// Kind of the active alert; `None` while no alert is in flight.
    pub kind: Option<AlertKind>,
    /// Set on entry to `Expired`; taken exactly once by the alert manager.
    pub escalation: Option<AlertKind>,
}

impl AlertContext {
    pub fn new(duration_secs: u16) -> Self {
        Self {
            duration_secs,
            remaining: duration_secs,
            kind: None,
            escalation: None,
        }
    }
}
