//! Degradation monitor.
//!
//! Soft failures (sensor subscription refused, permission denied) do not
//! stop the guardian; they are latched here as a [`Degradation`] bitmask
//! so the rest of the engine and the presentation layer can see what is
//! currently impaired.
//!
//! ## Lifecycle
//!
//! 1. A failing operation reports its condition (e.g. subscribe failed).
//! 2. The monitor sets the corresponding bit and logs the change once.
//! 3. When a later attempt succeeds, the bit is cleared and logged.
//!
//! Several degradations can be active at once; each clears independently.

use crate::error::Degradation;
use log::{info, warn};

#[derive(Debug, Default)]
pub struct HealthMonitor {
    flags: u8,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a flag from a boolean condition.
    /// Returns `true` if the flag changed.
    pub fn report(&mut self, degradation: Degradation, active: bool) -> bool {
        let was = self.has(degradation);
        if active && !was {
            warn!("DEGRADED: {degradation}");
            self.flags |= degradation.mask();
        } else if !active && was {
            info!("RECOVERED: {degradation}");
            self.flags &= !degradation.mask();
        }
        was != active
    }

    pub fn has(&self, degradation: Degradation) -> bool {
        self.flags & degradation.mask() != 0
    }

    /// True if anything is degraded.
    pub fn is_degraded(&self) -> bool {
        self.flags != 0
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }
}
