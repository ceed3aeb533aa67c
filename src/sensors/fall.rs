//! Impact-then-stillness fall detector.
//!
//! ## Phases
//!
//! | Phase        | Entered when                                  | Output                |
//! |--------------|-----------------------------------------------|-----------------------|
//! | Idle         | start, `reset()`, or after a confirmed fall   | `FallPhase::Idle`     |
//! | ImpactSeen   | magnitude > impact threshold                  | `Impact`/`Monitoring` |
//! | FallConfirmed| stillness ≥ window since last movement        | `Fall` (then Idle)    |
//!
//! While an impact is pending, a sample under the stillness cutoff extends
//! the stillness run; any other sample restarts the stillness clock at its
//! own timestamp.  Movement never leaves `ImpactSeen` by itself: only a
//! fresh impact (which re-arms the clock) or a confirmed fall does.
//!
//! Non-finite and negative magnitudes are not signal.  They leave the state
//! untouched and are otherwise ignored.

use log::{debug, info};

use crate::config::GuardConfig;

/// Thresholds the detector runs against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallThresholds {
    pub impact_g: f32,
    pub stillness_cutoff_g: f32,
    pub stillness_window_ms: u64,
}

impl FallThresholds {
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            impact_g: config.fall_impact_threshold_g,
            stillness_cutoff_g: config.stillness_cutoff_g,
            stillness_window_ms: u64::from(config.fall_stillness_duration_ms),
        }
    }
}

impl Default for FallThresholds {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default())
    }
}

/// What the last processed sample did to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallPhase {
    /// No impact pending.
    Idle,
    /// This sample was an impact.
    Impact,
    /// An impact is pending and stillness is being timed.
    Monitoring,
    /// This sample confirmed a fall; the detector has reset to Idle.
    Fall,
}

/// Result of [`FallDetector::process_sample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallReading {
    pub phase: FallPhase,
    pub fall_detected: bool,
    /// Fraction of the stillness window elapsed, reported on still samples
    /// that have not yet confirmed a fall.
    pub stillness_progress: Option<f32>,
}

impl FallReading {
    const fn quiet(phase: FallPhase) -> Self {
        Self {
            phase,
            fall_detected: false,
            stillness_progress: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    Idle,
    ImpactSeen { impact_ms: u64, last_movement_ms: u64 },
}

pub struct FallDetector {
    thresholds: FallThresholds,
    state: DetectorState,
}

impl FallDetector {
    pub fn new(thresholds: FallThresholds) -> Self {
        Self {
            thresholds,
            state: DetectorState::Idle,
        }
    }

    /// Swap thresholds (config hot-reload).  Pending impacts are dropped.
    pub fn set_thresholds(&mut self, thresholds: FallThresholds) {
        self.thresholds = thresholds;
        self.reset();
    }

    pub fn thresholds(&self) -> FallThresholds {
        self.thresholds
    }

    /// Feed one magnitude sample.
    pub fn process_sample(&mut self, magnitude: f32, timestamp_ms: u64) -> FallReading {
        if !magnitude.is_finite() || magnitude < 0.0 {
            return FallReading::quiet(self.resting_phase());
        }

        if magnitude > self.thresholds.impact_g {
            debug!("FallDetector: impact {:.2} g at {} ms", magnitude, timestamp_ms);
            self.state = DetectorState::ImpactSeen {
                impact_ms: timestamp_ms,
                last_movement_ms: timestamp_ms,
            };
            return FallReading::quiet(FallPhase::Impact);
        }

        let DetectorState::ImpactSeen { impact_ms, last_movement_ms } = self.state else {
            return FallReading::quiet(FallPhase::Idle);
        };

        if magnitude >= self.thresholds.stillness_cutoff_g {
            self.state = DetectorState::ImpactSeen {
                impact_ms,
                last_movement_ms: timestamp_ms,
            };
            return FallReading::quiet(FallPhase::Monitoring);
        }

        let still_ms = timestamp_ms.saturating_sub(last_movement_ms);
        if still_ms >= self.thresholds.stillness_window_ms {
            info!(
                "FallDetector: fall confirmed, {} ms still ({} ms after impact)",
                still_ms,
                timestamp_ms.saturating_sub(impact_ms)
            );
            self.reset();
            return FallReading {
                phase: FallPhase::Fall,
                fall_detected: true,
                stillness_progress: None,
            };
        }

        FallReading {
            phase: FallPhase::Monitoring,
            fall_detected: false,
            stillness_progress: Some(still_ms as f32 / self.thresholds.stillness_window_ms as f32),
        }
    }

    /// Return to Idle from any state.
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
    }

    /// `true` while an impact is pending confirmation.
    pub fn impact_detected(&self) -> bool {
        matches!(self.state, DetectorState::ImpactSeen { .. })
    }

    /// Timestamp of the pending impact, if any.
    pub fn impact_time_ms(&self) -> Option<u64> {
        match self.state {
            DetectorState::ImpactSeen { impact_ms, .. } => Some(impact_ms),
            DetectorState::Idle => None,
        }
    }

    /// Timestamp of the last non-still sample since the pending impact.
    pub fn last_movement_ms(&self) -> Option<u64> {
        match self.state {
            DetectorState::ImpactSeen { last_movement_ms, .. } => Some(last_movement_ms),
            DetectorState::Idle => None,
        }
    }

    fn resting_phase(&self) -> FallPhase {
        if self.impact_detected() {
            FallPhase::Monitoring
        } else {
            FallPhase::Idle
        }
    }
}

impl Default for FallDetector {
    fn default() -> Self {
        Self::new(FallThresholds::default())
    }
}
