//! Guardian configuration parameters
//!
//! All calibration constants and feature flags for the guard-mode engine.
//! Values can be overridden through a [`ConfigPort`](crate::app::ports::ConfigPort)
//! or hot-reloaded with [`GuardCommand::UpdateConfig`](crate::app::commands::GuardCommand).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Accuracy class requested from the location source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationAccuracy {
    Balanced,
    High,
}

/// Feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub fall_detection: bool,
    pub audio_recording: bool,
    pub scream_detection: bool,
    pub blackout_mode: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            fall_detection: true,
            audio_recording: true,
            scream_detection: true,
            blackout_mode: true,
        }
    }
}

/// Core guardian configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    // --- Fall detection ---
    /// Magnitude (g) above which a sample counts as an impact.
    /// Real drops read 3-8 g; hand movement 1-2.5 g.
    pub fall_impact_threshold_g: f32,
    /// Magnitude (g) below which a post-impact sample counts as still.
    pub stillness_cutoff_g: f32,
    /// Contiguous stillness required after an impact (milliseconds).
    pub fall_stillness_duration_ms: u32,

    // --- Alert ---
    /// Seconds the user has to cancel before auto-SOS.
    pub countdown_secs: u16,

    // --- Sensor ---
    /// Accelerometer sample period (milliseconds).
    pub sensor_sample_period_ms: u32,

    // --- Microphone arbitration ---
    /// Settle delay before scream detection starts after arming (milliseconds).
    pub scream_start_delay_ms: u32,
    /// Settle delay before scream detection resumes after recording stops (milliseconds).
    pub scream_resume_delay_ms: u32,

    // --- Location ---
    /// Bounded wait for a fresh fix (milliseconds).
    pub location_timeout_ms: u32,
    pub location_accuracy: LocationAccuracy,

    // --- Emergency ---
    /// Phone number the alert is addressed to (digits, optional leading `+`).
    pub emergency_contact: String,

    // --- Blackout ---
    /// Taps needed to leave blackout mode.
    pub blackout_exit_taps: u8,
    /// Maximum gap between consecutive exit taps (milliseconds).
    pub blackout_tap_window_ms: u32,

    pub features: FeatureFlags,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            // Fall detection
            fall_impact_threshold_g: 3.0,
            stillness_cutoff_g: 0.3,
            fall_stillness_duration_ms: 2000,

            // Alert
            countdown_secs: 10,

            // Sensor
            sensor_sample_period_ms: 20, // 50 Hz

            // Microphone arbitration
            scream_start_delay_ms: 200,
            scream_resume_delay_ms: 500,

            // Location
            location_timeout_ms: 5000,
            location_accuracy: LocationAccuracy::High,

            // Emergency
            emergency_contact: String::from("9496064331"),

            // Blackout
            blackout_exit_taps: 3,
            blackout_tap_window_ms: 1000,

            features: FeatureFlags::default(),
        }
    }
}

impl GuardConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1.5..=16.0).contains(&self.fall_impact_threshold_g) {
            return Err(ConfigError::ValidationFailed(
                "fall_impact_threshold_g must be 1.5–16.0",
            ));
        }
        if !(0.05..=1.0).contains(&self.stillness_cutoff_g) {
            return Err(ConfigError::ValidationFailed(
                "stillness_cutoff_g must be 0.05–1.0",
            ));
        }
        if self.stillness_cutoff_g >= self.fall_impact_threshold_g {
            return Err(ConfigError::ValidationFailed(
                "stillness_cutoff_g must be < fall_impact_threshold_g",
            ));
        }
        if !(500..=10_000).contains(&self.fall_stillness_duration_ms) {
            return Err(ConfigError::ValidationFailed(
                "fall_stillness_duration_ms must be 500–10000",
            ));
        }
        if !(3..=60).contains(&self.countdown_secs) {
            return Err(ConfigError::ValidationFailed("countdown_secs must be 3–60"));
        }
        if !(5..=200).contains(&self.sensor_sample_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "sensor_sample_period_ms must be 5–200",
            ));
        }
        if self.scream_start_delay_ms > 5000 || self.scream_resume_delay_ms > 5000 {
            return Err(ConfigError::ValidationFailed(
                "scream settle delays must be ≤ 5000 ms",
            ));
        }
        if !(1000..=30_000).contains(&self.location_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "location_timeout_ms must be 1000–30000",
            ));
        }
        if !is_valid_contact(&self.emergency_contact) {
            return Err(ConfigError::ValidationFailed(
                "emergency_contact must be 3–16 digits with optional leading '+'",
            ));
        }
        if !(2..=5).contains(&self.blackout_exit_taps) {
            return Err(ConfigError::ValidationFailed(
                "blackout_exit_taps must be 2–5",
            ));
        }
        if !(200..=3000).contains(&self.blackout_tap_window_ms) {
            return Err(ConfigError::ValidationFailed(
                "blackout_tap_window_ms must be 200–3000",
            ));
        }
        Ok(())
    }
}

fn is_valid_contact(contact: &str) -> bool {
    let digits = contact.strip_prefix('+').unwrap_or(contact);
    (3..=16).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}
