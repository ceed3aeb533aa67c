//! Port traits: the hexagonal boundary between the guardian and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Guardian (domain)
//! ```
//!
//! Every external collaborator (accelerometer, microphone, location
//! provider, messaging apps, haptics, clock, config storage) is reached
//! through one of these traits.  The [`Guardian`](super::service::Guardian)
//! takes them as generics at call sites, so the domain core never touches
//! a platform API directly and every path is testable with mock adapters.
//!
//! ## Suspension points
//!
//! Only the audio, location and messaging ports are `async`: those are
//! the operations allowed to wait.  Sensor subscription, feedback and
//! event emission are synchronous and must return promptly.

#![allow(async_fn_in_trait)]

use chrono::{DateTime, FixedOffset};

use crate::config::{GuardConfig, LocationAccuracy};
use crate::dispatch::LocationFix;
use crate::error::{AudioError, ChannelError, LocationError, SensorError};
use crate::evidence::{EvidenceFile, EvidenceHandle, RecordingRequest};

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait Clock {
    /// Monotonic milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u64;

    /// Local wall-clock time, for message timestamps and evidence names.
    fn wall_clock(&self) -> DateTime<FixedOffset>;

    /// Suspend the calling task for `ms` milliseconds.
    async fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: accelerometer → domain)
// ───────────────────────────────────────────────────────────────

/// Accelerometer subscription.  Samples themselves arrive through the
/// inbox as [`GuardInput::Sample`](crate::events::GuardInput::Sample).
pub trait SensorSource {
    /// Start delivering samples every `period_ms`.
    fn subscribe(&mut self, period_ms: u32) -> Result<(), SensorError>;

    /// Stop delivering samples.  Idempotent.
    fn unsubscribe(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Audio port (the single exclusive microphone)
// ───────────────────────────────────────────────────────────────

/// Microphone access.  The guardian guarantees recording and ambient
/// listening are never requested at the same time.
pub trait AudioCapture {
    async fn request_permission(&mut self) -> bool;

    async fn start_recording(
        &mut self,
        request: RecordingRequest,
    ) -> Result<EvidenceHandle, AudioError>;

    async fn stop_recording(&mut self, handle: EvidenceHandle) -> Result<EvidenceFile, AudioError>;

    /// Begin amplitude sampling.  Sustained loud audio is reported
    /// through the inbox as [`GuardInput::LoudSustained`](crate::events::GuardInput::LoudSustained).
    async fn start_ambient_listening(&mut self) -> Result<(), AudioError>;

    async fn stop_ambient_listening(&mut self) -> Result<(), AudioError>;
}

// ───────────────────────────────────────────────────────────────
// Location port
// ───────────────────────────────────────────────────────────────

pub trait LocationSource {
    async fn request_permission(&mut self) -> bool;

    /// Fresh fix, waiting at most `timeout_ms`.
    async fn current_fix(
        &mut self,
        accuracy: LocationAccuracy,
        timeout_ms: u32,
    ) -> Result<LocationFix, LocationError>;

    /// Cached fix from the provider, if it has one.
    async fn last_known_fix(&mut self) -> Result<Option<LocationFix>, LocationError>;
}

// ───────────────────────────────────────────────────────────────
// Messaging port
// ───────────────────────────────────────────────────────────────

pub trait MessageChannel {
    /// Whether a handler is registered for `uri`.
    async fn can_open(&mut self, uri: &str) -> bool;

    async fn open(&mut self, uri: &str) -> Result<(), ChannelError>;
}

// ───────────────────────────────────────────────────────────────
// Feedback port (haptics / notification, advisory only)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCue {
    GuardArmed,
    GuardDisarmed,
    AlertTriggered,
    CountdownTick,
    SosActivated,
}

/// Fire-and-forget.  Implementations swallow their own failures.
pub trait Feedback {
    fn feedback(&mut self, cue: FeedbackCue);
}

// ───────────────────────────────────────────────────────────────
// Platform bundle
// ───────────────────────────────────────────────────────────────

/// Everything the guardian drives, as one bound.  A single adapter value
/// satisfies all ports, which avoids juggling several mutable borrows at
/// each call site.
pub trait Platform: Clock + SensorSource + AudioCapture + LocationSource + MessageChannel + Feedback {}

impl<T> Platform for T where
    T: Clock + SensorSource + AudioCapture + LocationSource + MessageChannel + Feedback
{
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / presentation)
// ───────────────────────────────────────────────────────────────

/// The guardian emits structured [`GuardEvent`](super::events::GuardEvent)s
/// through this port.  Adapters decide where they go (log, UI bridge, test
/// recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::GuardEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`GuardConfig`].
///
/// Implementations MUST validate before persisting and after loading.
/// Invalid values are rejected with [`ConfigError::ValidationFailed`],
/// never clamped.
pub trait ConfigPort {
    /// Returns [`GuardConfig::default()`] if nothing is stored yet.
    fn load(&self) -> Result<GuardConfig, ConfigError>;

    fn save(&self, config: &GuardConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations and [`GuardConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` names the field and the constraint.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
