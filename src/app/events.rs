//! Outbound guardian events.
//!
//! The [`Guardian`](super::service::Guardian) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide where they go (the log, a UI bridge, a test recorder).

use crate::dispatch::DispatchReport;
use crate::evidence::EvidenceFile;
use crate::fsm::context::AlertKind;

/// Structured events emitted by the guardian.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardEvent {
    /// The guardian finished initialization (carries the initial snapshot).
    Started(GuardSnapshot),

    GuardArmed,
    GuardDisarmed,

    /// Ambient scream detection switched on (`true`) or off (`false`).
    ScreamDetection(bool),

    /// A detector raised an alert; the countdown is running.
    AlertTriggered(AlertKind),

    /// One countdown second elapsed.
    CountdownTick { remaining: u16 },

    /// The user cancelled the countdown.
    AlertCancelled,

    /// The countdown ran out; auto-SOS follows.
    AlertExpired(AlertKind),

    RecordingStarted { filename: String },

    /// A capture finished and its file is ready for storage.
    EvidenceSaved(EvidenceFile),

    /// Outcome of one SOS dispatch, successful or not.
    SosDispatched(DispatchReport),

    BlackoutEntered,
    BlackoutExited,

    /// Accelerometer subscription failed; fall detection is inert.
    SensorUnavailable,

    /// A message the presentation layer must show to the user.
    Notice(UserNotice),
}

/// User-visible notices.  Only permission problems and dispatch outcomes
/// reach the user; every other failure is handled silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserNotice {
    PermissionsRequired,
    /// Dispatch went out without coordinates.
    LocationUnavailable,
    /// Neither channel could deliver the alert.
    DispatchFailed,
}

impl UserNotice {
    pub fn title(self) -> &'static str {
        match self {
            Self::PermissionsRequired => "Permissions Required",
            Self::LocationUnavailable => "Location Unavailable",
            Self::DispatchFailed => "Alert Failed",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::PermissionsRequired => {
                "Raksha needs Location and Microphone permissions to function properly."
            }
            Self::LocationUnavailable => {
                "Unable to retrieve your location. Alert will be sent without coordinates."
            }
            Self::DispatchFailed => {
                "Unable to send emergency alert. Please contact emergency services directly."
            }
        }
    }
}

/// Read-only view of guardian state for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardSnapshot {
    pub armed: bool,
    pub recording: bool,
    pub scream_detection_active: bool,
    pub alert_active: bool,
    pub alert_kind: Option<AlertKind>,
    pub countdown_remaining: u16,
    pub blackout: bool,
    /// [`Degradation`](crate::error::Degradation) bitmask.
    pub degradations: u8,
}
