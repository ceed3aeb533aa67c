//! Typed error enums for every collaborator the guardian talks to.
//!
//! Each port returns its own small `Copy` error so the caller can match on
//! every variant.  None of these escape the [`Guardian`](crate::app::service::Guardian):
//! recoverable failures are logged and latched as [`Degradation`]s, and the
//! two user-visible ones (permissions, total dispatch failure) become
//! [`UserNotice`](crate::app::events::UserNotice)s.

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The device has no accelerometer.
    Unavailable,
    /// The platform refused the subscription (e.g. background restrictions).
    SubscribeFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "accelerometer unavailable"),
            Self::SubscribeFailed => write!(f, "sensor subscription failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Audio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioError {
    PermissionDenied,
    /// The microphone is held by another consumer.
    Busy,
    /// The recorder could not be prepared or started.
    StartFailed,
    /// Finalising the capture failed; no evidence file was produced.
    StopFailed,
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "microphone permission denied"),
            Self::Busy => write!(f, "microphone busy"),
            Self::StartFailed => write!(f, "audio start failed"),
            Self::StopFailed => write!(f, "audio stop failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Location errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    PermissionDenied,
    /// No fix within the bounded wait.
    Timeout,
    /// Location services are switched off or no provider is available.
    Unavailable,
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "location permission denied"),
            Self::Timeout => write!(f, "location fix timed out"),
            Self::Unavailable => write!(f, "location unavailable"),
        }
    }
}

// ---------------------------------------------------------------------------
// Messaging channel errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// No handler is registered for the URI scheme.
    NoHandler,
    /// A handler exists but refused to open the URI.
    OpenFailed,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHandler => write!(f, "no handler for URI"),
            Self::OpenFailed => write!(f, "URI open failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Why an SOS dispatch could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// No emergency contact is configured; nothing to address the alert to.
    NoEmergencyContact,
    /// Both the primary and the fallback channel failed.
    AllChannelsFailed {
        primary: ChannelError,
        fallback: ChannelError,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEmergencyContact => write!(f, "no emergency contact configured"),
            Self::AllChannelsFailed { primary, fallback } => {
                write!(f, "all channels failed (primary: {primary}, fallback: {fallback})")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Degradations
// ---------------------------------------------------------------------------

/// Soft failures that leave the guardian running with reduced capability.
/// Latched in a bitfield by [`HealthMonitor`](crate::health::HealthMonitor)
/// so several can be tracked and individually cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Degradation {
    /// Accelerometer subscription failed; fall detection is inert.
    SensorUnavailable = 0b0000_0001,
    /// Dispatch will go out without coordinates.
    LocationPermissionDenied = 0b0000_0010,
    /// Scream detection is suppressed; recording attempts may fail.
    MicrophonePermissionDenied = 0b0000_0100,
}

impl Degradation {
    pub const ALL: [Self; 3] = [
        Self::SensorUnavailable,
        Self::LocationPermissionDenied,
        Self::MicrophonePermissionDenied,
    ];

    /// Return the bitmask for this degradation.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorUnavailable => write!(f, "sensor unavailable"),
            Self::LocationPermissionDenied => write!(f, "location permission denied"),
            Self::MicrophonePermissionDenied => write!(f, "microphone permission denied"),
        }
    }
}
