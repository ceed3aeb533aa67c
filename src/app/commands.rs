//! Inbound commands to the guardian.
//!
//! These represent intents forwarded by the presentation layer (buttons,
//! the SOS slider, the blackout screen) that the
//! [`Guardian`](super::service::Guardian) interprets and acts upon.

use crate::config::GuardConfig;

/// Commands that the presentation layer can send into the guardian.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardCommand {
    /// Arm or disarm guard mode.
    ToggleGuard,

    /// Start or stop evidence recording.
    ToggleRecording,

    /// Slide-to-activate SOS.
    ExplicitSos,

    /// "I'm OK" on the alert screen.
    CancelAlert,

    /// A touch on the blank blackout screen.
    BlackoutTap,

    /// Leave blackout immediately (e.g. hardware back button).
    ExitBlackout,

    /// Hot-reload configuration.  Rejected if it fails validation.
    UpdateConfig(GuardConfig),

    /// Stop the runtime loop.
    Shutdown,
}
