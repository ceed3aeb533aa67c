//! SOS dispatch pipeline.
//!
//! ```text
//!  acquire location ──▶ compose message ──▶ primary link ──┐
//!  (fresh → last known    (template +          can_open?   │ no / open failed
//!   → placeholder)         timestamp)             │ yes    ▼
//!                                                 ▼     fallback link
//!                                              open()      open()
//! ```
//!
//! Every call is independent: it takes its own fresh fix and nothing is
//! de-duplicated across calls.  Location and channel failures are
//! recovered inside the pipeline; only the final outcome is reported.

pub mod location;
pub mod message;

use log::{error, info, warn};
use serde::Serialize;

use crate::app::ports::{Clock, LocationSource, MessageChannel};
use crate::config::{GuardConfig, LocationAccuracy};
use crate::error::{ChannelError, DispatchError};

pub use location::{GpsQuality, LocationFix};

/// Which channel carried the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryMethod {
    /// Messaging-app deep link.
    Primary,
    /// Native SMS.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub outcome: Result<DeliveryMethod, DispatchError>,
    /// Fix embedded in the message, `None` when the placeholder was used.
    pub location: Option<LocationFix>,
    pub message: String,
}

impl DispatchReport {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn method(&self) -> Option<DeliveryMethod> {
        self.outcome.ok()
    }
}

pub struct SosDispatcher {
    contact: String,
    accuracy: LocationAccuracy,
    timeout_ms: u32,
    attempts: u32,
}

impl SosDispatcher {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            contact: config.emergency_contact.clone(),
            accuracy: config.location_accuracy,
            timeout_ms: config.location_timeout_ms,
            attempts: 0,
        }
    }

    pub fn reconfigure(&mut self, config: &GuardConfig) {
        self.contact.clone_from(&config.emergency_contact);
        self.accuracy = config.location_accuracy;
        self.timeout_ms = config.location_timeout_ms;
    }

    /// Number of dispatches attempted since construction.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run the whole pipeline once.  `recording` selects whether the
    /// message announces ongoing evidence capture.
    pub async fn dispatch(
        &mut self,
        hw: &mut (impl Clock + LocationSource + MessageChannel),
        recording: bool,
    ) -> DispatchReport {
        self.attempts += 1;
        let attempt = self.attempts;
        info!("SOS: dispatch #{} started", attempt);

        let fix = location::acquire(hw, self.accuracy, self.timeout_ms).await;
        let text = message::compose(fix.as_ref(), recording, &hw.wall_clock());

        let outcome = self.deliver(hw, &text).await;
        match outcome {
            Ok(method) => info!("SOS: dispatch #{} delivered via {:?}", attempt, method),
            Err(e) => error!("SOS: dispatch #{} failed: {}", attempt, e),
        }

        DispatchReport {
            outcome,
            location: fix,
            message: text,
        }
    }

    async fn deliver(
        &self,
        hw: &mut impl MessageChannel,
        text: &str,
    ) -> Result<DeliveryMethod, DispatchError> {
        if self.contact.is_empty() {
            return Err(DispatchError::NoEmergencyContact);
        }

        let primary = message::primary_link(&self.contact, text);
        let primary_err = if hw.can_open(&primary).await {
            match hw.open(&primary).await {
                Ok(()) => return Ok(DeliveryMethod::Primary),
                Err(e) => e,
            }
        } else {
            ChannelError::NoHandler
        };
        warn!("SOS: primary channel unavailable ({primary_err}), falling back");

        let fallback = message::fallback_link(&self.contact, text);
        match hw.open(&fallback).await {
            Ok(()) => Ok(DeliveryMethod::Fallback),
            Err(e) => Err(DispatchError::AllChannelsFailed {
                primary: primary_err,
                fallback: e,
            }),
        }
    }
}
