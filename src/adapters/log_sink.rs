//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each guardian event as one tagged
//! log line.  A presentation bridge would implement the same trait.

use log::{error, info, warn};

use crate::app::events::GuardEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`GuardEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &GuardEvent) {
        self.emitted += 1;
        match event {
            GuardEvent::Started(s) => {
                info!(
                    "START | armed={} recording={} degradations=0b{:08b}",
                    s.armed, s.recording, s.degradations
                );
            }
            GuardEvent::GuardArmed => info!("GUARD | armed"),
            GuardEvent::GuardDisarmed => info!("GUARD | disarmed"),
            GuardEvent::ScreamDetection(on) => {
                info!("GUARD | scream detection {}", if *on { "on" } else { "off" });
            }
            GuardEvent::SensorUnavailable => warn!("GUARD | accelerometer unavailable"),
            GuardEvent::AlertTriggered(kind) => warn!("ALERT | {} detected, countdown started", kind),
            GuardEvent::CountdownTick { remaining } => info!("ALERT | {}s remaining", remaining),
            GuardEvent::AlertCancelled => info!("ALERT | cancelled"),
            GuardEvent::AlertExpired(kind) => warn!("ALERT | {} countdown expired", kind),
            GuardEvent::RecordingStarted { filename } => info!("EVID  | recording {}", filename),
            GuardEvent::EvidenceSaved(file) => {
                info!(
                    "EVID  | saved {} ({}) duration={:?}ms",
                    file.filename, file.uri, file.duration_ms
                );
            }
            GuardEvent::SosDispatched(report) => {
                let location = report
                    .location
                    .map_or_else(|| "none".to_string(), |fix| fix.to_string());
                match &report.outcome {
                    Ok(method) => info!("SOS   | delivered via {:?} | location={}", method, location),
                    Err(e) => error!("SOS   | FAILED: {} | location={}", e, location),
                }
            }
            GuardEvent::BlackoutEntered => info!("BLACK | entered"),
            GuardEvent::BlackoutExited => info!("BLACK | exited"),
            GuardEvent::Notice(notice) => {
                warn!("NOTE  | {}: {}", notice.title(), notice.message());
            }
        }
    }
}
