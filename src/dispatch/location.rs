//! Location acquisition and formatting for SOS messages.

use core::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::LocationSource;
use crate::config::LocationAccuracy;

/// Text sent in place of a maps link when neither a fresh nor a
/// last-known fix could be obtained.
pub const LOCATION_PLACEHOLDER: &str = "Location unavailable - GPS signal lost";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in metres, when the provider reports one.
    pub accuracy_m: Option<f32>,
    pub timestamp_ms: u64,
    /// `true` when this came from the last-known cache, not a fresh fix.
    pub is_last_known: bool,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: Option<f32>, timestamp_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            timestamp_ms,
            is_last_known: false,
        }
    }

    /// `https://www.google.com/maps?q=<lat>,<lon>` with 6 decimals.
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={:.6},{:.6}",
            self.latitude, self.longitude
        )
    }

    pub fn quality(&self) -> GpsQuality {
        GpsQuality::from_accuracy(self.accuracy_m)
    }
}

/// `12.971599°N, 77.594566°E`, hemisphere taken from the sign.
impl fmt::Display for LocationFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude < 0.0 { 'S' } else { 'N' };
        let ew = if self.longitude < 0.0 { 'W' } else { 'E' };
        write!(
            f,
            "{:.6}\u{00b0}{}, {:.6}\u{00b0}{}",
            self.latitude.abs(),
            ns,
            self.longitude.abs(),
            ew
        )
    }
}

/// Coarse fix quality for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpsQuality {
    /// No accuracy reported yet.
    Searching,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl GpsQuality {
    pub fn from_accuracy(accuracy_m: Option<f32>) -> Self {
        match accuracy_m {
            None => Self::Searching,
            Some(a) if !a.is_finite() || a <= 0.0 => Self::Searching,
            Some(a) if a < 10.0 => Self::Excellent,
            Some(a) if a < 30.0 => Self::Good,
            Some(a) if a < 100.0 => Self::Fair,
            Some(_) => Self::Poor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Searching => "searching",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

/// Fresh fix within `timeout_ms`, else the last-known fix, else `None`.
///
/// Never fails: every error is logged and answered by the next fallback.
pub async fn acquire(
    source: &mut impl LocationSource,
    accuracy: LocationAccuracy,
    timeout_ms: u32,
) -> Option<LocationFix> {
    match source.current_fix(accuracy, timeout_ms).await {
        Ok(fix) => {
            info!("LOCATION: fresh fix {} ({})", fix, fix.quality().as_str());
            return Some(LocationFix {
                is_last_known: false,
                ..fix
            });
        }
        Err(e) => warn!("LOCATION: fresh fix failed ({e}), trying last known"),
    }

    match source.last_known_fix().await {
        Ok(Some(fix)) => {
            info!("LOCATION: using last known fix {}", fix);
            Some(LocationFix {
                is_last_known: true,
                ..fix
            })
        }
        Ok(None) => {
            warn!("LOCATION: no last known fix");
            None
        }
        Err(e) => {
            warn!("LOCATION: last known fix failed ({e})");
            None
        }
    }
}
