//! Fuzz target: `FallDetector`
//!
//! Feeds arbitrary magnitude/timestamp pairs (NaN, infinities, negative
//! values and non-monotonic time included) and verifies:
//! - No panics
//! - A fall is never confirmed without a prior impact sample
//! - The detector is back in Idle right after a confirmation
//!
//! cargo fuzz run fuzz_fall_detector

#![no_main]

use libfuzzer_sys::fuzz_target;
use raksha::config::GuardConfig;
use raksha::sensors::fall::{FallDetector, FallThresholds};

fuzz_target!(|data: &[u8]| {
    let thresholds = FallThresholds::from_config(&GuardConfig::default());
    let mut det = FallDetector::new(thresholds);
    let mut impact_seen = false;

    for chunk in data.chunks_exact(6) {
        let magnitude = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let timestamp_ms = u64::from(u16::from_le_bytes([chunk[4], chunk[5]])) * 10;

        if magnitude.is_finite() && magnitude > thresholds.impact_g {
            impact_seen = true;
        }

        let reading = det.process_sample(magnitude, timestamp_ms);
        if reading.fall_detected {
            assert!(impact_seen, "fall confirmed without impact");
            assert!(!det.impact_detected(), "detector not reset after fall");
            impact_seen = false;
        }
    }
});
