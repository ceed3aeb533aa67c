//! Motion-sensor front end: the raw sample type and the magnitude sampler.
//!
//! The accelerometer adapter pushes one [`AccelerationSample`] per sensor
//! tick into the guardian's inbox.  Each sample is reduced to a scalar
//! magnitude here and consumed once by the [`FallDetector`](fall::FallDetector);
//! samples are never stored.

pub mod fall;

use serde::{Deserialize, Serialize};

/// One 3-axis accelerometer reading, in g (1.0 ≈ stationary gravity).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccelerationSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Monotonic milliseconds at which the sample was taken.
    pub timestamp_ms: u64,
}

impl AccelerationSample {
    pub fn new(x: f32, y: f32, z: f32, timestamp_ms: u64) -> Self {
        Self { x, y, z, timestamp_ms }
    }

    /// Euclidean norm of this sample.
    pub fn magnitude(&self) -> f32 {
        magnitude(self.x, self.y, self.z)
    }
}

/// `√(x² + y² + z²)`.  Non-finite components propagate as NaN/∞, which
/// the fall detector treats as non-signal.
pub fn magnitude(x: f32, y: f32, z: f32) -> f32 {
    (x * x + y * y + z * z).sqrt()
}
