//! Clock adapters.
//!
//! - [`SystemClock`]: `embassy-time` for monotonic time, the local
//!   timezone for wall-clock time, and `async-io-mini` timers for sleeping.
//!   Both run on the `embassy-time` host driver.
//! - [`VirtualClock`]: a shared manual clock for simulation and tests.
//!   Sleeping advances it instantly, so a twelve-second scenario replays in
//!   microseconds and deterministically.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, TimeDelta};
use embassy_time::Instant;

use crate::app::ports::Clock;

// ───────────────────────────────────────────────────────────────
// Real time
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis()
    }

    fn wall_clock(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    async fn sleep_ms(&mut self, ms: u32) {
        async_io_mini::Timer::after(Duration::from_millis(u64::from(ms))).await;
    }
}

// ───────────────────────────────────────────────────────────────
// Virtual time
// ───────────────────────────────────────────────────────────────

/// Manually driven clock.  Clones share the same time source.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    now_ms: Rc<Cell<u64>>,
    epoch: DateTime<FixedOffset>,
}

impl VirtualClock {
    /// Start at `t = 0` with the wall clock reading `epoch`.
    pub fn new(epoch: DateTime<FixedOffset>) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(0)),
            epoch,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn wall_clock(&self) -> DateTime<FixedOffset> {
        let elapsed = i64::try_from(self.now_ms.get()).unwrap_or(i64::MAX);
        self.epoch + TimeDelta::milliseconds(elapsed)
    }

    async fn sleep_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
        futures_lite::future::yield_now().await;
    }
}
