//! Single-consumer event loop.
//!
//! Each iteration drains the inbox (commands before samples), then runs due
//! countdown seconds and settle timers, then sleeps through the clock port.
//! Draining first means a cancel that arrived between two countdown seconds
//! is applied before the next second is counted.

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::info;

use crate::app::commands::GuardCommand;
use crate::app::ports::{EventSink, Platform};
use crate::app::service::Guardian;
use crate::events::{GuardInput, Inbox};

/// Idle sleep between loop iterations.
pub const POLL_INTERVAL_MS: u32 = 10;

/// Drive `guardian` until a [`GuardCommand::Shutdown`] is received.
/// Returns the number of inputs processed.
pub async fn run<M: RawMutex>(
    guardian: &mut Guardian,
    inbox: &Inbox<M>,
    hw: &mut impl Platform,
    sink: &mut impl EventSink,
) -> u64 {
    info!("Runtime loop started");
    let mut processed = 0u64;

    loop {
        while let Some(input) = inbox.try_next() {
            processed += 1;
            match input {
                GuardInput::Sample(sample) => guardian.on_sample(sample, hw, sink),
                GuardInput::LoudSustained => guardian.on_loud_sustained(hw, sink),
                GuardInput::Command(GuardCommand::Shutdown) => {
                    guardian.shutdown(hw, sink).await;
                    info!("Runtime loop stopped after {} inputs", processed);
                    return processed;
                }
                GuardInput::Command(cmd) => guardian.handle_command(cmd, hw, sink).await,
            }
        }

        guardian.poll(hw, sink).await;
        hw.sleep_ms(POLL_INTERVAL_MS).await;
    }
}
