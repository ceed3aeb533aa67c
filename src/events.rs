//! Inbound event inbox.
//!
//! Every asynchronous source (accelerometer callback, ambient-audio
//! callback, presentation intents) pushes a [`GuardInput`] into the
//! [`Inbox`].  The [`runtime`](crate::runtime) loop is the only consumer, so
//! guardian state is mutated from exactly one place.
//!
//! ```text
//! ┌────────────────┐     ┌──────────────────┐
//! │ Sensor callback│────▶│ samples  (lossy) │──┐
//! └────────────────┘     └──────────────────┘  │   ┌──────────────┐
//! ┌────────────────┐     ┌──────────────────┐  ├──▶│ runtime::run │
//! │ Audio callback │────▶│ commands         │──┘   │  (consumer)  │
//! │ Presentation   │────▶│ (drained first)  │      └──────────────┘
//! └────────────────┘     └──────────────────┘
//! ```
//!
//! Samples arrive at 50 Hz and keep arriving while the loop is suspended in
//! a dispatch, so their lane evicts the oldest sample when full.  User
//! intents and loud-audio callbacks travel in their own lane and are never
//! displaced by samples.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{debug, warn};

use crate::app::commands::GuardCommand;
use crate::sensors::AccelerationSample;

/// Sample lane depth.  At a 20 ms sample period this holds the most
/// recent 640 ms.
pub const SAMPLE_DEPTH: usize = 32;

/// Command lane depth.
pub const COMMAND_DEPTH: usize = 32;

/// Everything the guardian reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardInput {
    Sample(AccelerationSample),
    /// The ambient listener observed sustained loud audio.
    LoudSustained,
    Command(GuardCommand),
}

pub struct Inbox<M: RawMutex> {
    samples: Channel<M, AccelerationSample, SAMPLE_DEPTH>,
    commands: Channel<M, GuardInput, COMMAND_DEPTH>,
}

impl<M: RawMutex> Default for Inbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Inbox<M> {
    pub const fn new() -> Self {
        Self {
            samples: Channel::new(),
            commands: Channel::new(),
        }
    }

    /// Non-blocking push.  A sample always gets in, evicting the oldest
    /// queued sample if needed.  Returns `false` only when the command lane
    /// is full and the input was refused.
    pub fn post(&self, input: GuardInput) -> bool {
        match input {
            GuardInput::Sample(mut sample) => loop {
                match self.samples.try_send(sample) {
                    Ok(()) => return true,
                    Err(TrySendError::Full(back)) => {
                        if let Ok(stale) = self.samples.try_receive() {
                            debug!("Sample lane full, dropped sample at {}ms", stale.timestamp_ms);
                        }
                        sample = back;
                    }
                }
            },
            other => match self.commands.try_send(other) {
                Ok(()) => true,
                Err(_) => {
                    warn!("Command lane full, input refused");
                    false
                }
            },
        }
    }

    /// Next input to process: queued commands first, then samples.
    pub fn try_next(&self) -> Option<GuardInput> {
        self.commands
            .try_receive()
            .ok()
            .or_else(|| self.samples.try_receive().ok().map(GuardInput::Sample))
    }

    pub fn pending_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }
}

/// Push `input` into `inbox`.  See [`Inbox::post`].
pub fn post<M: RawMutex>(inbox: &Inbox<M>, input: GuardInput) -> bool {
    inbox.post(input)
}
