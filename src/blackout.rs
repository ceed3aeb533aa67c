//! Blackout-mode exit gesture.
//!
//! While blackout is active the screen is blank and every touch is
//! forwarded as a tap.  A run of `required` taps, each within `window_ms`
//! of the previous one, exits blackout.  A pause longer than the window
//! drops the run.
//!
//! | Gesture     | Condition                              | Result       |
//! |-------------|----------------------------------------|--------------|
//! | Tap         | first tap, or gap > window             | run = 1      |
//! | Tap         | gap <= window, run < required          | run += 1     |
//! | Tap         | gap <= window, run reaches required    | exit         |

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    Counting { taps: u8, last_tap_ms: u64 },
}

pub struct TapExitDetector {
    required: u8,
    window_ms: u64,
    state: GestureState,
}

impl TapExitDetector {
    pub fn new(required: u8, window_ms: u32) -> Self {
        Self {
            required: required.max(1),
            window_ms: u64::from(window_ms),
            state: GestureState::Idle,
        }
    }

    pub fn reconfigure(&mut self, required: u8, window_ms: u32) {
        *self = Self::new(required, window_ms);
    }

    /// Register a tap at `now_ms`.  Returns `true` when the gesture completes.
    pub fn tap(&mut self, now_ms: u64) -> bool {
        let taps = match self.state {
            GestureState::Counting { taps, last_tap_ms }
                if now_ms.saturating_sub(last_tap_ms) <= self.window_ms =>
            {
                taps + 1
            }
            _ => 1,
        };

        if taps >= self.required {
            self.state = GestureState::Idle;
            return true;
        }
        self.state = GestureState::Counting {
            taps,
            last_tap_ms: now_ms,
        };
        false
    }

    /// Taps in the current run, `0` if the run has lapsed at `now_ms`.
    pub fn pending_taps(&self, now_ms: u64) -> u8 {
        match self.state {
            GestureState::Counting { taps, last_tap_ms }
                if now_ms.saturating_sub(last_tap_ms) <= self.window_ms =>
            {
                taps
            }
            _ => 0,
        }
    }

    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }
}
