//! Simulated platform for the `raksha-sim` binary.
//!
//! [`SimPlatform`] implements every port on the host.  It also plays a
//! [`ScriptStep`] list into the inbox: each time the runtime sleeps, the
//! steps that have come due are posted, the way real sensor and audio
//! callbacks would post them.  Samples are only delivered while the
//! accelerometer is subscribed, and loud-audio callbacks only while ambient
//! listening is running.

use chrono::{DateTime, FixedOffset};
use clap::ValueEnum;
use embassy_sync::blocking_mutex::raw::RawMutex;
use log::{debug, info, warn};

use crate::app::commands::GuardCommand;
use crate::app::ports::{
    AudioCapture, Clock, Feedback, FeedbackCue, LocationSource, MessageChannel, SensorSource,
};
use crate::config::LocationAccuracy;
use crate::dispatch::LocationFix;
use crate::error::{AudioError, ChannelError, LocationError, SensorError};
use crate::events::{GuardInput, Inbox, post};
use crate::evidence::{EvidenceFile, EvidenceHandle, RecordingRequest};
use crate::sensors::AccelerationSample;

// ───────────────────────────────────────────────────────────────
// Scripts
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    /// Accelerometer reading of the given magnitude (g), on the z axis.
    Sample(f32),
    LoudAudio,
    Command(GuardCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    pub at_ms: u64,
    pub action: ScriptAction,
}

impl ScriptStep {
    pub fn new(at_ms: u64, action: ScriptAction) -> Self {
        Self { at_ms, action }
    }

    pub fn command(at_ms: u64, cmd: GuardCommand) -> Self {
        Self::new(at_ms, ScriptAction::Command(cmd))
    }
}

/// Samples every `period_ms` in `[from_ms, to_ms)`, magnitude chosen per timestamp.
pub fn sample_run(
    from_ms: u64,
    to_ms: u64,
    period_ms: u64,
    magnitude: impl Fn(u64) -> f32,
) -> Vec<ScriptStep> {
    (from_ms..to_ms)
        .step_by(period_ms.max(1) as usize)
        .map(|t| ScriptStep::new(t, ScriptAction::Sample(magnitude(t))))
        .collect()
}

/// Canned scenarios replayed by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Impact, then stillness: fall confirmed, countdown expires, auto-SOS.
    Fall,
    /// Loud audio while armed: scream alert, then cancelled.
    Scream,
    /// Fall alert cancelled by the user mid-countdown.
    Cancel,
    /// Explicit SOS from a disarmed state, then triple-tap out of blackout.
    Sos,
    /// Impact followed by intermittent movement, then stillness.
    Bounce,
}

const PERIOD_MS: u64 = 20;

impl Scenario {
    pub fn script(self) -> Vec<ScriptStep> {
        let mut steps = vec![ScriptStep::command(0, GuardCommand::ToggleGuard)];
        match self {
            Self::Fall => {
                steps.extend(sample_run(100, 1000, PERIOD_MS, |_| 1.0));
                steps.push(ScriptStep::new(1000, ScriptAction::Sample(4.0)));
                steps.extend(sample_run(1020, 3500, PERIOD_MS, |_| 0.1));
                steps.extend(blackout_taps(16_000));
                steps.push(ScriptStep::command(17_000, GuardCommand::ToggleRecording));
                steps.push(ScriptStep::command(18_000, GuardCommand::Shutdown));
            }
            Self::Scream => {
                steps.push(ScriptStep::new(1000, ScriptAction::LoudAudio));
                steps.push(ScriptStep::command(4000, GuardCommand::CancelAlert));
                steps.push(ScriptStep::command(5000, GuardCommand::Shutdown));
            }
            Self::Cancel => {
                steps.push(ScriptStep::new(1000, ScriptAction::Sample(4.0)));
                steps.extend(sample_run(1020, 3200, PERIOD_MS, |_| 0.1));
                steps.push(ScriptStep::command(6000, GuardCommand::CancelAlert));
                steps.push(ScriptStep::command(7000, GuardCommand::Shutdown));
            }
            Self::Sos => {
                steps[0] = ScriptStep::command(500, GuardCommand::ExplicitSos);
                steps.extend(blackout_taps(2000));
                steps.push(ScriptStep::command(4000, GuardCommand::Shutdown));
            }
            Self::Bounce => {
                steps.push(ScriptStep::new(1000, ScriptAction::Sample(4.0)));
                // A movement sample every 400 ms keeps the stillness run short.
                steps.extend(sample_run(1020, 4000, PERIOD_MS, |t| {
                    if t % 400 == 0 { 1.0 } else { 0.1 }
                }));
                steps.extend(sample_run(4000, 6500, PERIOD_MS, |_| 0.1));
                steps.push(ScriptStep::command(8000, GuardCommand::CancelAlert));
                steps.push(ScriptStep::command(9000, GuardCommand::Shutdown));
            }
        }
        steps.sort_by_key(|s| s.at_ms);
        steps
    }
}

fn blackout_taps(from_ms: u64) -> [ScriptStep; 3] {
    [
        ScriptStep::command(from_ms, GuardCommand::BlackoutTap),
        ScriptStep::command(from_ms + 300, GuardCommand::BlackoutTap),
        ScriptStep::command(from_ms + 600, GuardCommand::BlackoutTap),
    ]
}

// ───────────────────────────────────────────────────────────────
// Simulated device
// ───────────────────────────────────────────────────────────────

/// What the simulated phone can and cannot do.
#[derive(Debug, Clone)]
pub struct SimOptions {
    pub sensor_available: bool,
    pub mic_permission: bool,
    pub location_permission: bool,
    /// Fresh fix returned by the location provider, `None` for a timeout.
    pub fix: Option<LocationFix>,
    pub last_known: Option<LocationFix>,
    /// Whether the messaging app handling the primary link is installed.
    pub messaging_app: bool,
    pub sms: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            sensor_available: true,
            mic_permission: true,
            location_permission: true,
            fix: Some(LocationFix::new(12.971_599, 77.594_566, Some(8.0), 0)),
            last_known: None,
            messaging_app: true,
            sms: true,
        }
    }
}

pub struct SimPlatform<'a, M: RawMutex, C: Clock> {
    clock: C,
    inbox: &'a Inbox<M>,
    script: std::vec::IntoIter<ScriptStep>,
    next: Option<ScriptStep>,
    options: SimOptions,
    subscribed: bool,
    listening: bool,
    recording: Option<EvidenceHandle>,
    next_recording_id: u32,
    opened: Vec<String>,
}

impl<'a, M: RawMutex, C: Clock> SimPlatform<'a, M, C> {
    pub fn new(clock: C, inbox: &'a Inbox<M>, mut script: Vec<ScriptStep>, options: SimOptions) -> Self {
        script.sort_by_key(|s| s.at_ms);
        let mut script = script.into_iter();
        let next = script.next();
        Self {
            clock,
            inbox,
            script,
            next,
            options,
            subscribed: false,
            listening: false,
            recording: None,
            next_recording_id: 1,
            opened: Vec::new(),
        }
    }

    /// URIs opened so far, in order.
    pub fn opened(&self) -> &[String] {
        &self.opened
    }

    /// Post every script step that is due.
    fn release_due(&mut self) {
        let now = self.clock.now_ms();
        while let Some(step) = self.next.take_if(|s| s.at_ms <= now) {
            match step.action {
                ScriptAction::Sample(magnitude) => {
                    if self.subscribed {
                        let sample = AccelerationSample::new(0.0, 0.0, magnitude, step.at_ms);
                        post(self.inbox, GuardInput::Sample(sample));
                    }
                }
                ScriptAction::LoudAudio => {
                    if self.listening {
                        post(self.inbox, GuardInput::LoudSustained);
                    } else {
                        debug!("SIM: loud audio at {}ms with no listener", step.at_ms);
                    }
                }
                ScriptAction::Command(cmd) => {
                    info!("SIM: t={}ms user {:?}", step.at_ms, cmd);
                    post(self.inbox, GuardInput::Command(cmd));
                }
            }
            self.next = self.script.next();
        }
    }
}

impl<M: RawMutex, C: Clock> Clock for SimPlatform<'_, M, C> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn wall_clock(&self) -> DateTime<FixedOffset> {
        self.clock.wall_clock()
    }

    async fn sleep_ms(&mut self, ms: u32) {
        self.clock.sleep_ms(ms).await;
        self.release_due();
    }
}

impl<M: RawMutex, C: Clock> SensorSource for SimPlatform<'_, M, C> {
    fn subscribe(&mut self, period_ms: u32) -> Result<(), SensorError> {
        if !self.options.sensor_available {
            return Err(SensorError::Unavailable);
        }
        info!("SIM: accelerometer subscribed ({}ms)", period_ms);
        self.subscribed = true;
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if self.subscribed {
            info!("SIM: accelerometer unsubscribed");
        }
        self.subscribed = false;
    }
}

impl<M: RawMutex, C: Clock> AudioCapture for SimPlatform<'_, M, C> {
    async fn request_permission(&mut self) -> bool {
        self.options.mic_permission
    }

    async fn start_recording(
        &mut self,
        request: RecordingRequest,
    ) -> Result<EvidenceHandle, AudioError> {
        if !self.options.mic_permission {
            return Err(AudioError::PermissionDenied);
        }
        if self.listening || self.recording.is_some() {
            warn!("SIM: microphone busy");
            return Err(AudioError::Busy);
        }
        let handle = EvidenceHandle {
            id: self.next_recording_id,
            filename: request.filename,
            started_ms: self.clock.now_ms(),
        };
        self.next_recording_id += 1;
        self.recording = Some(handle.clone());
        Ok(handle)
    }

    async fn stop_recording(&mut self, handle: EvidenceHandle) -> Result<EvidenceFile, AudioError> {
        match self.recording.take() {
            Some(open) if open.id == handle.id => Ok(EvidenceFile {
                uri: format!("file:///sim/evidence/{}", handle.filename),
                duration_ms: Some(self.clock.now_ms().saturating_sub(handle.started_ms)),
                filename: handle.filename,
            }),
            other => {
                self.recording = other;
                Err(AudioError::StopFailed)
            }
        }
    }

    async fn start_ambient_listening(&mut self) -> Result<(), AudioError> {
        if !self.options.mic_permission {
            return Err(AudioError::PermissionDenied);
        }
        if self.recording.is_some() {
            warn!("SIM: microphone busy");
            return Err(AudioError::Busy);
        }
        self.listening = true;
        Ok(())
    }

    async fn stop_ambient_listening(&mut self) -> Result<(), AudioError> {
        self.listening = false;
        Ok(())
    }
}

impl<M: RawMutex, C: Clock> LocationSource for SimPlatform<'_, M, C> {
    async fn request_permission(&mut self) -> bool {
        self.options.location_permission
    }

    async fn current_fix(
        &mut self,
        _accuracy: LocationAccuracy,
        timeout_ms: u32,
    ) -> Result<LocationFix, LocationError> {
        if !self.options.location_permission {
            return Err(LocationError::PermissionDenied);
        }
        match self.options.fix {
            Some(fix) => Ok(LocationFix {
                timestamp_ms: self.clock.now_ms(),
                ..fix
            }),
            None => {
                self.clock.sleep_ms(timeout_ms).await;
                Err(LocationError::Timeout)
            }
        }
    }

    async fn last_known_fix(&mut self) -> Result<Option<LocationFix>, LocationError> {
        if !self.options.location_permission {
            return Err(LocationError::PermissionDenied);
        }
        Ok(self.options.last_known)
    }
}

impl<M: RawMutex, C: Clock> MessageChannel for SimPlatform<'_, M, C> {
    async fn can_open(&mut self, uri: &str) -> bool {
        if uri.starts_with("whatsapp:") {
            self.options.messaging_app
        } else if uri.starts_with("sms:") {
            self.options.sms
        } else {
            false
        }
    }

    async fn open(&mut self, uri: &str) -> Result<(), ChannelError> {
        if !self.can_open(uri).await {
            return Err(ChannelError::NoHandler);
        }
        info!("SIM: opened {}", uri.split('?').next().unwrap_or(uri));
        self.opened.push(uri.to_string());
        Ok(())
    }
}

impl<M: RawMutex, C: Clock> Feedback for SimPlatform<'_, M, C> {
    fn feedback(&mut self, cue: FeedbackCue) {
        debug!("SIM: haptic {:?}", cue);
    }
}
