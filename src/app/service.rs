//! Guard-mode coordinator, the hexagonal core.
//!
//! [`Guardian`] owns every piece of mutable safety state: the guard-mode
//! flags, the fall detector, the alert countdown, the settle-delay timers
//! and the open evidence handle.  It is the only place that starts or
//! stops the microphone, so recording and scream detection can never run
//! together.  All I/O flows through port traits injected at call sites,
//! making the whole service testable with mock adapters.
//!
//! ```text
//!  samples / loud audio ──▶ ┌───────────────────────────────┐ ──▶ EventSink
//!  GuardCommand ──────────▶ │           Guardian            │
//!                           │ FallDetector · AlertManager   │
//!  Platform ports ◀──────── │ TimerQueue · SosDispatcher    │
//!                           └───────────────────────────────┘
//! ```
//!
//! Methods that only touch in-memory state (`on_sample`, `cancel_alert`)
//! are synchronous.  Anything that waits on the microphone, the location
//! provider or a messaging app is `async`.

use log::{debug, info, warn};

use crate::alert::{AlertManager, AlertTick};
use crate::blackout::TapExitDetector;
use crate::config::GuardConfig;
use crate::dispatch::{DispatchReport, SosDispatcher};
use crate::error::{AudioError, Degradation};
use crate::evidence::{EvidenceHandle, RecordingRequest, evidence_filename};
use crate::fsm::context::AlertKind;
use crate::health::HealthMonitor;
use crate::scheduler::{DeferredAction, TimerQueue};
use crate::sensors::AccelerationSample;
use crate::sensors::fall::{FallDetector, FallThresholds};

use super::commands::GuardCommand;
use super::events::{GuardEvent, GuardSnapshot, UserNotice};
use super::ports::{
    AudioCapture, Clock, ConfigError, EventSink, Feedback, FeedbackCue, LocationSource, Platform,
    SensorSource,
};

/// How an SOS was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosTrigger {
    /// The user slid to activate; acknowledged with haptics.
    Explicit,
    /// The alert countdown ran out; silent.
    Auto,
}

#[derive(Debug, Default, Clone, Copy)]
struct GuardState {
    armed: bool,
    recording: bool,
    scream_active: bool,
    blackout: bool,
}

// ───────────────────────────────────────────────────────────────
// Guardian
// ───────────────────────────────────────────────────────────────

pub struct Guardian {
    config: GuardConfig,
    state: GuardState,
    detector: FallDetector,
    alerts: AlertManager,
    timers: TimerQueue,
    health: HealthMonitor,
    evidence: Option<EvidenceHandle>,
    dispatcher: SosDispatcher,
    blackout_exit: TapExitDetector,
    /// Cleared when the microphone permission is refused.
    mic_permitted: bool,
}

impl Guardian {
    /// Construct the guardian from configuration.  Nothing is armed until
    /// the presentation layer asks for it.
    pub fn new(config: GuardConfig) -> Self {
        Self {
            detector: FallDetector::new(FallThresholds::from_config(&config)),
            alerts: AlertManager::new(config.countdown_secs),
            timers: TimerQueue::new(),
            health: HealthMonitor::new(),
            evidence: None,
            dispatcher: SosDispatcher::new(&config),
            blackout_exit: TapExitDetector::new(
                config.blackout_exit_taps,
                config.blackout_tap_window_ms,
            ),
            mic_permitted: true,
            state: GuardState::default(),
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Ask for microphone and location permission.  A refusal of either is
    /// surfaced once as [`UserNotice::PermissionsRequired`]; the guardian
    /// keeps running with the affected features degraded.
    pub async fn initialize(&mut self, hw: &mut impl Platform, sink: &mut impl EventSink) {
        let mic = AudioCapture::request_permission(&mut *hw).await;
        let location = LocationSource::request_permission(&mut *hw).await;

        self.mic_permitted = mic;
        self.health
            .report(Degradation::MicrophonePermissionDenied, !mic);
        self.health
            .report(Degradation::LocationPermissionDenied, !location);

        if !mic || !location {
            warn!(
                "Permissions missing (microphone={}, location={})",
                mic, location
            );
            sink.emit(&GuardEvent::Notice(UserNotice::PermissionsRequired));
        }

        sink.emit(&GuardEvent::Started(self.snapshot()));
        info!("Guardian initialized");
    }

    /// Stop everything that holds a platform resource.  An open recording
    /// is finalised so its evidence is not lost.
    pub async fn shutdown(&mut self, hw: &mut impl Platform, sink: &mut impl EventSink) {
        if self.state.recording {
            self.stop_recording(hw, sink).await;
        }
        if self.state.armed {
            self.disarm(hw, sink).await;
        }
        self.timers.clear();
        info!("Guardian shut down");
    }

    // ── Guard mode ────────────────────────────────────────────

    pub async fn toggle_guard(&mut self, hw: &mut impl Platform, sink: &mut impl EventSink) {
        if self.state.armed {
            self.disarm(hw, sink).await;
        } else {
            self.arm(hw, sink);
        }
    }

    fn arm(&mut self, hw: &mut (impl Clock + SensorSource + Feedback), sink: &mut impl EventSink) {
        self.state.armed = true;
        self.detector.reset();
        if self.config.features.fall_detection {
            self.subscribe_sensor(hw, sink);
        }

        hw.feedback(FeedbackCue::GuardArmed);
        sink.emit(&GuardEvent::GuardArmed);
        info!("GUARD: armed");

        if !self.state.recording && self.scream_allowed() {
            let due = hw.now_ms() + u64::from(self.config.scream_start_delay_ms);
            self.timers.schedule(DeferredAction::StartScreamDetection, due);
        }
    }

    async fn disarm(&mut self, hw: &mut impl Platform, sink: &mut impl EventSink) {
        self.state.armed = false;
        hw.unsubscribe();
        self.detector.reset();
        self.timers.cancel(DeferredAction::StartScreamDetection);
        self.timers.cancel(DeferredAction::ResumeScreamDetection);
        self.stop_scream_detection(hw, sink).await;

        hw.feedback(FeedbackCue::GuardDisarmed);
        sink.emit(&GuardEvent::GuardDisarmed);
        info!("GUARD: disarmed");
    }

    fn subscribe_sensor(&mut self, hw: &mut impl SensorSource, sink: &mut impl EventSink) {
        match hw.subscribe(self.config.sensor_sample_period_ms) {
            Ok(()) => {
                self.health.report(Degradation::SensorUnavailable, false);
            }
            Err(e) => {
                warn!("GUARD: {e}; staying armed without fall detection");
                if self.health.report(Degradation::SensorUnavailable, true) {
                    sink.emit(&GuardEvent::SensorUnavailable);
                }
            }
        }
    }

    // ── Detector inputs ───────────────────────────────────────

    /// Feed one accelerometer sample.  Never blocks.
    pub fn on_sample(
        &mut self,
        sample: AccelerationSample,
        hw: &mut (impl Clock + Feedback),
        sink: &mut impl EventSink,
    ) {
        if !self.state.armed || !self.config.features.fall_detection {
            return;
        }
        let reading = self
            .detector
            .process_sample(sample.magnitude(), sample.timestamp_ms);
        if reading.fall_detected {
            self.trigger_alert(AlertKind::Fall, hw, sink);
        }
    }

    /// Sustained loud audio reported by the ambient listener.
    pub fn on_loud_sustained(&mut self, hw: &mut (impl Clock + Feedback), sink: &mut impl EventSink) {
        if !self.state.scream_active {
            debug!("GUARD: loud audio ignored, scream detection inactive");
            return;
        }
        self.trigger_alert(AlertKind::Scream, hw, sink);
    }

    /// Start a countdown.  Dropped (returns `false`) if one is already active.
    pub fn trigger_alert(
        &mut self,
        kind: AlertKind,
        hw: &mut (impl Clock + Feedback),
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.alerts.trigger(kind, hw.now_ms()) {
            return false;
        }
        hw.feedback(FeedbackCue::AlertTriggered);
        sink.emit(&GuardEvent::AlertTriggered(kind));
        true
    }

    /// Stop the countdown and reset the detector before returning, so a fall
    /// confirmed right after is a fresh cycle.  Returns `false` if no
    /// countdown was running.
    pub fn cancel_alert(&mut self, sink: &mut impl EventSink) -> bool {
        if !self.alerts.cancel() {
            return false;
        }
        self.detector.reset();
        sink.emit(&GuardEvent::AlertCancelled);
        info!("ALERT: cancelled by user");
        true
    }

    // ── Time-driven work ──────────────────────────────────────

    /// Run everything that has come due: countdown seconds (and auto-SOS on
    /// expiry) first, then settle-delay timers.
    pub async fn poll(&mut self, hw: &mut impl Platform, sink: &mut impl EventSink) {
        let now = hw.now_ms();

        while let Some(tick) = self.alerts.next_tick(now) {
            match tick {
                AlertTick::Countdown { remaining } => {
                    hw.feedback(FeedbackCue::CountdownTick);
                    sink.emit(&GuardEvent::CountdownTick { remaining });
                }
                AlertTick::Expired(kind) => {
                    sink.emit(&GuardEvent::AlertExpired(kind));
                    self.handle_sos(SosTrigger::Auto, hw, sink).await;
                }
            }
        }

        let now = hw.now_ms();
        while let Some(action) = self.timers.pop_due(now) {
            debug!("GUARD: deferred {:?} fired", action);
            match action {
                DeferredAction::StartScreamDetection | DeferredAction::ResumeScreamDetection => {
                    self.start_scream_detection(hw, sink).await;
                }
            }
        }
    }

    // ── Microphone arbitration ────────────────────────────────

    fn scream_allowed(&self) -> bool {
        self.config.features.scream_detection && self.mic_permitted
    }

    /// Start ambient listening if, right now, guard mode is armed and the
    /// microphone is free.  Stale settle-delay timers end up here and are
    /// dropped by the same check.
    async fn start_scream_detection(&mut self, hw: &mut impl AudioCapture, sink: &mut impl EventSink) {
        if !self.state.armed || self.state.recording || self.state.scream_active {
            debug!("GUARD: scream detection start skipped");
            return;
        }
        if !self.scream_allowed() {
            return;
        }
        match hw.start_ambient_listening().await {
            Ok(()) => {
                self.state.scream_active = true;
                sink.emit(&GuardEvent::ScreamDetection(true));
                info!("GUARD: scream detection active");
            }
            Err(AudioError::PermissionDenied) => {
                self.mic_permitted = false;
                self.health
                    .report(Degradation::MicrophonePermissionDenied, true);
            }
            Err(e) => warn!("GUARD: scream detection start failed: {e}"),
        }
    }

    /// Release the microphone from ambient listening.  Always asks the
    /// port, even if no listener is believed to be running.
    async fn stop_scream_detection(&mut self, hw: &mut impl AudioCapture, sink: &mut impl EventSink) {
        if let Err(e) = hw.stop_ambient_listening().await {
            warn!("GUARD: scream detection stop failed: {e}");
        }
        if self.state.scream_active {
            self.state.scream_active = false;
            sink.emit(&GuardEvent::ScreamDetection(false));
            info!("GUARD: scream detection stopped");
        }
    }

    // ── Evidence recording ────────────────────────────────────

    pub async fn toggle_recording(&mut self, hw: &mut impl Platform, sink: &mut impl EventSink) {
        if self.state.recording {
            self.stop_recording(hw, sink).await;
        } else {
            self.start_recording(hw, sink).await;
        }
    }

    /// Hand the microphone to the recorder.  Returns `true` if recording.
    pub async fn start_recording(&mut self, hw: &mut impl Platform, sink: &mut impl EventSink) -> bool {
        if self.state.recording {
            return true;
        }
        if !self.config.features.audio_recording {
            info!("EVIDENCE: recording disabled by configuration");
            return false;
        }

        self.timers.cancel(DeferredAction::StartScreamDetection);
        self.timers.cancel(DeferredAction::ResumeScreamDetection);
        self.stop_scream_detection(hw, sink).await;

        let request = RecordingRequest {
            filename: evidence_filename(&hw.wall_clock()),
        };
        match hw.start_recording(request).await {
            Ok(handle) => {
                info!("EVIDENCE: recording to {}", handle.filename);
                sink.emit(&GuardEvent::RecordingStarted {
                    filename: handle.filename.clone(),
                });
                self.evidence = Some(handle);
                self.state.recording = true;
                true
            }
            Err(e) => {
                warn!("EVIDENCE: recording failed to start: {e}");
                if e == AudioError::PermissionDenied {
                    self.mic_permitted = false;
                    self.health
                        .report(Degradation::MicrophonePermissionDenied, true);
                }
                self.schedule_scream_resume(hw.now_ms());
                false
            }
        }
    }

    /// Close the evidence handle and, if still armed, queue scream detection
    /// to resume after the settle delay.
    pub async fn stop_recording(&mut self, hw: &mut impl Platform, sink: &mut impl EventSink) {
        self.state.recording = false;
        let Some(handle) = self.evidence.take() else {
            return;
        };
        match hw.stop_recording(handle).await {
            Ok(file) => {
                info!("EVIDENCE: saved {}", file.filename);
                sink.emit(&GuardEvent::EvidenceSaved(file));
            }
            Err(e) => warn!("EVIDENCE: stop failed, no file produced: {e}"),
        }
        self.schedule_scream_resume(hw.now_ms());
    }

    fn schedule_scream_resume(&mut self, now_ms: u64) {
        if self.state.armed && self.scream_allowed() {
            let due = now_ms + u64::from(self.config.scream_resume_delay_ms);
            self.timers.schedule(DeferredAction::ResumeScreamDetection, due);
        }
    }

    // ── SOS ───────────────────────────────────────────────────

    pub async fn handle_explicit_sos(
        &mut self,
        hw: &mut impl Platform,
        sink: &mut impl EventSink,
    ) -> DispatchReport {
        self.handle_sos(SosTrigger::Explicit, hw, sink).await
    }

    pub async fn handle_auto_sos(
        &mut self,
        hw: &mut impl Platform,
        sink: &mut impl EventSink,
    ) -> DispatchReport {
        self.handle_sos(SosTrigger::Auto, hw, sink).await
    }

    /// Escalate: evidence, guard mode, dispatch, then blackout.
    /// A failed dispatch never undoes the earlier steps.
    pub async fn handle_sos(
        &mut self,
        trigger: SosTrigger,
        hw: &mut impl Platform,
        sink: &mut impl EventSink,
    ) -> DispatchReport {
        warn!("SOS: {:?} trigger", trigger);
        if trigger == SosTrigger::Explicit {
            hw.feedback(FeedbackCue::SosActivated);
        }

        if !self.state.recording && self.config.features.audio_recording {
            self.start_recording(hw, sink).await;
        }
        if !self.state.armed {
            self.arm(hw, sink);
        }

        let report = self.dispatcher.dispatch(hw, self.state.recording).await;
        if report.location.is_none() {
            sink.emit(&GuardEvent::Notice(UserNotice::LocationUnavailable));
        }
        let failed = !report.success();
        sink.emit(&GuardEvent::SosDispatched(report.clone()));
        if failed {
            sink.emit(&GuardEvent::Notice(UserNotice::DispatchFailed));
        }

        if self.config.features.blackout_mode && !self.state.blackout {
            self.state.blackout = true;
            self.blackout_exit.reset();
            sink.emit(&GuardEvent::BlackoutEntered);
        }
        report
    }

    // ── Blackout ──────────────────────────────────────────────

    /// One tap on the blank screen.  Returns `true` if it completed the exit gesture.
    pub fn blackout_tap(&mut self, now_ms: u64, sink: &mut impl EventSink) -> bool {
        if !self.state.blackout {
            return false;
        }
        if self.blackout_exit.tap(now_ms) {
            self.exit_blackout(sink);
            return true;
        }
        false
    }

    pub fn exit_blackout(&mut self, sink: &mut impl EventSink) {
        if !self.state.blackout {
            return;
        }
        self.state.blackout = false;
        self.blackout_exit.reset();
        sink.emit(&GuardEvent::BlackoutExited);
    }

    // ── Commands ──────────────────────────────────────────────

    /// Process one presentation intent.  `Shutdown` is handled by the
    /// runtime loop and is a no-op here.
    pub async fn handle_command(
        &mut self,
        cmd: GuardCommand,
        hw: &mut impl Platform,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            GuardCommand::ToggleGuard => self.toggle_guard(hw, sink).await,
            GuardCommand::ToggleRecording => self.toggle_recording(hw, sink).await,
            GuardCommand::ExplicitSos => {
                self.handle_explicit_sos(hw, sink).await;
            }
            GuardCommand::CancelAlert => {
                self.cancel_alert(sink);
            }
            GuardCommand::BlackoutTap => {
                let now = hw.now_ms();
                self.blackout_tap(now, sink);
            }
            GuardCommand::ExitBlackout => self.exit_blackout(sink),
            GuardCommand::UpdateConfig(config) => {
                if let Err(e) = self.update_config(config, hw, sink).await {
                    warn!("Config update rejected: {e}");
                }
            }
            GuardCommand::Shutdown => {}
        }
    }

    /// Validate and apply a new configuration.  On error the live config is kept.
    ///
    /// Threshold changes restart the detector cycle.  A new countdown length
    /// applies from the next alert.  While armed, the sensor subscription and
    /// scream detection are brought in line with the new feature flags.
    pub async fn update_config(
        &mut self,
        config: GuardConfig,
        hw: &mut impl Platform,
        sink: &mut impl EventSink,
    ) -> Result<(), ConfigError> {
        config.validate()?;
        let old = core::mem::replace(&mut self.config, config);

        self.detector
            .set_thresholds(FallThresholds::from_config(&self.config));
        self.alerts.set_duration(self.config.countdown_secs);
        self.dispatcher.reconfigure(&self.config);
        self.blackout_exit
            .reconfigure(self.config.blackout_exit_taps, self.config.blackout_tap_window_ms);

        if self.state.armed {
            let fall_on = self.config.features.fall_detection;
            if !fall_on && old.features.fall_detection {
                hw.unsubscribe();
            } else if fall_on
                && (!old.features.fall_detection
                    || old.sensor_sample_period_ms != self.config.sensor_sample_period_ms)
            {
                self.subscribe_sensor(hw, sink);
            }

            if self.scream_allowed() {
                if !self.state.recording && !self.state.scream_active {
                    let due = hw.now_ms() + u64::from(self.config.scream_start_delay_ms);
                    self.timers.schedule(DeferredAction::StartScreamDetection, due);
                }
            } else {
                self.timers.cancel(DeferredAction::StartScreamDetection);
                self.timers.cancel(DeferredAction::ResumeScreamDetection);
                if self.state.scream_active {
                    self.stop_scream_detection(hw, sink).await;
                }
            }
        }

        info!("Configuration updated at runtime");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn snapshot(&self) -> GuardSnapshot {
        GuardSnapshot {
            armed: self.state.armed,
            recording: self.state.recording,
            scream_detection_active: self.state.scream_active,
            alert_active: self.alerts.is_active(),
            alert_kind: self.alerts.kind(),
            countdown_remaining: self.alerts.remaining(),
            blackout: self.state.blackout,
            degradations: self.health.flags(),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state.armed
    }

    pub fn is_recording(&self) -> bool {
        self.state.recording
    }

    pub fn is_scream_detection_active(&self) -> bool {
        self.state.scream_active
    }

    pub fn is_alert_active(&self) -> bool {
        self.alerts.is_active()
    }

    pub fn is_blackout(&self) -> bool {
        self.state.blackout
    }

    pub fn has_degradation(&self, degradation: Degradation) -> bool {
        self.health.has(degradation)
    }

    /// Clone of the live configuration (for persistence or delta updates).
    pub fn current_config(&self) -> GuardConfig {
        self.config.clone()
    }

    /// Number of SOS dispatches attempted so far.
    pub fn dispatch_count(&self) -> u32 {
        self.dispatcher.attempts()
    }

    /// Whether a settle-delay timer for `action` is pending.
    pub fn is_deferred(&self, action: DeferredAction) -> bool {
        self.timers.is_pending(action)
    }
}
