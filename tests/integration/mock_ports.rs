//! Mock platform for integration tests.
//!
//! Records every port call so tests can assert on the full call history,
//! and tracks microphone ownership so any overlap of recording and ambient
//! listening is caught no matter which test triggers it.

use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};

use raksha::app::events::GuardEvent;
use raksha::app::ports::{
    AudioCapture, Clock, EventSink, Feedback, FeedbackCue, LocationSource, MessageChannel,
    SensorSource,
};
use raksha::config::LocationAccuracy;
use raksha::dispatch::LocationFix;
use raksha::error::{AudioError, ChannelError, LocationError, SensorError};
use raksha::evidence::{EvidenceFile, EvidenceHandle, RecordingRequest};

// ── Port call record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    Subscribe(u32),
    Unsubscribe,
    StartRecording(String),
    StopRecording(u32),
    StartListening,
    StopListening,
    CurrentFix,
    LastKnownFix,
    CanOpen(String),
    Open(String),
    Feedback(FeedbackCue),
}

// ── MockPlatform ──────────────────────────────────────────────

pub struct MockPlatform {
    pub calls: Vec<PortCall>,
    pub now_ms: u64,

    pub sensor_result: Result<(), SensorError>,
    pub mic_permission: bool,
    pub location_permission: bool,
    pub recording_result: Result<(), AudioError>,
    pub listening_result: Result<(), AudioError>,
    pub fix_result: Result<LocationFix, LocationError>,
    pub last_known_result: Result<Option<LocationFix>, LocationError>,
    pub primary_installed: bool,
    /// Scripted results for successive `open()` calls; `Ok` once exhausted.
    pub open_results: VecDeque<Result<(), ChannelError>>,

    pub subscribed: bool,
    pub listening: bool,
    pub recording: Option<EvidenceHandle>,
    /// Set if recording and ambient listening were ever active together.
    pub mic_conflicts: u32,
    next_id: u32,
}

#[allow(dead_code)]
impl MockPlatform {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            now_ms: 0,
            sensor_result: Ok(()),
            mic_permission: true,
            location_permission: true,
            recording_result: Ok(()),
            listening_result: Ok(()),
            fix_result: Ok(LocationFix::new(12.9716, 77.5946, Some(6.0), 0)),
            last_known_result: Ok(None),
            primary_installed: true,
            open_results: VecDeque::new(),
            subscribed: false,
            listening: false,
            recording: None,
            mic_conflicts: 0,
            next_id: 1,
        }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    pub fn count(&self, call: &PortCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn opened(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Open(uri) => Some(uri.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, call: &PortCall) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }

    pub fn position_where(&self, pred: impl Fn(&PortCall) -> bool) -> Option<usize> {
        self.calls.iter().position(pred)
    }

    fn check_mic(&mut self) {
        if self.listening && self.recording.is_some() {
            self.mic_conflicts += 1;
        }
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

pub fn epoch() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(19_800)
        .and_then(|tz| tz.with_ymd_and_hms(2024, 3, 7, 21, 5, 2).single())
        .expect("valid epoch")
}

impl Clock for MockPlatform {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn wall_clock(&self) -> DateTime<FixedOffset> {
        epoch() + TimeDelta::milliseconds(self.now_ms as i64)
    }

    async fn sleep_ms(&mut self, ms: u32) {
        self.now_ms += u64::from(ms);
    }
}

impl SensorSource for MockPlatform {
    fn subscribe(&mut self, period_ms: u32) -> Result<(), SensorError> {
        self.calls.push(PortCall::Subscribe(period_ms));
        self.sensor_result?;
        self.subscribed = true;
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.calls.push(PortCall::Unsubscribe);
        self.subscribed = false;
    }
}

impl AudioCapture for MockPlatform {
    async fn request_permission(&mut self) -> bool {
        self.mic_permission
    }

    async fn start_recording(
        &mut self,
        request: RecordingRequest,
    ) -> Result<EvidenceHandle, AudioError> {
        self.calls
            .push(PortCall::StartRecording(request.filename.clone()));
        self.recording_result?;
        let handle = EvidenceHandle {
            id: self.next_id,
            filename: request.filename,
            started_ms: self.now_ms,
        };
        self.next_id += 1;
        self.recording = Some(handle.clone());
        self.check_mic();
        Ok(handle)
    }

    async fn stop_recording(&mut self, handle: EvidenceHandle) -> Result<EvidenceFile, AudioError> {
        self.calls.push(PortCall::StopRecording(handle.id));
        self.recording = None;
        Ok(EvidenceFile {
            uri: format!("file:///mock/{}", handle.filename),
            duration_ms: Some(self.now_ms - handle.started_ms),
            filename: handle.filename,
        })
    }

    async fn start_ambient_listening(&mut self) -> Result<(), AudioError> {
        self.calls.push(PortCall::StartListening);
        self.listening_result?;
        self.listening = true;
        self.check_mic();
        Ok(())
    }

    async fn stop_ambient_listening(&mut self) -> Result<(), AudioError> {
        self.calls.push(PortCall::StopListening);
        self.listening = false;
        Ok(())
    }
}

impl LocationSource for MockPlatform {
    async fn request_permission(&mut self) -> bool {
        self.location_permission
    }

    async fn current_fix(
        &mut self,
        _accuracy: LocationAccuracy,
        _timeout_ms: u32,
    ) -> Result<LocationFix, LocationError> {
        self.calls.push(PortCall::CurrentFix);
        self.fix_result
    }

    async fn last_known_fix(&mut self) -> Result<Option<LocationFix>, LocationError> {
        self.calls.push(PortCall::LastKnownFix);
        self.last_known_result
    }
}

impl MessageChannel for MockPlatform {
    async fn can_open(&mut self, uri: &str) -> bool {
        self.calls.push(PortCall::CanOpen(uri.to_string()));
        !uri.starts_with("whatsapp:") || self.primary_installed
    }

    async fn open(&mut self, uri: &str) -> Result<(), ChannelError> {
        self.calls.push(PortCall::Open(uri.to_string()));
        self.open_results.pop_front().unwrap_or(Ok(()))
    }
}

impl Feedback for MockPlatform {
    fn feedback(&mut self, cue: FeedbackCue) {
        self.calls.push(PortCall::Feedback(cue));
    }
}

// ── Recording event sink ─────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<GuardEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&GuardEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn countdown_values(&self) -> Vec<u16> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GuardEvent::CountdownTick { remaining } => Some(*remaining),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &GuardEvent) {
        self.events.push(event.clone());
    }
}
