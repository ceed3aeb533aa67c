//! Guardian behaviour against the mock platform: arming, microphone
//! arbitration, fall and scream alerts, SOS escalation and blackout.

use futures_lite::future::block_on;

use raksha::app::commands::GuardCommand;
use raksha::app::events::{GuardEvent, UserNotice};
use raksha::app::ports::FeedbackCue;
use raksha::app::service::Guardian;
use raksha::config::{FeatureFlags, GuardConfig};
use raksha::dispatch::DeliveryMethod;
use raksha::error::{Degradation, SensorError};
use raksha::fsm::context::AlertKind;
use raksha::scheduler::DeferredAction;
use raksha::sensors::AccelerationSample;

use crate::mock_ports::{MockPlatform, PortCall, RecordingSink};

// ── Helpers ───────────────────────────────────────────────────

fn make_guardian() -> (Guardian, MockPlatform, RecordingSink) {
    (
        Guardian::new(GuardConfig::default()),
        MockPlatform::new(),
        RecordingSink::new(),
    )
}

fn armed() -> (Guardian, MockPlatform, RecordingSink) {
    let (mut g, mut hw, mut sink) = make_guardian();
    block_on(g.toggle_guard(&mut hw, &mut sink));
    (g, hw, sink)
}

/// Advance the mock clock by `ms`, then run everything that came due.
fn advance_and_poll(g: &mut Guardian, hw: &mut MockPlatform, sink: &mut RecordingSink, ms: u64) {
    hw.advance(ms);
    block_on(g.poll(hw, sink));
}

/// Impact at `start_ms`, then 0.1 g samples every 20 ms for 2.1 s.
fn feed_fall(g: &mut Guardian, hw: &mut MockPlatform, sink: &mut RecordingSink, start_ms: u64) {
    g.on_sample(AccelerationSample::new(0.0, 0.0, 4.0, start_ms), hw, sink);
    for ts in (start_ms + 20..=start_ms + 2100).step_by(20) {
        hw.now_ms = ts;
        g.on_sample(AccelerationSample::new(0.0, 0.0, 0.1, ts), hw, sink);
    }
}

fn is_sos(e: &GuardEvent) -> bool {
    matches!(e, GuardEvent::SosDispatched(_))
}

// ── Arming and scream detection ──────────────────────────────

#[test]
fn arming_subscribes_and_starts_scream_detection_after_settle_delay() {
    let (mut g, mut hw, mut sink) = armed();

    assert!(g.is_armed());
    assert!(hw.subscribed);
    assert_eq!(hw.count(&PortCall::Subscribe(20)), 1);
    assert_eq!(hw.count(&PortCall::Feedback(FeedbackCue::GuardArmed)), 1);
    assert!(g.is_deferred(DeferredAction::StartScreamDetection));
    assert!(!g.is_scream_detection_active());

    advance_and_poll(&mut g, &mut hw, &mut sink, 199);
    assert!(!hw.listening, "listener must wait for the settle delay");

    advance_and_poll(&mut g, &mut hw, &mut sink, 1);
    assert!(hw.listening);
    assert!(g.is_scream_detection_active());
    assert!(sink.events.contains(&GuardEvent::ScreamDetection(true)));
}

#[test]
fn disarming_releases_sensor_and_microphone() {
    let (mut g, mut hw, mut sink) = armed();
    advance_and_poll(&mut g, &mut hw, &mut sink, 200);
    assert!(hw.listening);

    block_on(g.toggle_guard(&mut hw, &mut sink));
    assert!(!g.is_armed());
    assert!(!hw.subscribed);
    assert!(!hw.listening);
    assert!(!g.is_scream_detection_active());
    assert_eq!(sink.events.last(), Some(&GuardEvent::GuardDisarmed));
}

#[test]
fn disarm_before_settle_delay_drops_pending_start() {
    let (mut g, mut hw, mut sink) = armed();
    hw.advance(100);
    block_on(g.toggle_guard(&mut hw, &mut sink));
    assert!(!g.is_deferred(DeferredAction::StartScreamDetection));

    advance_and_poll(&mut g, &mut hw, &mut sink, 1000);
    assert_eq!(hw.count(&PortCall::StartListening), 0);
}

#[test]
fn arming_while_recording_never_starts_listener() {
    let (mut g, mut hw, mut sink) = make_guardian();
    block_on(g.toggle_recording(&mut hw, &mut sink));
    assert!(g.is_recording());

    block_on(g.toggle_guard(&mut hw, &mut sink));
    assert!(!g.is_deferred(DeferredAction::StartScreamDetection));
    advance_and_poll(&mut g, &mut hw, &mut sink, 5000);

    assert_eq!(hw.count(&PortCall::StartListening), 0);
    assert_eq!(hw.mic_conflicts, 0);
}

#[test]
fn recording_takes_microphone_from_listener_and_hands_it_back() {
    let (mut g, mut hw, mut sink) = armed();
    advance_and_poll(&mut g, &mut hw, &mut sink, 200);
    assert!(g.is_scream_detection_active());

    block_on(g.toggle_recording(&mut hw, &mut sink));
    let stop = hw.position(&PortCall::StopListening).unwrap();
    let start = hw
        .position_where(|c| matches!(c, PortCall::StartRecording(_)))
        .unwrap();
    assert!(stop < start, "listener must be stopped before recording starts");
    assert!(!g.is_scream_detection_active());

    hw.advance(3000);
    block_on(g.toggle_recording(&mut hw, &mut sink));
    assert!(!g.is_recording());
    assert!(sink.events.iter().any(|e| matches!(
        e,
        GuardEvent::EvidenceSaved(f) if f.duration_ms == Some(3000)
    )));
    assert!(g.is_deferred(DeferredAction::ResumeScreamDetection));

    advance_and_poll(&mut g, &mut hw, &mut sink, 499);
    assert!(!hw.listening);
    advance_and_poll(&mut g, &mut hw, &mut sink, 1);
    assert!(hw.listening);
    assert_eq!(hw.mic_conflicts, 0);
}

#[test]
fn stale_resume_timer_after_disarm_is_dropped() {
    let (mut g, mut hw, mut sink) = armed();
    block_on(g.toggle_recording(&mut hw, &mut sink));
    block_on(g.toggle_recording(&mut hw, &mut sink));
    assert!(g.is_deferred(DeferredAction::ResumeScreamDetection));

    block_on(g.toggle_guard(&mut hw, &mut sink));
    advance_and_poll(&mut g, &mut hw, &mut sink, 1000);

    assert_eq!(hw.count(&PortCall::StartListening), 0);
    assert!(!g.is_scream_detection_active());
}

#[test]
fn rearm_then_record_inside_settle_window_stays_exclusive() {
    let (mut g, mut hw, mut sink) = armed();
    block_on(g.toggle_guard(&mut hw, &mut sink));
    block_on(g.toggle_guard(&mut hw, &mut sink));
    hw.advance(50);
    block_on(g.toggle_recording(&mut hw, &mut sink));

    advance_and_poll(&mut g, &mut hw, &mut sink, 1000);
    assert!(g.is_recording());
    assert!(!hw.listening);
    assert_eq!(hw.mic_conflicts, 0);
}

#[test]
fn recording_disabled_by_feature_flag() {
    let config = GuardConfig {
        features: FeatureFlags {
            audio_recording: false,
            ..FeatureFlags::default()
        },
        ..GuardConfig::default()
    };
    let mut g = Guardian::new(config);
    let mut hw = MockPlatform::new();
    let mut sink = RecordingSink::new();

    block_on(g.toggle_recording(&mut hw, &mut sink));
    assert!(!g.is_recording());
    assert_eq!(
        hw.position_where(|c| matches!(c, PortCall::StartRecording(_))),
        None
    );

    let report = block_on(g.handle_explicit_sos(&mut hw, &mut sink));
    assert!(!report.message.contains("Audio evidence"));
}

#[test]
fn evidence_filename_comes_from_wall_clock() {
    let (mut g, mut hw, mut sink) = make_guardian();
    block_on(g.toggle_recording(&mut hw, &mut sink));
    assert!(hw.calls.contains(&PortCall::StartRecording(
        "EVIDENCE_2024-03-07_21-05-02.m4a".to_string()
    )));
}

// ── Permissions and degradations ─────────────────────────────

#[test]
fn refused_permissions_surface_one_notice() {
    let (mut g, mut hw, mut sink) = make_guardian();
    hw.mic_permission = false;
    block_on(g.initialize(&mut hw, &mut sink));

    assert_eq!(
        sink.events.first(),
        Some(&GuardEvent::Notice(UserNotice::PermissionsRequired))
    );
    assert!(matches!(sink.events.get(1), Some(GuardEvent::Started(_))));
    assert!(g.has_degradation(Degradation::MicrophonePermissionDenied));
    assert!(!g.has_degradation(Degradation::LocationPermissionDenied));
}

#[test]
fn microphone_denied_suppresses_scream_but_not_fall_detection() {
    let (mut g, mut hw, mut sink) = make_guardian();
    hw.mic_permission = false;
    block_on(g.initialize(&mut hw, &mut sink));
    block_on(g.toggle_guard(&mut hw, &mut sink));

    advance_and_poll(&mut g, &mut hw, &mut sink, 1000);
    assert_eq!(hw.count(&PortCall::StartListening), 0);

    feed_fall(&mut g, &mut hw, &mut sink, 2000);
    assert!(g.is_alert_active());
}

#[test]
fn granted_permissions_emit_no_notice() {
    let (mut g, mut hw, mut sink) = make_guardian();
    block_on(g.initialize(&mut hw, &mut sink));
    assert_eq!(sink.count(|e| matches!(e, GuardEvent::Notice(_))), 0);
    assert_eq!(sink.events.len(), 1);
}

#[test]
fn missing_sensor_leaves_guard_armed() {
    let (mut g, mut hw, mut sink) = make_guardian();
    hw.sensor_result = Err(SensorError::Unavailable);

    block_on(g.toggle_guard(&mut hw, &mut sink));
    assert!(g.is_armed());
    assert!(g.has_degradation(Degradation::SensorUnavailable));
    assert_eq!(sink.count(|e| *e == GuardEvent::SensorUnavailable), 1);

    // Re-arming with the sensor still missing does not repeat the event.
    block_on(g.toggle_guard(&mut hw, &mut sink));
    block_on(g.toggle_guard(&mut hw, &mut sink));
    assert_eq!(sink.count(|e| *e == GuardEvent::SensorUnavailable), 1);

    hw.sensor_result = Ok(());
    block_on(g.toggle_guard(&mut hw, &mut sink));
    block_on(g.toggle_guard(&mut hw, &mut sink));
    assert!(!g.has_degradation(Degradation::SensorUnavailable));
}

// ── Alerts ───────────────────────────────────────────────────

#[test]
fn samples_ignored_while_disarmed() {
    let (mut g, mut hw, mut sink) = make_guardian();
    feed_fall(&mut g, &mut hw, &mut sink, 0);
    assert!(!g.is_alert_active());
}

#[test]
fn fall_then_cancel_never_dispatches() {
    let (mut g, mut hw, mut sink) = armed();
    feed_fall(&mut g, &mut hw, &mut sink, 1000);
    assert!(g.is_alert_active());
    assert!(sink.events.contains(&GuardEvent::AlertTriggered(AlertKind::Fall)));
    assert_eq!(hw.count(&PortCall::Feedback(FeedbackCue::AlertTriggered)), 1);

    advance_and_poll(&mut g, &mut hw, &mut sink, 3000);
    assert_eq!(sink.countdown_values(), vec![9, 8, 7]);

    assert!(g.cancel_alert(&mut sink));
    assert!(!g.is_alert_active());
    assert_eq!(g.snapshot().countdown_remaining, 10);

    advance_and_poll(&mut g, &mut hw, &mut sink, 20_000);
    assert_eq!(sink.count(is_sos), 0);
    assert!(hw.opened().is_empty());
    assert_eq!(sink.countdown_values(), vec![9, 8, 7]);
}

#[test]
fn expired_fall_alert_raises_silent_auto_sos() {
    let (mut g, mut hw, mut sink) = armed();
    feed_fall(&mut g, &mut hw, &mut sink, 1000);

    advance_and_poll(&mut g, &mut hw, &mut sink, 10_000);
    assert_eq!(sink.countdown_values(), (0..10).rev().collect::<Vec<u16>>());
    assert_eq!(sink.count(|e| *e == GuardEvent::AlertExpired(AlertKind::Fall)), 1);
    assert_eq!(sink.count(is_sos), 1);
    assert_eq!(hw.count(&PortCall::Feedback(FeedbackCue::SosActivated)), 0);

    assert!(g.is_recording());
    assert!(g.is_blackout());
    assert!(!g.is_alert_active());
    let opened = hw.opened();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].starts_with("whatsapp://send?text="));
    assert!(opened[0].ends_with("&phone=9496064331"));
}

#[test]
fn scream_while_fall_alert_active_is_dropped() {
    let (mut g, mut hw, mut sink) = armed();
    advance_and_poll(&mut g, &mut hw, &mut sink, 200);
    feed_fall(&mut g, &mut hw, &mut sink, 1000);

    g.on_loud_sustained(&mut hw, &mut sink);
    assert_eq!(sink.count(|e| matches!(e, GuardEvent::AlertTriggered(_))), 1);
    assert_eq!(g.snapshot().alert_kind, Some(AlertKind::Fall));
}

#[test]
fn loud_audio_ignored_without_active_listener() {
    let (mut g, mut hw, mut sink) = armed();
    g.on_loud_sustained(&mut hw, &mut sink);
    assert!(!g.is_alert_active());

    advance_and_poll(&mut g, &mut hw, &mut sink, 200);
    g.on_loud_sustained(&mut hw, &mut sink);
    assert_eq!(g.snapshot().alert_kind, Some(AlertKind::Scream));
}

#[test]
fn cancel_resets_detector_for_immediate_new_fall() {
    let (mut g, mut hw, mut sink) = armed();
    feed_fall(&mut g, &mut hw, &mut sink, 1000);
    g.cancel_alert(&mut sink);

    feed_fall(&mut g, &mut hw, &mut sink, 4000);
    assert!(g.is_alert_active());
    assert_eq!(sink.count(|e| matches!(e, GuardEvent::AlertTriggered(_))), 2);
}

// ── SOS ──────────────────────────────────────────────────────

#[test]
fn explicit_sos_escalates_in_order() {
    let (mut g, mut hw, mut sink) = make_guardian();
    let report = block_on(g.handle_explicit_sos(&mut hw, &mut sink));

    let haptic = hw
        .position(&PortCall::Feedback(FeedbackCue::SosActivated))
        .unwrap();
    let record = hw
        .position_where(|c| matches!(c, PortCall::StartRecording(_)))
        .unwrap();
    let subscribe = hw.position(&PortCall::Subscribe(20)).unwrap();
    let fix = hw.position(&PortCall::CurrentFix).unwrap();
    let open = hw
        .position_where(|c| matches!(c, PortCall::Open(_)))
        .unwrap();
    assert!(haptic < record && record < subscribe && subscribe < fix && fix < open);

    assert_eq!(report.method(), Some(DeliveryMethod::Primary));
    assert!(report.message.contains("Audio evidence is being recorded."));
    assert!(g.is_armed());
    assert!(g.is_recording());
    assert!(g.is_blackout());
    assert!(!g.is_deferred(DeferredAction::StartScreamDetection));
    assert_eq!(hw.mic_conflicts, 0);
}

#[test]
fn explicit_sos_keeps_running_countdown() {
    let (mut g, mut hw, mut sink) = armed();
    feed_fall(&mut g, &mut hw, &mut sink, 1000);
    block_on(g.handle_explicit_sos(&mut hw, &mut sink));
    assert!(g.is_alert_active());

    advance_and_poll(&mut g, &mut hw, &mut sink, 10_000);
    assert_eq!(g.dispatch_count(), 2);
    assert_eq!(sink.count(is_sos), 2);
}

#[test]
fn failed_dispatch_keeps_guard_recording_and_blackout() {
    let (mut g, mut hw, mut sink) = make_guardian();
    hw.primary_installed = false;
    hw.open_results
        .push_back(Err(raksha::error::ChannelError::OpenFailed));

    let report = block_on(g.handle_explicit_sos(&mut hw, &mut sink));
    assert!(!report.success());
    assert_eq!(
        sink.count(|e| *e == GuardEvent::Notice(UserNotice::DispatchFailed)),
        1
    );
    assert!(g.is_armed());
    assert!(g.is_recording());
    assert!(g.is_blackout());
}

// ── Blackout ─────────────────────────────────────────────────

#[test]
fn three_quick_taps_leave_blackout() {
    let (mut g, mut hw, mut sink) = make_guardian();
    block_on(g.handle_explicit_sos(&mut hw, &mut sink));
    assert!(g.is_blackout());

    assert!(!g.blackout_tap(5000, &mut sink));
    assert!(!g.blackout_tap(5400, &mut sink));
    assert!(g.blackout_tap(5800, &mut sink));
    assert!(!g.is_blackout());
    assert_eq!(sink.events.last(), Some(&GuardEvent::BlackoutExited));

    // Guard mode and evidence carry on after the screen comes back.
    assert!(g.is_armed());
    assert!(g.is_recording());
}

#[test]
fn slow_taps_keep_blackout() {
    let (mut g, mut hw, mut sink) = make_guardian();
    block_on(g.handle_explicit_sos(&mut hw, &mut sink));

    for t in [5000, 6500, 8000, 9500] {
        assert!(!g.blackout_tap(t, &mut sink));
    }
    assert!(g.is_blackout());
}

#[test]
fn blackout_disabled_by_feature_flag() {
    let config = GuardConfig {
        features: FeatureFlags {
            blackout_mode: false,
            ..FeatureFlags::default()
        },
        ..GuardConfig::default()
    };
    let mut g = Guardian::new(config);
    let mut hw = MockPlatform::new();
    let mut sink = RecordingSink::new();
    block_on(g.handle_explicit_sos(&mut hw, &mut sink));
    assert!(!g.is_blackout());
    assert_eq!(sink.count(|e| *e == GuardEvent::BlackoutEntered), 0);
}

// ── Commands and configuration ───────────────────────────────

#[test]
fn invalid_config_is_rejected_and_live_config_kept() {
    let (mut g, mut hw, mut sink) = armed();
    let bad = GuardConfig {
        countdown_secs: 1,
        ..GuardConfig::default()
    };
    assert!(block_on(g.update_config(bad, &mut hw, &mut sink)).is_err());
    assert_eq!(g.current_config(), GuardConfig::default());
}

#[test]
fn disabling_scream_detection_while_armed_stops_listener() {
    let (mut g, mut hw, mut sink) = armed();
    advance_and_poll(&mut g, &mut hw, &mut sink, 200);
    assert!(hw.listening);

    let mut config = g.current_config();
    config.features.scream_detection = false;
    block_on(g.update_config(config, &mut hw, &mut sink)).unwrap();

    assert!(!hw.listening);
    assert!(!g.is_scream_detection_active());
    assert!(g.is_armed());
}

#[test]
fn new_sample_period_resubscribes_sensor() {
    let (mut g, mut hw, mut sink) = armed();
    let mut config = g.current_config();
    config.sensor_sample_period_ms = 40;
    block_on(g.update_config(config, &mut hw, &mut sink)).unwrap();
    assert_eq!(hw.count(&PortCall::Subscribe(40)), 1);
}

#[test]
fn countdown_length_applies_to_next_alert() {
    let (mut g, mut hw, mut sink) = armed();
    let mut config = g.current_config();
    config.countdown_secs = 5;
    block_on(g.update_config(config, &mut hw, &mut sink)).unwrap();

    feed_fall(&mut g, &mut hw, &mut sink, 1000);
    advance_and_poll(&mut g, &mut hw, &mut sink, 5000);
    assert_eq!(sink.countdown_values(), vec![4, 3, 2, 1, 0]);
    assert_eq!(sink.count(is_sos), 1);
}

#[test]
fn commands_route_to_operations() {
    let (mut g, mut hw, mut sink) = make_guardian();
    block_on(g.handle_command(GuardCommand::ToggleGuard, &mut hw, &mut sink));
    assert!(g.is_armed());
    block_on(g.handle_command(GuardCommand::ToggleRecording, &mut hw, &mut sink));
    assert!(g.is_recording());
    block_on(g.handle_command(GuardCommand::ExplicitSos, &mut hw, &mut sink));
    assert!(g.is_blackout());
    block_on(g.handle_command(GuardCommand::ExitBlackout, &mut hw, &mut sink));
    assert!(!g.is_blackout());
    block_on(g.handle_command(GuardCommand::Shutdown, &mut hw, &mut sink));
    assert!(g.is_armed(), "shutdown is handled by the runtime loop");
}

#[test]
fn shutdown_finalises_recording_and_disarms() {
    let (mut g, mut hw, mut sink) = armed();
    block_on(g.toggle_recording(&mut hw, &mut sink));
    block_on(g.shutdown(&mut hw, &mut sink));

    assert!(!g.is_armed());
    assert!(!g.is_recording());
    assert!(hw.recording.is_none());
    assert_eq!(sink.count(|e| matches!(e, GuardEvent::EvidenceSaved(_))), 1);
    assert!(!g.is_deferred(DeferredAction::ResumeScreamDetection));
}
