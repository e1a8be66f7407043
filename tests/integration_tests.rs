/*
 * Integration tests for Radeon Monitor
 *
 * These tests drive the refresh loop through the public API with a
 * replayed device trace and check the behavior of the modules together.
 */

use radeon_monitor::config::{self, FanMode, MonitorConfig};
use radeon_monitor::curve::{evaluate, CurvePoint, FanCurve, HysteresisState};
use radeon_monitor::device::{Device, FanCommand, ScriptedDevice};
use radeon_monitor::metrics::{MetricId, ValueStore};
use radeon_monitor::scheduler::{
    FeatureFlags, InitialSampling, Notification, Phase, RefreshScheduler, UiSink, UserIntent, WindowState,
};
use radeon_monitor::stats::{OperatingPointShare, StatsAggregator};
use serial_test::serial;
use std::collections::BTreeMap;
use tempfile::TempDir;

// Test utilities
#[derive(Default)]
struct Recorder {
    published: usize,
    last_snapshot: Option<ValueStore>,
    last_stats: Option<Vec<OperatingPointShare>>,
    failures: Vec<String>,
}

impl UiSink for Recorder {
    fn publish(&mut self, snapshot: &ValueStore, stats: Option<&[OperatingPointShare]>) {
        self.published += 1;
        self.last_snapshot = Some(snapshot.clone());
        self.last_stats = stats.map(|s| s.to_vec());
    }

    fn notify(&mut self, notification: Notification) {
        let Notification::FanWriteFailed(e) = notification;
        self.failures.push(e);
    }
}

fn create_test_config() -> MonitorConfig {
    let mut profiles = BTreeMap::new();
    profiles.insert(
        "default".to_string(),
        vec![CurvePoint::new(20, 10), CurvePoint::new(40, 30), CurvePoint::new(60, 60)],
    );
    profiles.insert(
        "silent".to_string(),
        vec![CurvePoint::new(40, 10), CurvePoint::new(80, 70)],
    );
    MonitorConfig {
        hysteresis: 5,
        fan_profiles: profiles,
        ..MonitorConfig::default()
    }
}

fn trace_with_temps(temps: &[f64]) -> String {
    let frames: Vec<String> = temps
        .iter()
        .map(|t| {
            format!(
                r#"[{{"id": "temperature", "raw": {t:.1}}},
                    {{"id": "core_clock", "raw": 300}},
                    {{"id": "mem_clock", "raw": 150}},
                    {{"id": "fan_speed_percent", "raw": 40}}]"#
            )
        })
        .collect();
    format!(
        r#"{{"features": {{"change_profile_available": true, "power_method": "dpm"}},
            "daemon_connected": true,
            "frames": [{}]}}"#,
        frames.join(",")
    )
}

fn curve_flags() -> FeatureFlags {
    FeatureFlags { fan_profile_mode: true, ..FeatureFlags::default() }
}

#[test]
fn test_hysteresis_through_refresh_loop() {
    let device = ScriptedDevice::from_json(&trace_with_temps(&[50.0, 48.0, 46.0, 44.0, 50.0])).unwrap();
    let mut sched = RefreshScheduler::new(device, create_test_config());
    let mut ui = Recorder::default();

    let duties: Vec<Option<u8>> = (0..5)
        .map(|_| sched.tick(&curve_flags(), WindowState::default(), &mut ui).applied_duty)
        .collect();

    // rising temperatures always pass the gate
    assert_eq!(duties, vec![Some(45), None, None, Some(36), Some(45)]);
    assert_eq!(
        sched.device().fan_commands(),
        &[FanCommand::Duty(45), FanCommand::Duty(36), FanCommand::Duty(45)]
    );
    assert_eq!(ui.published, 5);
}

#[test]
fn test_evaluate_matches_curve_without_history() {
    let curve = FanCurve::new(vec![
        CurvePoint::new(20, 10),
        CurvePoint::new(40, 30),
        CurvePoint::new(60, 60),
    ])
    .unwrap();
    let mut state = HysteresisState::new(40.0);
    assert_eq!(evaluate(&curve, 50.0, 40.0, 5.0, &mut state), Some(45));
    assert_eq!(state.last_applied_reference_temperature, 50.0);
    assert_eq!(curve.duty_at(10.0), Some(10));
    assert_eq!(curve.duty_at(75.0), Some(60));
}

#[test]
fn test_operating_point_percentages() {
    let trace = r#"{
        "frames": [
            [ {"id": "core_clock", "raw": 300}, {"id": "mem_clock", "raw": 150} ],
            [ {"id": "core_clock", "raw": 300}, {"id": "mem_clock", "raw": 150} ],
            [ {"id": "core_clock", "raw": 300}, {"id": "mem_clock", "raw": 150} ],
            [ {"id": "core_clock", "raw": 900}, {"id": "mem_clock", "raw": 1000} ]
        ]
    }"#;
    let device = ScriptedDevice::from_json(trace).unwrap();
    let mut sched = RefreshScheduler::new(device, create_test_config());
    let mut ui = Recorder::default();
    let flags = FeatureFlags { stats_tracking: true, stats_view_active: true, ..FeatureFlags::default() };

    for _ in 0..4 {
        sched.tick(&flags, WindowState::default(), &mut ui);
    }

    let pct = sched.stats().percentages();
    assert_eq!(pct["300MHz/150MHz"], 75.0);
    assert_eq!(pct["900MHz/1000MHz"], 25.0);

    let shown = ui.last_stats.unwrap();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].key, "300MHz/150MHz");
    assert_eq!(shown[0].count, 3);

    sched.apply_intent(UserIntent::ResetStats).unwrap();
    assert_eq!(sched.stats().total_ticks(), 0);
    assert!(sched.stats().percentages().is_empty());
}

#[test]
fn test_stats_key_without_mem_clock() {
    let mut stats = StatsAggregator::new();
    stats.record("300MHz", "");
    assert_eq!(stats.entries()[0].key, StatsAggregator::operating_point_key("300MHz", ""));
}

#[test]
fn test_hidden_window_keeps_fan_control() {
    let device = ScriptedDevice::from_json(&trace_with_temps(&[40.0, 60.0, 60.0])).unwrap();
    let mut sched = RefreshScheduler::new(device, create_test_config());
    let mut ui = Recorder::default();
    let flags = FeatureFlags { stats_tracking: true, ..curve_flags() };
    let hidden = WindowState { hidden: true, minimized: false };

    sched.tick(&flags, WindowState::default(), &mut ui);
    let report = sched.tick(&flags, hidden, &mut ui);

    assert_eq!(report.phases, vec![Phase::Sampling, Phase::ControllingFan, Phase::Idle]);
    assert_eq!(report.applied_duty, Some(60));
    assert_eq!(ui.published, 1);
    assert_eq!(sched.stats().total_ticks(), 1);

    // temperature min/max still tracked while hidden
    let range = sched.store().range(MetricId::Temperature).unwrap();
    assert_eq!((range.min, range.max), (40.0, 60.0));
}

#[test]
fn test_write_failure_recovers() {
    let device = ScriptedDevice::from_json(&trace_with_temps(&[50.0, 49.0])).unwrap();
    let mut sched = RefreshScheduler::new(device, create_test_config());
    let mut ui = Recorder::default();

    sched.device_mut().set_reject_writes(true);
    let report = sched.tick(&curve_flags(), WindowState::default(), &mut ui);
    assert!(report.write_failed);
    assert_eq!(ui.failures.len(), 1);
    assert_eq!(ui.published, 1);

    // the next tick applies the curve directly instead of gating on the drop
    sched.device_mut().set_reject_writes(false);
    let report = sched.tick(&curve_flags(), WindowState::default(), &mut ui);
    assert_eq!(report.applied_duty, Some(43));
}

#[test]
fn test_profile_switch_and_fan_modes() {
    let device = ScriptedDevice::from_json(&trace_with_temps(&[60.0])).unwrap();
    let mut sched = RefreshScheduler::new(device, create_test_config());
    sched.tick(&FeatureFlags::default(), WindowState::default(), &mut Recorder::default());

    sched.apply_intent(UserIntent::SetFanMode(FanMode::Curve)).unwrap();
    sched.apply_intent(UserIntent::SelectFanProfile("silent".into())).unwrap();
    sched.tick(&curve_flags(), WindowState::default(), &mut Recorder::default());
    sched.apply_intent(UserIntent::SetFanMode(FanMode::Auto)).unwrap();

    assert_eq!(
        sched.device().fan_commands(),
        &[FanCommand::Duty(60), FanCommand::Duty(40), FanCommand::Auto]
    );
    assert_eq!(sched.config().active_fan_profile, "silent");
    assert!(sched.apply_intent(UserIntent::SelectFanProfile("missing".into())).is_err());
}

#[test]
#[serial]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("radeon-monitor").join("config.json");

    let mut cfg = create_test_config();
    cfg.fan_mode = FanMode::Curve;
    cfg.save_fan_mode = true;
    cfg.stats_tracking = true;
    config::save_config(&path, &cfg).unwrap();

    let loaded = config::load_config(&path).unwrap();
    assert_eq!(loaded, cfg);

    let flags = FeatureFlags::from_config(&loaded);
    assert!(flags.fan_profile_mode);
    assert!(flags.stats_tracking);
}

#[test]
#[serial]
fn test_config_path_follows_xdg() {
    let dir = TempDir::new().unwrap();
    let old = std::env::var("XDG_CONFIG_HOME").ok();
    std::env::set_var("XDG_CONFIG_HOME", dir.path());

    let path = config::config_path();
    assert!(path.starts_with(dir.path()));
    assert_eq!(config::load_or_default(&path), MonitorConfig::default());

    match old {
        Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
}

#[test]
fn test_initial_sampling_then_restore() {
    let mut cfg = create_test_config();
    cfg.save_fan_mode = true;
    cfg.fan_mode = FanMode::Curve;

    let device = ScriptedDevice::from_json(&trace_with_temps(&[40.0])).unwrap();
    let init = InitialSampling::start(device);
    let mut sched = init.finish(cfg).unwrap();
    assert!(sched.daemon_connected());
    assert_eq!(sched.store().raw(MetricId::Temperature), Some(40.0));

    sched.restore_fan_mode().unwrap();
    assert_eq!(sched.config().fan_mode, FanMode::Curve);
    assert_eq!(sched.device().last_duty(), Some(30));
}

#[test]
fn test_min_max_strings_after_ticks() {
    let device = ScriptedDevice::from_json(&trace_with_temps(&[45.0, 55.0, 50.0])).unwrap();
    let mut sched = RefreshScheduler::new(device, create_test_config());
    let mut ui = Recorder::default();
    for _ in 0..3 {
        sched.tick(&FeatureFlags::default(), WindowState::default(), &mut ui);
    }
    let snapshot = ui.last_snapshot.unwrap();
    assert_eq!(
        snapshot.current_min_max_string(MetricId::Temperature).unwrap(),
        "50.0°C (min: 45.0°C max: 55.0°C)"
    );
    assert_eq!(snapshot.current_min_max_string(MetricId::CoreClock).unwrap(), "300MHz");
}

#[test]
fn test_device_trace_rejects_unknown_fields() {
    assert!(ScriptedDevice::from_json(r#"{"frames": [[]], "extra": true}"#).is_err());
    let mut dev = ScriptedDevice::from_json(r#"{"frames": [[]]}"#).unwrap();
    assert!(dev.sample().is_empty());
    assert!(dev.sample_temperature().is_none());
}
