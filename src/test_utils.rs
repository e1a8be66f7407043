/*
 * Test utilities and mock helpers for Radeon Monitor
 *
 * This module provides reference configs, device frames and a recording
 * UI sink shared by the scheduler, event and UI tests.
 */

#[cfg(test)]
pub mod test_utils {
    use std::collections::BTreeMap;

    use crate::config::{FanMode, MonitorConfig, DEFAULT_PROFILE};
    use crate::curve::CurvePoint;
    use crate::device::{DriverFeatures, PowerMethod, ScriptedDevice};
    use crate::metrics::{MetricId, MetricSample, ValueStore};
    use crate::scheduler::{Notification, UiSink};
    use crate::stats::OperatingPointShare;

    /// Curve `{20:10, 40:30, 60:60}` with a 5°C hysteresis
    pub fn create_reference_config() -> MonitorConfig {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            DEFAULT_PROFILE.to_string(),
            vec![CurvePoint::new(20, 10), CurvePoint::new(40, 30), CurvePoint::new(60, 60)],
        );
        MonitorConfig {
            hysteresis: 5,
            fan_profiles: profiles,
            fan_mode: FanMode::Auto,
            ..MonitorConfig::default()
        }
    }

    pub fn create_driver_features() -> DriverFeatures {
        DriverFeatures { change_profile_available: true, power_method: PowerMethod::Dpm }
    }

    /// One full device frame: power level, clocks, temperature and fan
    pub fn create_frame(temp_c: f64, core: &str, mem: &str) -> Vec<MetricSample> {
        vec![
            MetricSample::new(MetricId::PowerLevel, 0.0, "auto"),
            MetricSample::new(MetricId::CoreClock, 0.0, core),
            MetricSample::new(MetricId::MemClock, 0.0, mem),
            MetricSample::formatted(MetricId::Temperature, temp_c),
            MetricSample::formatted(MetricId::FanSpeedPercent, 40.0),
        ]
    }

    /// Device replaying one frame per temperature
    pub fn create_scripted_device(temps: &[f64]) -> ScriptedDevice {
        let frames = temps
            .iter()
            .map(|t| create_frame(*t, "300MHz", "150MHz"))
            .collect();
        ScriptedDevice::new(frames, create_driver_features())
    }

    /// UI stand-in counting what the scheduler hands over
    #[derive(Default)]
    pub struct RecordingSink {
        pub published: usize,
        pub last_snapshot: Option<ValueStore>,
        pub last_stats: Option<Vec<OperatingPointShare>>,
        pub notifications: Vec<Notification>,
    }

    impl UiSink for RecordingSink {
        fn publish(&mut self, snapshot: &ValueStore, stats: Option<&[OperatingPointShare]>) {
            self.published += 1;
            self.last_snapshot = Some(snapshot.clone());
            self.last_stats = stats.map(|s| s.to_vec());
        }

        fn notify(&mut self, notification: Notification) {
            self.notifications.push(notification);
        }
    }

    /// Asserts that two floating point numbers are approximately equal
    pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
        assert!(
            (a - b).abs() < tolerance,
            "Values {} and {} are not approximately equal (tolerance: {})",
            a, b, tolerance
        );
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::device::Device;
    use crate::metrics::MetricId;

    #[test]
    fn test_reference_config_is_valid() {
        let cfg = create_reference_config();
        assert!(crate::config::validate_config(&cfg).is_ok());
        assert_eq!(cfg.active_curve().unwrap().duty_at(50.0), Some(45));
    }

    #[test]
    fn test_scripted_device_frames() {
        let mut dev = create_scripted_device(&[30.0, 31.5]);
        let first = dev.sample();
        assert!(first.iter().any(|s| s.id == MetricId::FanSpeedPercent));
        let second = dev.sample_temperature().unwrap();
        assert_approx_eq(second.raw, 31.5, 1e-9);
    }

    #[test]
    #[should_panic]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq(1.0, 1.1, 0.01);
    }
}
