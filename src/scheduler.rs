/*
 * This file is part of Radeon Monitor.
 *
 * Copyright (C) 2025 Radeon Monitor contributors
 *
 * Radeon Monitor is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Radeon Monitor is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Radeon Monitor. If not, see <https://www.gnu.org/licenses/>.
 */

//! Refresh loop: sample the device, drive the fan, count operating points
//! and publish the result.
//!
//! One tick runs `Sampling -> ControllingFan? -> Aggregating? -> Publishing`
//! to completion before the next one starts. Nothing inside a tick can stop
//! the loop: a missing metric or a failed fan write only skips that step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{FanMode, MonitorConfig};
use crate::curve::{self, CurvePoint, FanCurve, HysteresisState};
use crate::device::{Device, DeviceError, DriverFeatures};
use crate::error::{MonitorError, Result};
use crate::logger;
use crate::metrics::{MetricId, MetricSample, ValueStore};
use crate::stats::{OperatingPointShare, StatsAggregator};

/// UI toggles consulted on every tick
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    pub stats_tracking: bool,
    pub fan_profile_mode: bool,
    pub refresh_when_hidden: bool,
    /// Operating point table is on screen, percentages are worth computing
    pub stats_view_active: bool,
}

impl FeatureFlags {
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        Self {
            stats_tracking: cfg.stats_tracking,
            fan_profile_mode: cfg.fan_mode == FanMode::Curve,
            refresh_when_hidden: cfg.refresh_when_hidden,
            stats_view_active: false,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowState {
    /// Sent to tray
    pub hidden: bool,
    pub minimized: bool,
}

impl WindowState {
    pub fn visible(&self) -> bool {
        !self.hidden && !self.minimized
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Sampling,
    ControllingFan,
    Aggregating,
    Publishing,
    Idle,
}

/// What a single tick did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub phases: Vec<Phase>,
    pub full_sample: bool,
    pub applied_duty: Option<u8>,
    pub write_failed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    FanWriteFailed(String),
}

/// Receives the results of visible ticks
pub trait UiSink {
    fn publish(&mut self, snapshot: &ValueStore, stats: Option<&[OperatingPointShare]>);

    fn notify(&mut self, _notification: Notification) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum UserIntent {
    ReplaceCurve(Vec<CurvePoint>),
    SelectFanProfile(String),
    SetFanMode(FanMode),
    SetFixedFanSpeed(u8),
    SetHysteresis(u32),
    ResetStats,
}

pub struct RefreshScheduler<D: Device> {
    device: D,
    config: MonitorConfig,
    curve: FanCurve,
    features: DriverFeatures,
    store: ValueStore,
    stats: StatsAggregator,
    hysteresis: HysteresisState,
    // next control step applies the curve without the hysteresis gate
    resync: bool,
    ticks: u64,
}

impl<D: Device> RefreshScheduler<D> {
    pub fn new(device: D, config: MonitorConfig) -> Self {
        Self::with_initial_samples(device, config, Vec::new())
    }

    pub fn with_initial_samples(device: D, config: MonitorConfig, samples: Vec<MetricSample>) -> Self {
        let curve = config.active_curve().unwrap_or_else(|e| {
            warn!("Fan curve unavailable, curve control disabled: {}", e);
            FanCurve::empty()
        });
        let features = device.features();
        let mut store = ValueStore::new();
        store.apply(samples);
        Self {
            device,
            config,
            curve,
            features,
            store,
            stats: StatsAggregator::new(),
            hysteresis: HysteresisState::default(),
            resync: true,
            ticks: 0,
        }
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn curve(&self) -> &FanCurve {
        &self.curve
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn features(&self) -> DriverFeatures {
        self.features
    }

    pub fn daemon_connected(&self) -> bool {
        self.device.daemon_connected()
    }

    pub fn hysteresis_state(&self) -> HysteresisState {
        self.hysteresis
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn interval(&self) -> Duration {
        self.config.interval()
    }

    /// Fan percent is readable, the driver accepts fan writes and curve mode is on
    pub fn fan_control_active(&self, flags: &FeatureFlags) -> bool {
        flags.fan_profile_mode
            && self.store.contains(MetricId::FanSpeedPercent)
            && self.features.change_profile_available
    }

    pub fn tick(&mut self, flags: &FeatureFlags, window: WindowState, ui: &mut dyn UiSink) -> TickReport {
        self.ticks += 1;
        let mut report = TickReport::default();

        if window.hidden && !flags.refresh_when_hidden {
            // keep the fan logic alive while sitting in the tray
            if self.fan_control_active(flags) {
                report.phases.push(Phase::Sampling);
                if let Some(t) = self.device.sample_temperature() {
                    self.store.update(t.id, t.raw, t.display);
                }
                report.phases.push(Phase::ControllingFan);
                self.control_fan(&mut report, ui);
            }
            report.phases.push(Phase::Idle);
            return report;
        }

        report.phases.push(Phase::Sampling);
        report.full_sample = true;
        let samples = self.device.sample();
        self.store.apply(samples);

        if self.fan_control_active(flags) {
            report.phases.push(Phase::ControllingFan);
            self.control_fan(&mut report, ui);
        }

        // core clock is essential to the stats, memory clock is not
        if flags.stats_tracking {
            if let Some(core) = self.store.get(MetricId::CoreClock) {
                report.phases.push(Phase::Aggregating);
                let mem = self
                    .store
                    .get(MetricId::MemClock)
                    .map(|s| s.display.as_str())
                    .unwrap_or("");
                self.stats.record(&core.display, mem);
            }
        }

        if window.visible() {
            report.phases.push(Phase::Publishing);
            let shares = flags.stats_view_active.then(|| self.stats.entries());
            ui.publish(&self.store, shares.as_deref());
        }

        report.phases.push(Phase::Idle);
        report
    }

    fn control_fan(&mut self, report: &mut TickReport, ui: &mut dyn UiSink) {
        let Some(current) = self.store.raw(MetricId::Temperature) else {
            return;
        };
        if self.curve.is_empty() {
            debug!("empty fan curve, skipping fan control");
            return;
        }

        let duty = match self.store.previous_raw(MetricId::Temperature) {
            Some(previous) if !self.resync => curve::evaluate(
                &self.curve,
                current,
                previous,
                f64::from(self.config.hysteresis),
                &mut self.hysteresis,
            ),
            _ => {
                self.resync = false;
                self.hysteresis.resync(current);
                self.curve.duty_at(current)
            }
        };

        let Some(duty) = duty else { return };
        match self.device.set_fan_duty(duty) {
            Ok(()) => {
                debug!("fan duty {}% at {:.1}°C", duty, current);
                report.applied_duty = Some(duty);
                logger::log_event("fan_duty_applied", json!({ "duty": duty, "temp_c": current }));
            }
            Err(e) => {
                warn!("Failed to set fan duty {}%: {}", duty, e);
                report.write_failed = true;
                self.resync = true;
                logger::log_event("device_write_failed", json!({ "duty": duty, "error": e.to_string() }));
                ui.notify(Notification::FanWriteFailed(e.to_string()));
            }
        }
    }

    /// Apply a user edit. Errors leave the previous state in place.
    pub fn apply_intent(&mut self, intent: UserIntent) -> Result<()> {
        logger::log_event("intent", json!({ "intent": format!("{:?}", intent) }));
        match intent {
            UserIntent::ReplaceCurve(points) => {
                let curve = FanCurve::with_floor(points.clone(), self.config.min_fan_speed)?;
                self.config
                    .fan_profiles
                    .insert(self.config.active_fan_profile.clone(), points);
                self.install_curve(curve)
            }
            UserIntent::SelectFanProfile(name) => {
                let curve = self.config.curve_for(&name)?;
                self.config.active_fan_profile = name;
                self.install_curve(curve)
            }
            UserIntent::SetFanMode(mode) => self.set_fan_mode(mode),
            UserIntent::SetFixedFanSpeed(pct) => {
                if pct > 100 {
                    return Err(MonitorError::invalid_config("fixed_fan_speed", "must be <= 100"));
                }
                if self.config.fan_mode == FanMode::Fixed {
                    self.device.set_fan_duty(pct)?;
                }
                self.config.fixed_fan_speed = pct;
                Ok(())
            }
            UserIntent::SetHysteresis(deg) => {
                if deg > 30 {
                    return Err(MonitorError::invalid_config("hysteresis", "must be <= 30"));
                }
                self.config.hysteresis = deg;
                Ok(())
            }
            UserIntent::ResetStats => {
                self.stats.reset();
                Ok(())
            }
        }
    }

    fn install_curve(&mut self, curve: FanCurve) -> Result<()> {
        info!("Installed fan curve with {} point(s)", curve.points().len());
        self.curve = curve;
        self.resync = true;
        if self.config.fan_mode == FanMode::Curve && self.curve.is_empty() {
            self.device.set_fan_auto()?;
            self.config.fan_mode = FanMode::Auto;
            return Err(MonitorError::CurveMisconfigured);
        }
        Ok(())
    }

    fn set_fan_mode(&mut self, mode: FanMode) -> Result<()> {
        match mode {
            FanMode::Auto => self.device.set_fan_auto()?,
            FanMode::Fixed => self.device.set_fan_duty(self.config.fixed_fan_speed)?,
            FanMode::Curve => {
                if self.curve.is_empty() {
                    return Err(MonitorError::CurveMisconfigured);
                }
                if !self.features.change_profile_available
                    || !self.store.contains(MetricId::FanSpeedPercent)
                {
                    return Err(DeviceError::NotSupported("fan control".into()).into());
                }
                self.resync = true;
                if let Some(temp) = self.store.raw(MetricId::Temperature) {
                    let duty = self.curve.duty_at(temp);
                    self.hysteresis.resync(temp);
                    if let Some(duty) = duty {
                        self.device.set_fan_duty(duty)?;
                        self.resync = false;
                    }
                }
            }
        }
        info!("Fan mode set to {:?}", mode);
        self.config.fan_mode = mode;
        Ok(())
    }

    /// Re-apply the persisted fan mode after the first sample. Without
    /// `save_fan_mode` the driver keeps control.
    pub fn restore_fan_mode(&mut self) -> Result<()> {
        let mode = self.config.fan_mode;
        if !self.config.save_fan_mode || mode == FanMode::Auto {
            self.config.fan_mode = FanMode::Auto;
            return Ok(());
        }
        if mode == FanMode::Curve {
            if let Some(t) = self.device.sample_temperature() {
                self.store.update(t.id, t.raw, t.display);
            }
        }
        let restored = self.set_fan_mode(mode);
        if restored.is_err() {
            self.config.fan_mode = FanMode::Auto;
        }
        restored
    }

    /// Tick on the configured cadence until `stop` is raised. A tick that
    /// overruns the interval delays the next one.
    pub fn run_until(&mut self, flags: FeatureFlags, ui: &mut dyn UiSink, stop: &AtomicBool) {
        let interval = self.interval();
        while !stop.load(Ordering::Relaxed) {
            let started = Instant::now();
            self.tick(&flags, WindowState::default(), ui);
            while !stop.load(Ordering::Relaxed) {
                let remaining = interval.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    break;
                }
                thread::sleep(remaining.min(Duration::from_millis(50)));
            }
        }
    }
}

/// First device read, done off the main thread while the UI is built
pub struct InitialSampling<D> {
    handle: JoinHandle<(D, Vec<MetricSample>)>,
}

impl<D: Device + 'static> InitialSampling<D> {
    pub fn start(mut device: D) -> Self {
        let handle = thread::spawn(move || {
            let samples = device.sample();
            (device, samples)
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the read and build the scheduler around its result
    pub fn finish(self, config: MonitorConfig) -> Result<RefreshScheduler<D>> {
        let (device, samples) = self
            .handle
            .join()
            .map_err(|_| MonitorError::Generic("initial sampling thread panicked".into()))?;
        info!("Initial sample: {} metric(s)", samples.len());
        Ok(RefreshScheduler::with_initial_samples(device, config, samples))
    }
}
