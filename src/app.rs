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

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::{FanMode, MonitorConfig};
use crate::device::Device;
use crate::metrics::ValueStore;
use crate::scheduler::{FeatureFlags, Notification, RefreshScheduler, UiSink, WindowState};
use crate::stats::OperatingPointShare;

const MAX_NOTICES: usize = 4;

/// TUI state: the last published snapshot plus the user's toggles
pub struct App {
    pub flags: FeatureFlags,
    pub window: WindowState,
    pub snapshot: ValueStore,
    pub stats: Vec<OperatingPointShare>,
    pub notices: VecDeque<String>,
    pub loading: bool,
    // header
    pub root_mode: bool,
    pub daemon_connected: bool,
    pub fan_mode: FanMode,
    pub active_profile: String,
    pub hysteresis: u32,
    pub fixed_fan_speed: u8,
    // refresh timing
    pub last_refresh: Instant,
    pub refresh_interval: Duration,
}

impl App {
    pub fn new(cfg: &MonitorConfig, root_mode: bool) -> Self {
        Self {
            flags: FeatureFlags::from_config(cfg),
            window: WindowState { hidden: false, minimized: cfg.start_minimized },
            snapshot: ValueStore::new(),
            stats: Vec::new(),
            notices: VecDeque::new(),
            loading: true,
            root_mode,
            daemon_connected: false,
            fan_mode: cfg.fan_mode,
            active_profile: cfg.active_fan_profile.clone(),
            hysteresis: cfg.hysteresis,
            fixed_fan_speed: cfg.fixed_fan_speed,
            last_refresh: Instant::now(),
            refresh_interval: cfg.interval(),
        }
    }

    /// Pull the settings the scheduler owns after an intent was applied
    pub fn sync_from<D: Device>(&mut self, sched: &RefreshScheduler<D>) {
        let cfg = sched.config();
        self.fan_mode = cfg.fan_mode;
        self.flags.fan_profile_mode = cfg.fan_mode == FanMode::Curve;
        self.active_profile = cfg.active_fan_profile.clone();
        self.hysteresis = cfg.hysteresis;
        self.fixed_fan_speed = cfg.fixed_fan_speed;
        self.refresh_interval = sched.interval();
        self.daemon_connected = sched.daemon_connected();
    }

    pub fn push_notice(&mut self, msg: impl Into<String>) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(msg.into());
    }

    pub fn time_until_tick(&self) -> Duration {
        self.refresh_interval.saturating_sub(self.last_refresh.elapsed())
    }

    pub fn tick_due(&self) -> bool {
        self.last_refresh.elapsed() >= self.refresh_interval
    }

    pub fn mark_refreshed(&mut self) {
        self.last_refresh = Instant::now();
    }

    pub fn status_line(&self) -> String {
        let mode = match self.fan_mode {
            FanMode::Auto => "auto".to_string(),
            FanMode::Fixed => format!("fixed {}%", self.fixed_fan_speed),
            FanMode::Curve => format!("curve '{}'", self.active_profile),
        };
        format!(
            "fan: {}  hysteresis: {}°C  stats: {}  daemon: {}{}",
            mode,
            self.hysteresis,
            if self.flags.stats_tracking { "on" } else { "off" },
            if self.daemon_connected { "connected" } else { "not connected" },
            if self.root_mode { "  [running as root]" } else { "" },
        )
    }
}

impl UiSink for App {
    fn publish(&mut self, snapshot: &ValueStore, stats: Option<&[OperatingPointShare]>) {
        self.loading = false;
        self.snapshot = snapshot.clone();
        match stats {
            Some(s) => self.stats = s.to_vec(),
            None => self.stats.clear(),
        }
    }

    fn notify(&mut self, notification: Notification) {
        match notification {
            Notification::FanWriteFailed(e) => self.push_notice(format!("fan write failed: {}", e)),
        }
    }
}
