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

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::curve::{CurvePoint, FanCurve, MIN_FAN_STEPS_SPEED};
use crate::error::{MonitorError, Result};

pub const DEFAULT_PROFILE: &str = "default";

const MAX_PROFILES: usize = 32;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    /// Driver decides
    #[default]
    Auto,
    /// Constant `fixed_fan_speed`
    Fixed,
    /// Follow the active fan profile
    Curve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Degrees the temperature must fall below the last change before the
    /// fan is slowed down
    #[serde(default = "default_hysteresis")]
    pub hysteresis: u32,
    #[serde(default = "default_min_fan_speed")]
    pub min_fan_speed: u8,
    #[serde(default = "default_fan_profiles")]
    pub fan_profiles: BTreeMap<String, Vec<CurvePoint>>,
    #[serde(default = "default_profile_name")]
    pub active_fan_profile: String,
    #[serde(default)]
    pub fan_mode: FanMode,
    #[serde(default = "default_fixed_fan_speed")]
    pub fixed_fan_speed: u8,
    /// Restore `fan_mode` at startup
    #[serde(default)]
    pub save_fan_mode: bool,
    #[serde(default)]
    pub stats_tracking: bool,
    #[serde(default)]
    pub refresh_when_hidden: bool,
    #[serde(default)]
    pub start_minimized: bool,
}

fn default_interval_secs() -> u64 { 1 }
fn default_hysteresis() -> u32 { 3 }
fn default_min_fan_speed() -> u8 { MIN_FAN_STEPS_SPEED }
fn default_fixed_fan_speed() -> u8 { 50 }
fn default_profile_name() -> String { DEFAULT_PROFILE.to_string() }

fn default_fan_profiles() -> BTreeMap<String, Vec<CurvePoint>> {
    let mut profiles = BTreeMap::new();
    profiles.insert(
        DEFAULT_PROFILE.to_string(),
        vec![
            CurvePoint::new(0, MIN_FAN_STEPS_SPEED),
            CurvePoint::new(65, 100),
            CurvePoint::new(90, 100),
        ],
    );
    profiles
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            hysteresis: default_hysteresis(),
            min_fan_speed: default_min_fan_speed(),
            fan_profiles: default_fan_profiles(),
            active_fan_profile: default_profile_name(),
            fan_mode: FanMode::Auto,
            fixed_fan_speed: default_fixed_fan_speed(),
            save_fan_mode: false,
            stats_tracking: false,
            refresh_when_hidden: false,
            start_minimized: false,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Curve of the active profile with the configured floor applied
    pub fn active_curve(&self) -> Result<FanCurve> {
        self.curve_for(&self.active_fan_profile)
    }

    pub fn curve_for(&self, profile: &str) -> Result<FanCurve> {
        let points = self
            .fan_profiles
            .get(profile)
            .ok_or_else(|| MonitorError::UnknownProfile(profile.to_string()))?;
        FanCurve::with_floor(points.clone(), self.min_fan_speed)
    }

    /// Profile names in a stable order
    pub fn profile_names(&self) -> Vec<String> {
        self.fan_profiles.keys().cloned().collect()
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("radeon-monitor").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("radeon-monitor")
            .join("config.json");
    }
    PathBuf::from("/etc/radeon-monitor/config.json")
}

pub fn load_config(path: &Path) -> Result<MonitorConfig> {
    let data = fs::read_to_string(path).map_err(|source| MonitorError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: MonitorConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load `path`, falling back to defaults when it is missing or invalid
pub fn load_or_default(path: &Path) -> MonitorConfig {
    if !path.exists() {
        return MonitorConfig::default();
    }
    match load_config(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Ignoring config {}: {}", path.display(), e);
            MonitorConfig::default()
        }
    }
}

pub fn save_config(path: &Path, cfg: &MonitorConfig) -> Result<()> {
    validate_config(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json).map_err(|source| MonitorError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    // Best-effort set permissions to 0644
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o644));
    Ok(())
}

pub fn validate_config(cfg: &MonitorConfig) -> Result<()> {
    if !(1..=60).contains(&cfg.interval_secs) {
        return Err(MonitorError::invalid_config("interval_secs", "must be 1..=60"));
    }
    if cfg.hysteresis > 30 {
        return Err(MonitorError::invalid_config("hysteresis", "must be <= 30"));
    }
    if cfg.min_fan_speed > 100 {
        return Err(MonitorError::invalid_config("min_fan_speed", "must be <= 100"));
    }
    if cfg.fixed_fan_speed > 100 {
        return Err(MonitorError::invalid_config("fixed_fan_speed", "must be <= 100"));
    }
    if cfg.fan_profiles.len() > MAX_PROFILES {
        return Err(MonitorError::invalid_config("fan_profiles", "too many profiles (max 32)"));
    }
    for (name, points) in &cfg.fan_profiles {
        if name.is_empty() || name.len() > 64 {
            return Err(MonitorError::invalid_config("fan_profiles", "invalid profile name"));
        }
        FanCurve::with_floor(points.clone(), cfg.min_fan_speed)?;
    }
    if !cfg.fan_profiles.contains_key(&cfg.active_fan_profile) {
        return Err(MonitorError::UnknownProfile(cfg.active_fan_profile.clone()));
    }
    Ok(())
}
