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

//! The GPU as seen by the refresh loop.
//!
//! Concrete driver access lives behind [`Device`]. Sampling is best effort:
//! a metric the driver can't provide is left out of the returned set.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MonitorError, Result};
use crate::metrics::{MetricId, MetricSample};

#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("write rejected by driver: {0}")]
    WriteRejected(String),

    #[error("operation not supported: {0}")]
    NotSupported(String),

    #[error("device disconnected")]
    Disconnected,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerMethod {
    Dpm,
    Profile,
    #[default]
    Unknown,
}

/// What the driver lets us change
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverFeatures {
    #[serde(default)]
    pub change_profile_available: bool,
    #[serde(default)]
    pub power_method: PowerMethod,
}

#[cfg_attr(test, mockall::automock)]
pub trait Device: Send {
    /// Read every metric the driver currently exposes
    fn sample(&mut self) -> Vec<MetricSample>;

    /// Read only the temperature, used while the window is hidden
    fn sample_temperature(&mut self) -> Option<MetricSample> {
        self.sample().into_iter().find(|s| s.id == MetricId::Temperature)
    }

    fn set_fan_duty(&mut self, percent: u8) -> std::result::Result<(), DeviceError>;

    /// Hand fan control back to the driver
    fn set_fan_auto(&mut self) -> std::result::Result<(), DeviceError>;

    fn daemon_connected(&self) -> bool;

    fn features(&self) -> DriverFeatures;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FanCommand {
    Duty(u8),
    Auto,
}

#[derive(Debug, Deserialize)]
struct TraceSample {
    id: MetricId,
    raw: f64,
    #[serde(default)]
    display: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Trace {
    #[serde(default)]
    features: DriverFeatures,
    #[serde(default)]
    daemon_connected: bool,
    frames: Vec<Vec<TraceSample>>,
}

/// Device that replays recorded frames and remembers every fan command
#[derive(Debug, Default)]
pub struct ScriptedDevice {
    frames: Vec<Vec<MetricSample>>,
    cursor: usize,
    features: DriverFeatures,
    daemon: bool,
    reject_writes: bool,
    fan_commands: Vec<FanCommand>,
}

impl ScriptedDevice {
    pub fn new(frames: Vec<Vec<MetricSample>>, features: DriverFeatures) -> Self {
        Self { frames, features, ..Self::default() }
    }

    /// Load a JSON trace: `{"features": {..}, "frames": [[{"id": .., "raw": ..}]]}`
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| MonitorError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let dev = Self::from_json(&data)?;
        info!("Loaded {} frame(s) from {}", dev.frames.len(), path.display());
        Ok(dev)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let trace: Trace = serde_json::from_str(data)?;
        if trace.frames.is_empty() {
            return Err(MonitorError::DeviceNotFound("trace has no frames".into()));
        }
        let frames = trace
            .frames
            .into_iter()
            .map(|frame| {
                frame
                    .into_iter()
                    .map(|s| match s.display {
                        Some(d) => MetricSample::new(s.id, s.raw, d),
                        None => MetricSample::formatted(s.id, s.raw),
                    })
                    .collect()
            })
            .collect();
        Ok(Self {
            frames,
            features: trace.features,
            daemon: trace.daemon_connected,
            ..Self::default()
        })
    }

    pub fn with_daemon(mut self, connected: bool) -> Self {
        self.daemon = connected;
        self
    }

    /// Make every fan write fail, for exercising error paths
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    pub fn fan_commands(&self) -> &[FanCommand] {
        &self.fan_commands
    }

    pub fn last_duty(&self) -> Option<u8> {
        self.fan_commands.iter().rev().find_map(|c| match c {
            FanCommand::Duty(d) => Some(*d),
            FanCommand::Auto => None,
        })
    }

    fn next_frame(&mut self) -> Vec<MetricSample> {
        if self.frames.is_empty() {
            return Vec::new();
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        frame
    }

    fn write(&mut self, cmd: FanCommand) -> std::result::Result<(), DeviceError> {
        if self.reject_writes {
            return Err(DeviceError::WriteRejected(format!("{:?}", cmd)));
        }
        debug!("fan command {:?}", cmd);
        self.fan_commands.push(cmd);
        Ok(())
    }
}

impl Device for ScriptedDevice {
    fn sample(&mut self) -> Vec<MetricSample> {
        self.next_frame()
    }

    fn set_fan_duty(&mut self, percent: u8) -> std::result::Result<(), DeviceError> {
        self.write(FanCommand::Duty(percent.min(100)))
    }

    fn set_fan_auto(&mut self) -> std::result::Result<(), DeviceError> {
        self.write(FanCommand::Auto)
    }

    fn daemon_connected(&self) -> bool {
        self.daemon
    }

    fn features(&self) -> DriverFeatures {
        self.features
    }
}
