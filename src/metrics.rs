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

//! Telemetry values and their running min/max.
//!
//! A metric that the device never reported is simply not in the store. There
//! is no zero or sentinel value standing in for "unknown".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    PowerLevel,
    CoreClock,
    MemClock,
    UvdClock,
    UvdDecoderClock,
    CoreVoltage,
    MemVoltage,
    Temperature,
    PowerCap,
    FanSpeedPercent,
    FanSpeedRpm,
    GpuUsage,
}

impl MetricId {
    pub const ALL: [MetricId; 12] = [
        MetricId::PowerLevel,
        MetricId::CoreClock,
        MetricId::MemClock,
        MetricId::UvdClock,
        MetricId::UvdDecoderClock,
        MetricId::CoreVoltage,
        MetricId::MemVoltage,
        MetricId::Temperature,
        MetricId::PowerCap,
        MetricId::FanSpeedPercent,
        MetricId::FanSpeedRpm,
        MetricId::GpuUsage,
    ];

    /// Human readable name used in lists and the summary text
    pub fn name(self) -> &'static str {
        match self {
            MetricId::PowerLevel => "Power level",
            MetricId::CoreClock => "GPU clock",
            MetricId::MemClock => "Memory clock",
            MetricId::UvdClock => "UVD core clock (cclk)",
            MetricId::UvdDecoderClock => "UVD decoder clock (dclk)",
            MetricId::CoreVoltage => "GPU voltage (vddc)",
            MetricId::MemVoltage => "I/O voltage (vddci)",
            MetricId::Temperature => "Temperature",
            MetricId::PowerCap => "Power cap",
            MetricId::FanSpeedPercent => "Fan speed",
            MetricId::FanSpeedRpm => "Fan speed RPM",
            MetricId::GpuUsage => "GPU usage",
        }
    }

    /// Metrics that keep a running min/max for the session
    pub fn is_tracked(self) -> bool {
        matches!(self, MetricId::Temperature | MetricId::PowerCap)
    }

    pub fn unit(self) -> &'static str {
        match self {
            MetricId::CoreClock
            | MetricId::MemClock
            | MetricId::UvdClock
            | MetricId::UvdDecoderClock => "MHz",
            MetricId::CoreVoltage | MetricId::MemVoltage => "mV",
            MetricId::Temperature => "°C",
            MetricId::PowerCap => "W",
            MetricId::FanSpeedPercent | MetricId::GpuUsage => "%",
            MetricId::FanSpeedRpm => "rpm",
            MetricId::PowerLevel => "",
        }
    }

    /// Default display string for a raw value
    pub fn format(self, raw: f64) -> String {
        match self {
            MetricId::Temperature => format!("{:.1}{}", raw, self.unit()),
            _ => format!("{}{}", raw.round() as i64, self.unit()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub id: MetricId,
    pub raw: f64,
    pub display: String,
}

impl MetricSample {
    pub fn new(id: MetricId, raw: f64, display: impl Into<String>) -> Self {
        Self { id, raw, display: display.into() }
    }

    /// Sample with the metric's default formatting
    pub fn formatted(id: MetricId, raw: f64) -> Self {
        Self { id, raw, display: id.format(raw) }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug)]
struct Slot {
    current: MetricSample,
    previous: Option<f64>,
    range: Option<MetricRange>,
}

/// Current telemetry plus derived min/max for tracked metrics
#[derive(Clone, Debug, Default)]
pub struct ValueStore {
    slots: BTreeMap<MetricId, Slot>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, id: MetricId, raw: f64, display: impl Into<String>) {
        let sample = MetricSample::new(id, raw, display);
        match self.slots.get_mut(&id) {
            Some(slot) => {
                slot.previous = Some(slot.current.raw);
                if let Some(range) = slot.range.as_mut() {
                    range.min = range.min.min(raw);
                    range.max = range.max.max(raw);
                }
                slot.current = sample;
            }
            None => {
                let range = id.is_tracked().then_some(MetricRange { min: raw, max: raw });
                self.slots.insert(id, Slot { current: sample, previous: None, range });
            }
        }
    }

    /// Bulk update from a device sample set
    pub fn apply<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = MetricSample>,
    {
        for s in samples {
            self.update(s.id, s.raw, s.display);
        }
    }

    pub fn get(&self, id: MetricId) -> Option<&MetricSample> {
        self.slots.get(&id).map(|s| &s.current)
    }

    pub fn contains(&self, id: MetricId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn raw(&self, id: MetricId) -> Option<f64> {
        self.get(id).map(|s| s.raw)
    }

    /// Raw value seen on the update before the current one
    pub fn previous_raw(&self, id: MetricId) -> Option<f64> {
        self.slots.get(&id).and_then(|s| s.previous)
    }

    pub fn range(&self, id: MetricId) -> Option<MetricRange> {
        self.slots.get(&id).and_then(|s| s.range)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Samples in a stable display order
    pub fn samples(&self) -> impl Iterator<Item = &MetricSample> {
        self.slots.values().map(|s| &s.current)
    }

    /// `"45.0°C (min: 30.0°C max: 71.0°C)"` for tracked metrics, the plain
    /// display string otherwise
    pub fn current_min_max_string(&self, id: MetricId) -> Option<String> {
        let slot = self.slots.get(&id)?;
        Some(match slot.range {
            Some(r) => format!(
                "{} (min: {} max: {})",
                slot.current.display,
                id.format(r.min),
                id.format(r.max)
            ),
            None => slot.current.display.clone(),
        })
    }

    /// One `name: value` line per present metric
    pub fn summary_lines(&self) -> Vec<String> {
        self.slots
            .keys()
            .filter_map(|id| {
                self.current_min_max_string(*id)
                    .map(|v| format!("{}: {}", id.name(), v))
            })
            .collect()
    }
}
