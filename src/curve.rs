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

//! Temperature to fan duty curves.
//!
//! A curve is a sorted list of `(°C, duty %)` points. Between two points the
//! duty is linearly interpolated, outside the covered range the nearest point
//! wins. [`evaluate`] adds the hysteresis gate used by the refresh loop: a fan
//! speed decrease is only applied once the temperature has dropped at least
//! `hysteresis` degrees below the temperature of the last applied change.

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// Lowest duty the curve will ever produce, keeps the fan from stalling
pub const MIN_FAN_STEPS_SPEED: u8 = 10;

pub const MAX_CURVE_POINTS: usize = 32;

pub const MIN_CURVE_TEMP: i32 = -50;
pub const MAX_CURVE_TEMP: i32 = 150;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub temp_c: i32,
    pub duty_pct: u8,
}

impl CurvePoint {
    pub const fn new(temp_c: i32, duty_pct: u8) -> Self {
        Self { temp_c, duty_pct }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FanCurve {
    points: Vec<CurvePoint>,
    floor: u8,
}

impl Default for FanCurve {
    fn default() -> Self {
        Self::empty()
    }
}

impl FanCurve {
    /// A curve with no points; curve control stays off while it is active
    pub fn empty() -> Self {
        Self { points: Vec::new(), floor: MIN_FAN_STEPS_SPEED }
    }

    /// Build a curve using the default floor
    pub fn new(points: Vec<CurvePoint>) -> Result<Self> {
        Self::with_floor(points, MIN_FAN_STEPS_SPEED)
    }

    /// Build a curve. Points are sorted by temperature; duplicate temperatures,
    /// temperatures outside `MIN_CURVE_TEMP..=MAX_CURVE_TEMP` and duties above
    /// 100 are rejected. Points are kept as given, `floor` only clamps results.
    pub fn with_floor(mut points: Vec<CurvePoint>, floor: u8) -> Result<Self> {
        if floor > 100 {
            return Err(MonitorError::invalid_curve("floor must be <= 100"));
        }
        if points.len() > MAX_CURVE_POINTS {
            return Err(MonitorError::invalid_curve(format!(
                "too many curve points (max {})",
                MAX_CURVE_POINTS
            )));
        }
        points.sort_by_key(|p| p.temp_c);
        if points.windows(2).any(|w| w[0].temp_c == w[1].temp_c) {
            return Err(MonitorError::invalid_curve("duplicate temperature in curve"));
        }
        for p in &points {
            if !(MIN_CURVE_TEMP..=MAX_CURVE_TEMP).contains(&p.temp_c) {
                return Err(MonitorError::invalid_curve(format!(
                    "temperature {}°C out of range ({}..={})",
                    p.temp_c, MIN_CURVE_TEMP, MAX_CURVE_TEMP
                )));
            }
            if p.duty_pct > 100 {
                return Err(MonitorError::invalid_curve(format!(
                    "duty {}% at {}°C out of range",
                    p.duty_pct, p.temp_c
                )));
            }
        }
        Ok(Self { points, floor })
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn floor(&self) -> u8 {
        self.floor
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Duty for `temp_c` with no hysteresis applied
    pub fn duty_at(&self, temp_c: f64) -> Option<u8> {
        let pts = &self.points;
        if pts.is_empty() {
            return None;
        }

        // index of the first point strictly above temp_c
        let high = pts.partition_point(|p| f64::from(p.temp_c) <= temp_c);
        if high > 0 && f64::from(pts[high - 1].temp_c) == temp_c {
            return Some(self.clamp(f64::from(pts[high - 1].duty_pct)));
        }

        let duty = match (high.checked_sub(1).map(|i| pts[i]), pts.get(high)) {
            (None, Some(h)) => f64::from(h.duty_pct),
            (Some(l), None) => f64::from(l.duty_pct),
            (Some(l), Some(h)) => {
                let slope = (f64::from(h.duty_pct) - f64::from(l.duty_pct))
                    / (f64::from(h.temp_c) - f64::from(l.temp_c));
                slope * (temp_c - f64::from(l.temp_c)) + f64::from(l.duty_pct)
            }
            (None, None) => return None,
        };
        Some(self.clamp(duty))
    }

    fn clamp(&self, duty: f64) -> u8 {
        duty.max(f64::from(self.floor)).min(100.0) as u8
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HysteresisState {
    /// Temperature at which the fan speed was last changed
    pub last_applied_reference_temperature: f64,
}

impl HysteresisState {
    pub fn new(reference: f64) -> Self {
        Self { last_applied_reference_temperature: reference }
    }

    /// Move the reference point without going through the gate
    pub fn resync(&mut self, temp_c: f64) {
        self.last_applied_reference_temperature = temp_c;
    }
}

/// Hysteresis-gated curve evaluation.
///
/// Returns `None` when the temperature did not change, or when it fell by
/// less than `hysteresis` below the last applied reference.
pub fn evaluate(
    curve: &FanCurve,
    current_temp: f64,
    previous_temp: f64,
    hysteresis: f64,
    state: &mut HysteresisState,
) -> Option<u8> {
    if current_temp == previous_temp {
        return None;
    }

    if current_temp < previous_temp
        && hysteresis > state.last_applied_reference_temperature - current_temp
    {
        return None;
    }

    if curve.is_empty() {
        return None;
    }

    state.last_applied_reference_temperature = current_temp;
    curve.duty_at(current_temp)
}
