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

//! Radeon Monitor - GPU telemetry and fan control
//!
//! This library provides the refresh loop that samples a GPU, keeps running
//! min/max values, drives the fan from a temperature curve with hysteresis
//! and counts time spent at each clock operating point.

pub mod error;
pub mod metrics;
pub mod curve;
pub mod stats;
pub mod device;
pub mod config;
pub mod scheduler;
pub mod logger;
pub mod headless;
pub mod app;
pub mod events;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
