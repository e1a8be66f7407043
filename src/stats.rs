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

//! Time spent at each (core clock, memory clock) operating point.

use std::collections::HashMap;

/// Share of session ticks spent at one operating point
#[derive(Clone, Debug, PartialEq)]
pub struct OperatingPointShare {
    pub key: String,
    pub count: u64,
    pub percent: f64,
}

#[derive(Clone, Debug, Default)]
pub struct StatsAggregator {
    ticks: u64,
    counts: HashMap<String, u64>,
    // first-seen order, used for display
    order: Vec<String>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operating_point_key(core_clock: &str, mem_clock: &str) -> String {
        format!("{}/{}", core_clock, mem_clock)
    }

    pub fn record(&mut self, core_clock: &str, mem_clock: &str) {
        self.ticks += 1;
        let key = Self::operating_point_key(core_clock, mem_clock);
        match self.counts.get_mut(&key) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(key.clone(), 1);
                self.order.push(key);
            }
        }
    }

    pub fn total_ticks(&self) -> u64 {
        self.ticks
    }

    pub fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    /// Percentage of recorded ticks per operating point; empty before the
    /// first record
    pub fn percentages(&self) -> HashMap<String, f64> {
        if self.ticks == 0 {
            return HashMap::new();
        }
        self.counts
            .iter()
            .map(|(k, c)| (k.clone(), *c as f64 * 100.0 / self.ticks as f64))
            .collect()
    }

    /// Same data as [`percentages`](Self::percentages), in first-seen order
    pub fn entries(&self) -> Vec<OperatingPointShare> {
        if self.ticks == 0 {
            return Vec::new();
        }
        self.order
            .iter()
            .map(|key| {
                let count = self.counts.get(key).copied().unwrap_or(0);
                OperatingPointShare {
                    key: key.clone(),
                    count,
                    percent: count as f64 * 100.0 / self.ticks as f64,
                }
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
        self.counts.clear();
        self.order.clear();
    }
}
