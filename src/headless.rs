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

//! Headless mode: the refresh loop with the UI replaced by log output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tracing::{info, warn};

use crate::device::Device;
use crate::logger;
use crate::metrics::ValueStore;
use crate::scheduler::{FeatureFlags, Notification, RefreshScheduler, UiSink};
use crate::stats::OperatingPointShare;

/// Publishes each snapshot as one summary line
#[derive(Default)]
pub struct LogSink {
    pub lines_written: usize,
}

impl LogSink {
    pub fn summary(snapshot: &ValueStore, stats: Option<&[OperatingPointShare]>) -> String {
        let mut line = snapshot.summary_lines().join(" | ");
        if let Some(stats) = stats.filter(|s| !s.is_empty()) {
            let parts: Vec<String> = stats
                .iter()
                .map(|s| format!("{} {:.1}%", s.key, s.percent))
                .collect();
            line.push_str(" || ");
            line.push_str(&parts.join(", "));
        }
        line
    }
}

impl UiSink for LogSink {
    fn publish(&mut self, snapshot: &ValueStore, stats: Option<&[OperatingPointShare]>) {
        self.lines_written += 1;
        info!("{}", Self::summary(snapshot, stats));
    }

    fn notify(&mut self, notification: Notification) {
        match notification {
            Notification::FanWriteFailed(e) => warn!("fan write failed: {}", e),
        }
    }
}

/// Run until Ctrl-C
pub fn run_headless<D: Device>(sched: &mut RefreshScheduler<D>, mut flags: FeatureFlags) -> anyhow::Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
        .context("install Ctrl-C handler")?;

    // nothing on screen, but stats go into the log line
    flags.stats_view_active = flags.stats_tracking;
    info!(
        "Headless refresh every {}s (daemon {})",
        sched.interval().as_secs(),
        if sched.daemon_connected() { "connected" } else { "not connected" }
    );

    let mut sink = LogSink::default();
    sched.run_until(flags, &mut sink, &stop);

    logger::log_event("shutdown", json!({ "ticks": sched.ticks() }));
    info!("Stopped after {} tick(s)", sched.ticks());
    Ok(())
}
