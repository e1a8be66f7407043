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

//! Opt-in JSON-lines event log (`--logging`).
//!
//! Events are dropped until [`init_logging`] has opened a file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

const FALLBACK_LOG_PATH: &str = "/tmp/radeon-monitor-events.json";

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

pub fn default_log_path() -> PathBuf {
    crate::config::config_path()
        .with_file_name("events.json")
}

fn open_append(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Open `path` for appending; falls back to /tmp when that fails.
/// Returns the path actually in use.
pub fn init_logging(path: &Path) -> Option<PathBuf> {
    let (file, used) = match open_append(path) {
        Some(f) => (f, path.to_path_buf()),
        None => {
            let fallback = PathBuf::from(FALLBACK_LOG_PATH);
            (open_append(&fallback)?, fallback)
        }
    };
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }
    Some(used)
}

pub fn is_enabled() -> bool {
    LOG_FILE.lock().map(|g| g.is_some()).unwrap_or(false)
}

pub fn event_line(event: &str, data: Value) -> String {
    json!({
        "ts_ms": now_millis(),
        "event": event,
        "data": data,
    })
    .to_string()
}

pub fn log_event(event: &str, data: Value) {
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(f) = guard.as_mut() {
            let _ = writeln!(f, "{}", event_line(event, data));
        }
    }
}
