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

//! Error type shared by the configuration, curve and device layers.
//!
//! Nothing in here is fatal to the refresh loop: the scheduler turns every
//! variant into a skipped step or a UI notification.

use std::io;
use std::path::PathBuf;

use crate::device::DeviceError;

/// Result type alias using MonitorError
pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    #[error("Curve validation failed: {0}")]
    InvalidCurve(String),

    #[error("Fan curve is empty, curve control disabled")]
    CurveMisconfigured,

    #[error("Unknown fan profile: {0}")]
    UnknownProfile(String),

    // ============================================================================
    // Device Errors
    // ============================================================================
    #[error("Failed to set fan speed: {0}")]
    DeviceWriteFailed(#[from] DeviceError),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl MonitorError {
    /// Create an invalid config error for a named field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a curve validation error
    pub fn invalid_curve(msg: impl Into<String>) -> Self {
        Self::InvalidCurve(msg.into())
    }
}

impl From<String> for MonitorError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

impl From<&str> for MonitorError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = MonitorError::invalid_config("hysteresis", "must be <= 30");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for hysteresis: must be <= 30"
        );
    }

    #[test]
    fn test_device_error_converts() {
        let err: MonitorError = DeviceError::Disconnected.into();
        assert!(matches!(err, MonitorError::DeviceWriteFailed(_)));
        assert!(err.to_string().starts_with("Failed to set fan speed"));
    }

    #[test]
    fn test_from_str() {
        let err: MonitorError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
