// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors reported by the telemetry trackers and baseline store.

use std::fmt::{self, Display};

/// A specialized `Result` for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// An error that can occur within the telemetry system.
#[derive(Debug)]
pub enum TelemetryError {
    /// A system name was empty.
    InvalidSystemName,
    /// A budget was zero, negative or not finite.
    InvalidBudget {
        /// The system the budget was meant for.
        system: String,
        /// The rejected value.
        budget_ms: f64,
    },
    /// No system is registered under this name.
    UnknownSystem(String),
    /// A baseline name was empty.
    InvalidBaselineName,
    /// No baseline is stored under this name.
    BaselineNotFound(String),
    /// Reading or writing a baseline file failed.
    Io(std::io::Error),
    /// A baseline could not be encoded or decoded.
    Serialization(serde_json::Error),
}

impl Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidSystemName => write!(f, "System name must not be empty"),
            TelemetryError::InvalidBudget { system, budget_ms } => {
                write!(f, "Invalid budget for '{system}': {budget_ms} ms")
            }
            TelemetryError::UnknownSystem(name) => write!(f, "System not registered: {name}"),
            TelemetryError::InvalidBaselineName => write!(f, "Baseline name must not be empty"),
            TelemetryError::BaselineNotFound(name) => write!(f, "Baseline not found: {name}"),
            TelemetryError::Io(e) => write!(f, "Baseline I/O error: {e}"),
            TelemetryError::Serialization(e) => write!(f, "Baseline serialization error: {e}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Io(e) => Some(e),
            TelemetryError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(e: std::io::Error) -> Self {
        TelemetryError::Io(e)
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(e: serde_json::Error) -> Self {
        TelemetryError::Serialization(e)
    }
}
