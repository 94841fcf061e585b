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

//! Telemetry configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which platform memory probe the memory tracker samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoryProbeKind {
    /// Resident memory of the current process, read through `sysinfo`.
    #[default]
    Process,
    /// No platform sample; the total is the explicitly tracked memory.
    TrackedOnly,
}

/// Complete telemetry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Number of frame samples kept (60 seconds at 60 FPS by default).
    pub frame_buffer_capacity: usize,
    /// Frames slower than this, in milliseconds, count as spikes.
    pub spike_threshold_ms: f64,
    /// Number of recent calls averaged per system.
    pub rolling_window_size: usize,
    /// Number of budget violations kept.
    pub violation_history_capacity: usize,
    /// Budget given to systems recorded without registration.
    pub default_budget_ms: f64,
    /// Budgets registered at startup, by system name.
    pub system_budgets: HashMap<String, f64>,
    /// Ticks between two memory snapshots.
    pub snapshot_interval_ticks: u64,
    /// Number of memory snapshots kept.
    pub snapshot_history_capacity: usize,
    /// Growth rate above which a leak is reported, in MB per minute.
    pub leak_threshold_mb_per_min: f64,
    /// Platform memory source.
    pub memory_probe: MemoryProbeKind,
    /// Build identifier stamped into baselines and reports.
    pub build_version: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            frame_buffer_capacity: 3600,
            spike_threshold_ms: 16.67,
            rolling_window_size: 60,
            violation_history_capacity: 100,
            default_budget_ms: 1.0,
            system_budgets: HashMap::new(),
            snapshot_interval_ticks: 100,
            snapshot_history_capacity: 60,
            leak_threshold_mb_per_min: 10.0,
            memory_probe: MemoryProbeKind::default(),
            build_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Load telemetry configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load telemetry configuration from JSON file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Save telemetry configuration to JSON file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Adds a startup budget for `system`.
    pub fn with_budget(mut self, system: impl Into<String>, budget_ms: f64) -> Self {
        self.system_budgets.insert(system.into(), budget_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.frame_buffer_capacity, 3600);
        assert_eq!(config.snapshot_interval_ticks, 100);
        assert_eq!(config.memory_probe, MemoryProbeKind::Process);
        assert!(config.system_budgets.is_empty());
    }

    #[test]
    fn test_from_json_with_budgets() {
        let json = r#"{
            "spike_threshold_ms": 33.3,
            "memory_probe": "TrackedOnly",
            "system_budgets": { "Combat": 2.0, "AI": 3.5 }
        }"#;

        let config = TelemetryConfig::from_json(json).unwrap();

        assert_eq!(config.spike_threshold_ms, 33.3);
        assert_eq!(config.memory_probe, MemoryProbeKind::TrackedOnly);
        assert_eq!(config.system_budgets.get("AI"), Some(&3.5));
        assert_eq!(config.rolling_window_size, 60, "missing fields use defaults");
    }
}
