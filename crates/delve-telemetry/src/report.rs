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

//! Aggregate performance report.

use delve_core::telemetry::{BudgetViolation, FrameStatistics, MemorySnapshot, SystemPerformanceData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

/// A serializable snapshot of every tracker, consumed by export and UI layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Wall-clock time the report was generated.
    pub generated_at: SystemTime,
    /// Build identifier from the configuration.
    pub build_version: String,
    /// Accumulated tick time in seconds.
    pub session_duration_seconds: f64,
    /// Frames recorded this session.
    pub total_frames: u64,

    /// Statistics over the buffered frames.
    pub frame_statistics: FrameStatistics,
    /// FPS of the latest frame.
    pub current_fps: f64,
    /// FPS over every buffered frame.
    pub average_fps: f64,
    /// 1% low FPS.
    pub one_percent_low_fps: f64,
    /// 0.1% low FPS.
    pub point_one_percent_low_fps: f64,
    /// Whether the latest frames are slow.
    pub spike_detected: bool,
    /// Length of the current slow-frame run.
    pub consecutive_slow_frames: u32,

    /// Every system record, sorted by name.
    pub systems: Vec<SystemPerformanceData>,
    /// Newest budget violations, newest first.
    pub recent_violations: Vec<BudgetViolation>,
    /// Violations recorded this session.
    pub total_violations: u64,

    /// Latest memory snapshot, if one was taken.
    pub memory: Option<MemorySnapshot>,
    /// Highest total memory observed, in bytes.
    pub peak_memory: u64,
    /// Latest growth rate in MB per minute.
    pub memory_growth_mb_per_min: f64,
    /// Whether the leak threshold is currently exceeded.
    pub leak_detected: bool,

    /// Entity counts reported by game code, by kind.
    pub entity_counts: BTreeMap<String, u64>,
}

impl PerformanceReport {
    /// Systems whose current cycle time exceeds their budget.
    pub fn over_budget_systems(&self) -> impl Iterator<Item = &SystemPerformanceData> {
        self.systems.iter().filter(|s| s.is_budget_violated())
    }

    /// Serializes the report as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
