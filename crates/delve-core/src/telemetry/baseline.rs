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

use super::{FrameStatistics, MemorySnapshot, SystemPerformanceData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

/// FPS or frame time movement, in percent, counted as significant.
pub const FRAME_CHANGE_THRESHOLD_PERCENT: f64 = 5.0;
/// Memory growth, in percent, counted as a regression.
pub const MEMORY_REGRESSION_THRESHOLD_PERCENT: f64 = 10.0;

/// Relative change from `baseline` to `current` in percent.
///
/// A zero baseline yields 0 % rather than an infinite change.
pub fn percent_change(baseline: f64, current: f64) -> f64 {
    if baseline == 0.0 {
        0.0
    } else {
        (current - baseline) / baseline * 100.0
    }
}

/// A named, immutable capture of the telemetry state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBaseline {
    /// Name the baseline is stored under.
    pub name: String,
    /// Wall-clock time of the capture.
    pub capture_time: SystemTime,
    /// Build identifier supplied by the host.
    pub build_version: String,
    /// Frame statistics at capture time.
    pub average_frame_data: FrameStatistics,
    /// Average FPS at capture time.
    pub average_fps: f64,
    /// 1% low FPS at capture time.
    pub one_percent_low_fps: f64,
    /// Per-system records at capture time.
    pub system_data: BTreeMap<String, SystemPerformanceData>,
    /// Memory snapshot at capture time.
    pub memory_data: MemorySnapshot,
    /// Number of frames recorded when the baseline was taken.
    pub total_frames_captured: u64,
}

impl PerformanceBaseline {
    /// Compares `current` against this baseline.
    pub fn compare(&self, current: &PerformanceBaseline) -> BaselineComparison {
        BaselineComparison::between(self, current)
    }
}

/// Relative differences between a baseline and the current state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BaselineComparison {
    /// Average FPS change in percent.
    pub fps_change_percent: f64,
    /// Average frame time change in percent.
    pub frame_time_change_percent: f64,
    /// 1% low FPS change in percent.
    pub one_percent_low_change_percent: f64,
    /// Total memory change in percent.
    pub memory_change_percent: f64,
    /// Average time change per system present in both captures.
    pub system_changes: BTreeMap<String, f64>,
    /// Performance got measurably worse.
    pub is_regression: bool,
    /// Performance got measurably better.
    pub is_improvement: bool,
}

impl BaselineComparison {
    /// Computes the comparison of `current` against `baseline`.
    pub fn between(baseline: &PerformanceBaseline, current: &PerformanceBaseline) -> Self {
        let fps_change_percent = percent_change(baseline.average_fps, current.average_fps);
        let frame_time_change_percent = percent_change(
            baseline.average_frame_data.average_frame_time_ms,
            current.average_frame_data.average_frame_time_ms,
        );
        let one_percent_low_change_percent =
            percent_change(baseline.one_percent_low_fps, current.one_percent_low_fps);
        let memory_change_percent = percent_change(
            baseline.memory_data.total_memory as f64,
            current.memory_data.total_memory as f64,
        );

        let system_changes = baseline
            .system_data
            .iter()
            .filter_map(|(name, before)| {
                current.system_data.get(name).map(|after| {
                    (
                        name.clone(),
                        percent_change(before.average_time_ms, after.average_time_ms),
                    )
                })
            })
            .collect();

        let is_regression = fps_change_percent < -FRAME_CHANGE_THRESHOLD_PERCENT
            || frame_time_change_percent > FRAME_CHANGE_THRESHOLD_PERCENT
            || memory_change_percent > MEMORY_REGRESSION_THRESHOLD_PERCENT;
        let is_improvement = fps_change_percent > FRAME_CHANGE_THRESHOLD_PERCENT
            || frame_time_change_percent < -FRAME_CHANGE_THRESHOLD_PERCENT;

        Self {
            fps_change_percent,
            frame_time_change_percent,
            one_percent_low_change_percent,
            memory_change_percent,
            system_changes,
            is_regression,
            is_improvement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn baseline(fps: f64, frame_ms: f64, memory: u64) -> PerformanceBaseline {
        PerformanceBaseline {
            name: "test".to_string(),
            capture_time: SystemTime::UNIX_EPOCH,
            build_version: "dev".to_string(),
            average_frame_data: FrameStatistics {
                average_frame_time_ms: frame_ms,
                ..Default::default()
            },
            average_fps: fps,
            one_percent_low_fps: fps,
            system_data: BTreeMap::new(),
            memory_data: MemorySnapshot {
                total_memory: memory,
                ..Default::default()
            },
            total_frames_captured: 0,
        }
    }

    #[test]
    fn test_percent_change_zero_baseline() {
        assert_eq!(percent_change(0.0, 42.0), 0.0);
        assert_relative_eq!(percent_change(50.0, 60.0), 20.0);
        assert_relative_eq!(percent_change(60.0, 30.0), -50.0);
    }

    #[test]
    fn test_identical_captures_are_neutral() {
        let a = baseline(60.0, 16.6, 1000);
        let cmp = a.compare(&a.clone());
        assert!(!cmp.is_regression);
        assert!(!cmp.is_improvement);
        assert_eq!(cmp.fps_change_percent, 0.0);
    }

    #[test]
    fn test_fps_drop_is_regression() {
        let before = baseline(60.0, 16.6, 1000);
        let after = baseline(50.0, 16.6, 1000);
        let cmp = before.compare(&after);
        assert!(cmp.is_regression, "a 16% FPS drop must be flagged");
        assert!(!cmp.is_improvement);
    }

    #[test]
    fn test_memory_growth_alone_is_regression() {
        let before = baseline(60.0, 16.6, 1000);
        let after = baseline(60.0, 16.6, 1200);
        let cmp = before.compare(&after);
        assert_relative_eq!(cmp.memory_change_percent, 20.0);
        assert!(cmp.is_regression);
    }

    #[test]
    fn test_flags_are_independent() {
        // Faster frames but much more memory: both flags.
        let before = baseline(60.0, 16.0, 1000);
        let after = baseline(70.0, 14.0, 2000);
        let cmp = before.compare(&after);
        assert!(cmp.is_improvement);
        assert!(cmp.is_regression);
    }

    #[test]
    fn test_system_changes_only_for_shared_systems() {
        let mut before = baseline(60.0, 16.0, 0);
        let mut after = before.clone();
        let mut combat = SystemPerformanceData::new("Combat", 2.0);
        combat.average_time_ms = 1.0;
        before.system_data.insert("Combat".into(), combat.clone());
        before
            .system_data
            .insert("AI".into(), SystemPerformanceData::new("AI", 2.0));
        combat.average_time_ms = 1.5;
        after.system_data.insert("Combat".into(), combat);

        let cmp = before.compare(&after);
        assert_eq!(cmp.system_changes.len(), 1);
        assert_relative_eq!(cmp.system_changes["Combat"], 50.0);
    }
}
