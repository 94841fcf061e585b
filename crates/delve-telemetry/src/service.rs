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

//! Tick-driven telemetry service owning every tracker.

use crate::baseline::BaselineStore;
use crate::config::TelemetryConfig;
use crate::error::TelemetryResult;
use crate::frame::FrameTracker;
use crate::memory::{probe_for, MemoryProbe, MemoryTracker};
use crate::report::PerformanceReport;
use crate::system::SystemBudgetTracker;
use delve_core::telemetry::{BaselineComparison, MemorySnapshot, PerformanceBaseline};
use delve_core::Stopwatch;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;

/// Number of violations included in a generated report.
const REPORT_VIOLATION_COUNT: usize = 10;

/// Service for collecting frame, system and memory telemetry.
///
/// The host calls [`tick`](Self::tick) once per frame. The session clock is
/// the sum of the tick deltas, so timestamps follow game time.
#[derive(Debug)]
pub struct TelemetryService {
    config: TelemetryConfig,
    frames: FrameTracker,
    systems: SystemBudgetTracker,
    memory: MemoryTracker,
    baselines: BaselineStore,
    entity_counts: BTreeMap<String, u64>,
    session_time: f64,
}

impl TelemetryService {
    /// Creates a service with the memory probe selected in `config`.
    pub fn new(config: TelemetryConfig) -> Self {
        let probe = probe_for(config.memory_probe);
        Self::with_probe(config, probe)
    }

    /// Creates a service sampling memory through `probe`.
    pub fn with_probe(config: TelemetryConfig, probe: Box<dyn MemoryProbe>) -> Self {
        log::info!(
            "Telemetry service initialized ({} frame samples, snapshot every {} ticks).",
            config.frame_buffer_capacity,
            config.snapshot_interval_ticks
        );
        Self {
            frames: FrameTracker::from_config(&config),
            systems: SystemBudgetTracker::from_config(&config),
            memory: MemoryTracker::new(&config, probe),
            baselines: BaselineStore::new(),
            entity_counts: BTreeMap::new(),
            session_time: 0.0,
            config,
        }
    }

    /// Should be called once per frame with the frame delta in seconds.
    ///
    /// Records the frame, takes the throttled memory snapshot, then closes the
    /// frame for the system tracker.
    pub fn tick(&mut self, delta_seconds: f64) {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.session_time += delta_seconds;
        }
        self.frames.record_frame(delta_seconds, self.session_time);
        if self.memory.update_memory_snapshot(self.session_time) {
            log::trace!("Memory snapshot taken at {:.2}s.", self.session_time);
        }
        self.systems.update_frame();
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Accumulated tick time in seconds.
    pub fn session_time(&self) -> f64 {
        self.session_time
    }

    /// Returns a reference to the frame tracker.
    pub fn frames(&self) -> &FrameTracker {
        &self.frames
    }

    /// Returns a reference to the system budget tracker.
    pub fn systems(&self) -> &SystemBudgetTracker {
        &self.systems
    }

    /// Returns a reference to the memory tracker.
    pub fn memory(&self) -> &MemoryTracker {
        &self.memory
    }

    // --- Frames ---

    /// FPS of the latest frame.
    pub fn current_fps(&self) -> f64 {
        self.frames.current_fps()
    }

    /// FPS over the last `frames` frames.
    pub fn average_fps(&self, frames: usize) -> f64 {
        self.frames.average_fps(frames)
    }

    /// The 1% low FPS.
    pub fn one_percent_low_fps(&self) -> f64 {
        self.frames.one_percent_low_fps()
    }

    // --- Systems ---

    /// Registers a system budget.
    pub fn register_system(&mut self, name: &str, budget_ms: f64) -> TelemetryResult<()> {
        self.systems.register_system(name, budget_ms)
    }

    /// Changes the budget of a registered system.
    pub fn set_budget(&mut self, name: &str, budget_ms: f64) -> TelemetryResult<()> {
        self.systems.set_budget(name, budget_ms)
    }

    /// Records one call of `name` at the current session time.
    pub fn record_system_time(&mut self, name: &str, cycle_time_ms: f64) {
        self.systems
            .record_system_time(name, cycle_time_ms, self.session_time);
    }

    /// Runs `work`, records its duration under `name` and returns its result.
    pub fn time_system<R>(&mut self, name: &str, work: impl FnOnce() -> R) -> R {
        let watch = Stopwatch::new();
        let result = work();
        self.record_system_time(name, watch.elapsed_ms_f64());
        result
    }

    // --- Memory and entities ---

    /// Adds tracked bytes to `system`.
    pub fn track_allocation(&mut self, system: &str, bytes: u64) {
        self.memory.track_allocation(system, bytes);
    }

    /// Removes tracked bytes from `system`.
    pub fn track_deallocation(&mut self, system: &str, bytes: u64) {
        self.memory.track_deallocation(system, bytes);
    }

    /// Captures a memory snapshot immediately.
    pub fn capture_memory_snapshot(&mut self) -> MemorySnapshot {
        self.memory.capture_snapshot(self.session_time)
    }

    /// Sets the current number of entities of `kind`.
    pub fn track_entity_count(&mut self, kind: &str, count: u64) {
        self.entity_counts.insert(kind.to_string(), count);
    }

    /// Last reported number of entities of `kind`.
    pub fn entity_count(&self, kind: &str) -> u64 {
        self.entity_counts.get(kind).copied().unwrap_or(0)
    }

    // --- Baselines ---

    fn current_state(&self, name: &str) -> PerformanceBaseline {
        PerformanceBaseline {
            name: name.to_string(),
            capture_time: SystemTime::now(),
            build_version: self.config.build_version.clone(),
            average_frame_data: self.frames.frame_statistics(),
            average_fps: self.frames.average_fps(self.frames.sample_count()),
            one_percent_low_fps: self.frames.one_percent_low_fps(),
            system_data: self.systems.all_system_data(),
            memory_data: self.memory.current_snapshot().cloned().unwrap_or_default(),
            total_frames_captured: self.frames.total_frames(),
        }
    }

    /// Captures the current state under `name`, replacing any previous baseline.
    pub fn capture_baseline(&mut self, name: &str) -> TelemetryResult<&PerformanceBaseline> {
        let baseline = self.current_state(name);
        self.baselines.insert(baseline)?;
        log::info!(
            "Captured baseline '{name}' ({} frames).",
            self.frames.total_frames()
        );
        self.baselines.require(name)
    }

    /// Compares the current state with the baseline `name`.
    pub fn compare_to_baseline(&self, name: &str) -> TelemetryResult<BaselineComparison> {
        let baseline = self.baselines.require(name)?;
        let comparison = baseline.compare(&self.current_state("current"));
        if comparison.is_regression {
            log::warn!(
                "Performance regression against '{name}': FPS {:+.1}%, frame time {:+.1}%, memory {:+.1}%.",
                comparison.fps_change_percent,
                comparison.frame_time_change_percent,
                comparison.memory_change_percent
            );
        }
        Ok(comparison)
    }

    /// Writes the baseline `name` to `path`.
    pub fn save_baseline(&self, name: &str, path: impl AsRef<Path>) -> TelemetryResult<()> {
        self.baselines.save(name, path)
    }

    /// Loads a baseline file and returns the name it was stored under.
    pub fn load_baseline(&mut self, path: impl AsRef<Path>) -> TelemetryResult<String> {
        self.baselines.load(path)
    }

    /// Looks up a stored baseline.
    pub fn baseline(&self, name: &str) -> Option<&PerformanceBaseline> {
        self.baselines.get(name)
    }

    /// Names of every stored baseline, sorted.
    pub fn baseline_names(&self) -> Vec<String> {
        self.baselines.names()
    }

    /// Returns a reference to the baseline store.
    pub fn baselines(&self) -> &BaselineStore {
        &self.baselines
    }

    /// Deletes a stored baseline.
    pub fn remove_baseline(&mut self, name: &str) -> Option<PerformanceBaseline> {
        self.baselines.remove(name)
    }

    // --- Reporting ---

    /// Builds a report from the current state of every tracker.
    pub fn generate_report(&self) -> PerformanceReport {
        PerformanceReport {
            generated_at: SystemTime::now(),
            build_version: self.config.build_version.clone(),
            session_duration_seconds: self.session_time,
            total_frames: self.frames.total_frames(),
            frame_statistics: self.frames.frame_statistics(),
            current_fps: self.frames.current_fps(),
            average_fps: self.frames.average_fps(self.frames.sample_count()),
            one_percent_low_fps: self.frames.one_percent_low_fps(),
            point_one_percent_low_fps: self.frames.point_one_percent_low_fps(),
            spike_detected: self.frames.is_spike_detected(),
            consecutive_slow_frames: self.frames.consecutive_slow_frames(),
            systems: self.systems.all_system_data().into_values().collect(),
            recent_violations: self.systems.recent_violations(REPORT_VIOLATION_COUNT),
            total_violations: self.systems.total_violations(),
            memory: self.memory.current_snapshot().cloned(),
            peak_memory: self.memory.peak_memory(),
            memory_growth_mb_per_min: self.memory.memory_growth_rate(),
            leak_detected: self.memory.is_leak_detected(),
            entity_counts: self.entity_counts.clone(),
        }
    }
}

impl Default for TelemetryService {
    fn default() -> Self {
        Self::new(TelemetryConfig::default())
    }
}
