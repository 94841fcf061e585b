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

//! Memory tracking: per-system allocation counters, throttled snapshots and
//! leak detection from the growth rate between snapshots.

mod probe;

pub use self::probe::{probe_for, MemoryProbe, ProcessMemoryProbe, TrackedMemoryProbe};

use crate::config::TelemetryConfig;
use delve_core::telemetry::{bytes_to_mb, MemorySnapshot, BYTES_PER_MB};
use delve_core::utils::RingBuffer;
use std::collections::BTreeMap;

/// The last snapshot the growth rate was measured from.
#[derive(Debug, Clone, Copy)]
struct GrowthCheck {
    timestamp: f64,
    total_memory: u64,
}

/// Tracks memory attributed to game systems and samples process memory.
#[derive(Debug)]
pub struct MemoryTracker {
    probe: Box<dyn MemoryProbe>,
    per_system: BTreeMap<String, u64>,
    tracked_total: u64,
    history: RingBuffer<MemorySnapshot>,
    snapshot_interval_ticks: u64,
    ticks_since_snapshot: u64,
    peak_memory: u64,
    growth_rate_mb_per_min: f64,
    leak_threshold_mb_per_min: f64,
    leak_detected: bool,
    last_check: Option<GrowthCheck>,
}

impl MemoryTracker {
    /// Creates a tracker sampling `probe`.
    pub fn new(config: &TelemetryConfig, probe: Box<dyn MemoryProbe>) -> Self {
        log::debug!("Memory tracker using the '{}' probe.", probe.name());
        Self {
            probe,
            per_system: BTreeMap::new(),
            tracked_total: 0,
            history: RingBuffer::new(config.snapshot_history_capacity),
            snapshot_interval_ticks: config.snapshot_interval_ticks.max(1),
            ticks_since_snapshot: 0,
            peak_memory: 0,
            growth_rate_mb_per_min: 0.0,
            leak_threshold_mb_per_min: config.leak_threshold_mb_per_min,
            leak_detected: false,
            last_check: None,
        }
    }

    /// Creates a tracker with the probe selected in `config`.
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config, probe_for(config.memory_probe))
    }

    /// Adds `bytes` to the counter of `system`.
    pub fn track_allocation(&mut self, system: &str, bytes: u64) {
        let counter = self.per_system.entry(system.to_string()).or_insert(0);
        *counter = counter.saturating_add(bytes);
        self.tracked_total = self.tracked_total.saturating_add(bytes);
    }

    /// Removes `bytes` from the counter of `system`, never going below zero.
    pub fn track_deallocation(&mut self, system: &str, bytes: u64) {
        let Some(counter) = self.per_system.get_mut(system) else {
            log::warn!("Deallocation of {bytes} bytes for untracked system '{system}' ignored.");
            return;
        };
        let removed = bytes.min(*counter);
        if removed < bytes {
            log::warn!(
                "System '{system}' released {bytes} bytes but only {removed} were tracked."
            );
        }
        *counter -= removed;
        self.tracked_total = self.tracked_total.saturating_sub(removed);
    }

    /// Counts one tick and captures a snapshot once the interval is reached.
    ///
    /// Returns `true` if a snapshot was taken.
    pub fn update_memory_snapshot(&mut self, timestamp: f64) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot < self.snapshot_interval_ticks {
            return false;
        }
        self.ticks_since_snapshot = 0;
        self.capture_snapshot(timestamp);
        true
    }

    /// Captures a snapshot now, regardless of the throttle.
    pub fn capture_snapshot(&mut self, timestamp: f64) -> MemorySnapshot {
        // Tracked bytes sit on top of the platform sample so they always show
        // up in the growth rate.
        let managed = self.tracked_total;
        let native = self.probe.sample_process_memory().unwrap_or(0);
        let total = native.saturating_add(managed);

        let snapshot = MemorySnapshot {
            total_memory: total,
            native_memory: native,
            managed_memory: managed,
            per_system_memory: self.per_system.clone(),
            timestamp,
        };
        self.peak_memory = self.peak_memory.max(total);
        self.update_growth(total, timestamp);
        self.history.push(snapshot.clone());

        log::trace!("Memory snapshot: {:.2} MB total.", bytes_to_mb(total));
        snapshot
    }

    fn update_growth(&mut self, total: u64, timestamp: f64) {
        let previous = self.last_check.replace(GrowthCheck {
            timestamp,
            total_memory: total,
        });
        let Some(previous) = previous else {
            return;
        };

        let elapsed_minutes = (timestamp - previous.timestamp) / 60.0;
        if elapsed_minutes <= 0.0 {
            return;
        }
        let delta_mb = (total as f64 - previous.total_memory as f64) / BYTES_PER_MB;
        self.growth_rate_mb_per_min = delta_mb / elapsed_minutes;

        let rate = self.growth_rate_mb_per_min;
        if rate > self.leak_threshold_mb_per_min {
            if !self.leak_detected {
                self.leak_detected = true;
                log::warn!(
                    "Possible memory leak: growing at {rate:.2} MB/min (threshold {:.2} MB/min).",
                    self.leak_threshold_mb_per_min
                );
            }
        } else if self.leak_detected {
            self.leak_detected = false;
            log::info!("Memory growth back to {rate:.2} MB/min, leak warning cleared.");
        }
    }

    /// The most recent snapshot.
    pub fn current_snapshot(&self) -> Option<&MemorySnapshot> {
        self.history.latest()
    }

    /// Buffered snapshots, oldest first.
    pub fn snapshot_history(&self) -> Vec<MemorySnapshot> {
        self.history.iter().cloned().collect()
    }

    /// Highest total memory seen in any snapshot.
    pub fn peak_memory(&self) -> u64 {
        self.peak_memory
    }

    /// Growth rate between the two latest snapshots, in MB per minute.
    pub fn memory_growth_rate(&self) -> f64 {
        self.growth_rate_mb_per_min
    }

    /// Returns `true` while the growth rate is above the leak threshold.
    pub fn is_leak_detected(&self) -> bool {
        self.leak_detected
    }

    /// Bytes tracked for `system`.
    pub fn system_memory(&self, system: &str) -> u64 {
        self.per_system.get(system).copied().unwrap_or(0)
    }

    /// Bytes tracked across every system.
    pub fn tracked_total(&self) -> u64 {
        self.tracked_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedProbe(u64);

    impl MemoryProbe for FixedProbe {
        fn name(&self) -> &str {
            "fixed"
        }

        fn sample_process_memory(&mut self) -> Option<u64> {
            Some(self.0)
        }
    }

    fn tracked_only() -> MemoryTracker {
        MemoryTracker::new(&TelemetryConfig::default(), Box::new(TrackedMemoryProbe))
    }

    #[test]
    fn test_deallocation_floors_at_zero() {
        let mut tracker = tracked_only();
        tracker.track_allocation("Combat", 100);
        tracker.track_allocation("AI", 50);
        tracker.track_deallocation("Combat", 300);
        tracker.track_deallocation("Unknown", 10);

        assert_eq!(tracker.system_memory("Combat"), 0);
        assert_eq!(tracker.system_memory("AI"), 50);
        assert_eq!(tracker.tracked_total(), 50);
    }

    #[test]
    fn test_snapshot_is_throttled() {
        let config = TelemetryConfig {
            snapshot_interval_ticks: 3,
            ..Default::default()
        };
        let mut tracker = MemoryTracker::new(&config, Box::new(TrackedMemoryProbe));

        assert!(!tracker.update_memory_snapshot(0.1));
        assert!(!tracker.update_memory_snapshot(0.2));
        assert!(tracker.update_memory_snapshot(0.3));
        assert!(!tracker.update_memory_snapshot(0.4));
        assert_eq!(tracker.snapshot_history().len(), 1);
    }

    #[test]
    fn test_native_managed_split() {
        let mut tracker =
            MemoryTracker::new(&TelemetryConfig::default(), Box::new(FixedProbe(1_000)));
        tracker.track_allocation("World", 400);

        let snapshot = tracker.capture_snapshot(1.0);
        assert_eq!(snapshot.total_memory, 1_400);
        assert_eq!(snapshot.managed_memory, 400);
        assert_eq!(snapshot.native_memory, 1_000);
        assert_eq!(snapshot.per_system_memory.get("World"), Some(&400));

        tracker.track_allocation("World", 1_000);
        let snapshot = tracker.capture_snapshot(2.0);
        assert_eq!(snapshot.total_memory, 2_400);
        assert_eq!(snapshot.native_memory, 1_000);
        assert_eq!(tracker.peak_memory(), 2_400);
    }

    #[test]
    fn test_tracked_growth_visible_over_platform_sample() {
        let mut tracker = MemoryTracker::new(
            &TelemetryConfig::default(),
            Box::new(FixedProbe(512 * 1024 * 1024)),
        );
        tracker.capture_snapshot(0.0);

        tracker.track_allocation("Inventory", 15 * 1024 * 1024);
        tracker.capture_snapshot(60.0);

        assert!((tracker.memory_growth_rate() - 15.0).abs() < 1e-9);
        assert!(tracker.is_leak_detected());
    }

    #[test]
    fn test_leak_hysteresis() {
        let mut tracker = tracked_only();
        tracker.capture_snapshot(0.0);

        // 20 MB in one minute.
        tracker.track_allocation("Leaky", 20 * 1024 * 1024);
        tracker.capture_snapshot(60.0);
        assert!(tracker.is_leak_detected());
        assert!((tracker.memory_growth_rate() - 20.0).abs() < 1e-9);

        // Flat for a minute: the flag clears.
        tracker.capture_snapshot(120.0);
        assert!(!tracker.is_leak_detected());
        assert_eq!(tracker.memory_growth_rate(), 0.0);
    }

    #[test]
    fn test_zero_elapsed_skips_growth() {
        let mut tracker = tracked_only();
        tracker.capture_snapshot(5.0);
        tracker.track_allocation("Leaky", 100 * 1024 * 1024);
        tracker.capture_snapshot(5.0);
        assert_eq!(tracker.memory_growth_rate(), 0.0);
        assert!(!tracker.is_leak_detected());
    }
}
