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

//! Per-system time budgets and violation history.

use crate::config::TelemetryConfig;
use crate::error::{TelemetryError, TelemetryResult};
use delve_core::telemetry::{BudgetViolation, SystemPerformanceData};
use delve_core::utils::RingBuffer;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct SystemRecord {
    data: SystemPerformanceData,
    window: RingBuffer<f64>,
}

/// Tracks how long each game system takes against its budget.
///
/// `cycle_time_ms` and `call_count` describe the current frame only and
/// are reset by [`update_frame`](Self::update_frame); the rolling average and
/// the peak persist across frames.
#[derive(Debug, Clone)]
pub struct SystemBudgetTracker {
    systems: BTreeMap<String, SystemRecord>,
    violations: RingBuffer<BudgetViolation>,
    total_violations: u64,
    frame_number: u64,
    default_budget_ms: f64,
    rolling_window_size: usize,
}

impl SystemBudgetTracker {
    /// Creates an empty tracker.
    pub fn new(default_budget_ms: f64, rolling_window_size: usize, violation_history: usize) -> Self {
        Self {
            systems: BTreeMap::new(),
            violations: RingBuffer::new(violation_history),
            total_violations: 0,
            frame_number: 0,
            default_budget_ms,
            rolling_window_size,
        }
    }

    /// Creates a tracker and registers every budget listed in `config`.
    pub fn from_config(config: &TelemetryConfig) -> Self {
        let mut tracker = Self::new(
            config.default_budget_ms,
            config.rolling_window_size,
            config.violation_history_capacity,
        );
        for (name, budget) in &config.system_budgets {
            // Invalid entries are logged and skipped.
            let _ = tracker.register_system(name, *budget);
        }
        tracker
    }

    /// Registers `name` with `budget_ms`, or updates the budget of a known system.
    pub fn register_system(&mut self, name: &str, budget_ms: f64) -> TelemetryResult<()> {
        validate(name, budget_ms)?;
        match self.systems.get_mut(name) {
            Some(record) => record.data.budget_ms = budget_ms,
            None => {
                self.systems.insert(
                    name.to_string(),
                    SystemRecord {
                        data: SystemPerformanceData::new(name, budget_ms),
                        window: RingBuffer::new(self.rolling_window_size),
                    },
                );
            }
        }
        log::debug!("System '{name}' budget set to {budget_ms:.3} ms.");
        Ok(())
    }

    /// Changes the budget of an already registered system.
    pub fn set_budget(&mut self, name: &str, budget_ms: f64) -> TelemetryResult<()> {
        if !self.systems.contains_key(name) {
            log::warn!("Cannot set budget: system '{name}' is not registered.");
            return Err(TelemetryError::UnknownSystem(name.to_string()));
        }
        self.register_system(name, budget_ms)
    }

    /// Records one call of `name` that took `cycle_time_ms`.
    ///
    /// Unknown systems are registered with the default budget.
    pub fn record_system_time(&mut self, name: &str, cycle_time_ms: f64, timestamp: f64) {
        if name.is_empty() {
            log::error!("{}", TelemetryError::InvalidSystemName);
            return;
        }
        if !(cycle_time_ms.is_finite() && cycle_time_ms >= 0.0) {
            log::warn!("Ignoring invalid time {cycle_time_ms} ms for system '{name}'.");
            return;
        }
        if !self.systems.contains_key(name) {
            let budget = self.default_budget_ms;
            if self.register_system(name, budget).is_err() {
                return;
            }
        }
        let Some(record) = self.systems.get_mut(name) else {
            return;
        };

        let data = &mut record.data;
        data.cycle_time_ms = cycle_time_ms;
        data.call_count += 1;
        data.peak_time_ms = data.peak_time_ms.max(cycle_time_ms);
        record.window.push(cycle_time_ms);
        data.average_time_ms = record.window.average();

        if cycle_time_ms > data.budget_ms {
            let overage_percent = (cycle_time_ms - data.budget_ms) / data.budget_ms * 100.0;
            log::warn!(
                "System '{name}' exceeded its budget: {cycle_time_ms:.3} ms / {:.3} ms (+{overage_percent:.1}%).",
                data.budget_ms
            );
            self.violations.push(BudgetViolation {
                system_name: name.to_string(),
                actual_ms: cycle_time_ms,
                budget_ms: data.budget_ms,
                overage_percent,
                timestamp,
                frame_number: self.frame_number,
            });
            self.total_violations += 1;
        }
    }

    /// Resets the per-frame values of every system and advances the frame number.
    pub fn update_frame(&mut self) {
        for record in self.systems.values_mut() {
            record.data.cycle_time_ms = 0.0;
            record.data.call_count = 0;
        }
        self.frame_number += 1;
    }

    /// Current cycle time over budget; 0 for unknown systems.
    pub fn budget_utilization(&self, name: &str) -> f64 {
        self.system_data(name)
            .map_or(0.0, SystemPerformanceData::budget_utilization)
    }

    /// Returns `true` if the system's current cycle time exceeds its budget.
    pub fn is_budget_violated(&self, name: &str) -> bool {
        self.budget_utilization(name) > 1.0
    }

    /// Record of one system.
    pub fn system_data(&self, name: &str) -> Option<&SystemPerformanceData> {
        self.systems.get(name).map(|record| &record.data)
    }

    /// Copies of every system record, by name.
    pub fn all_system_data(&self) -> BTreeMap<String, SystemPerformanceData> {
        self.systems
            .iter()
            .map(|(name, record)| (name.clone(), record.data.clone()))
            .collect()
    }

    /// Up to `count` of the newest violations, newest first.
    pub fn recent_violations(&self, count: usize) -> Vec<BudgetViolation> {
        self.violations.recent(count).cloned().collect()
    }

    /// Violations recorded since creation or the last clear.
    pub fn total_violations(&self) -> u64 {
        self.total_violations
    }

    /// Drops the violation history and zeroes the counter.
    pub fn clear_violations(&mut self) {
        self.violations.clear();
        self.total_violations = 0;
    }

    /// Number of `update_frame` calls so far.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }
}

impl Default for SystemBudgetTracker {
    fn default() -> Self {
        Self::from_config(&TelemetryConfig::default())
    }
}

fn validate(name: &str, budget_ms: f64) -> TelemetryResult<()> {
    if name.is_empty() {
        let err = TelemetryError::InvalidSystemName;
        log::error!("{err}");
        return Err(err);
    }
    if !(budget_ms.is_finite() && budget_ms > 0.0) {
        let err = TelemetryError::InvalidBudget {
            system: name.to_string(),
            budget_ms,
        };
        log::error!("{err}");
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_register_rejects_bad_input() {
        let mut tracker = SystemBudgetTracker::default();
        assert!(matches!(
            tracker.register_system("", 1.0),
            Err(TelemetryError::InvalidSystemName)
        ));
        assert!(tracker.register_system("AI", 0.0).is_err());
        assert!(tracker.register_system("AI", -2.0).is_err());
        assert!(tracker.register_system("AI", f64::INFINITY).is_err());
        assert!(tracker.system_data("AI").is_none(), "Rejected input is a no-op");
    }

    #[test]
    fn test_over_budget_appends_one_violation() {
        let mut tracker = SystemBudgetTracker::default();
        tracker.register_system("Combat", 2.0).unwrap();

        tracker.record_system_time("Combat", 1.5, 0.1);
        assert_eq!(tracker.total_violations(), 0);

        tracker.record_system_time("Combat", 3.0, 0.2);

        assert_eq!(tracker.total_violations(), 1);
        let violations = tracker.recent_violations(10);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].system_name, "Combat");
        assert_relative_eq!(violations[0].overage_percent, 50.0);
        assert_eq!(violations[0].frame_number, 0);
        assert!(tracker.is_budget_violated("Combat"));
    }

    #[test]
    fn test_cycle_time_is_last_call_and_resets_per_frame() {
        let mut tracker = SystemBudgetTracker::default();
        tracker.record_system_time("AI", 0.4, 0.0);
        tracker.record_system_time("AI", 0.2, 0.0);

        let data = tracker.system_data("AI").unwrap();
        assert_eq!(data.budget_ms, 1.0, "Auto-registered with the default budget");
        assert_eq!(data.cycle_time_ms, 0.2);
        assert_eq!(data.call_count, 2);
        assert_eq!(data.peak_time_ms, 0.4);
        assert_relative_eq!(data.average_time_ms, 0.3);

        tracker.update_frame();

        let data = tracker.system_data("AI").unwrap();
        assert_eq!(data.cycle_time_ms, 0.0);
        assert_eq!(data.call_count, 0);
        assert_eq!(data.peak_time_ms, 0.4, "Peak persists across frames");
        assert_relative_eq!(data.average_time_ms, 0.3);
        assert_eq!(tracker.frame_number(), 1);
    }

    #[test]
    fn test_rolling_window_evicts_oldest() {
        let mut tracker = SystemBudgetTracker::new(100.0, 3, 10);
        for t in [10.0, 1.0, 2.0, 3.0] {
            tracker.record_system_time("World", t, 0.0);
        }
        assert_relative_eq!(tracker.system_data("World").unwrap().average_time_ms, 2.0);
    }

    #[test]
    fn test_violation_history_is_bounded() {
        let mut tracker = SystemBudgetTracker::new(1.0, 60, 3);
        for i in 0..5 {
            tracker.record_system_time("UI", 2.0 + i as f64, 0.0);
        }
        assert_eq!(tracker.total_violations(), 5);
        let recent = tracker.recent_violations(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].actual_ms, 6.0, "Newest first");

        tracker.clear_violations();
        assert_eq!(tracker.total_violations(), 0);
        assert!(tracker.recent_violations(10).is_empty());
    }

    #[test]
    fn test_config_budgets_and_set_budget() {
        let config = TelemetryConfig::default()
            .with_budget("Combat", 2.0)
            .with_budget("Broken", -1.0);
        let mut tracker = SystemBudgetTracker::from_config(&config);
        assert_eq!(tracker.system_data("Combat").unwrap().budget_ms, 2.0);
        assert!(tracker.system_data("Broken").is_none());

        tracker.set_budget("Combat", 4.0).unwrap();
        assert_eq!(tracker.system_data("Combat").unwrap().budget_ms, 4.0);
        assert!(matches!(
            tracker.set_budget("Missing", 1.0),
            Err(TelemetryError::UnknownSystem(_))
        ));
        assert_eq!(tracker.budget_utilization("Missing"), 0.0);
    }
}
