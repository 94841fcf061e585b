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

use serde::{Deserialize, Serialize};

/// Per-system timing record maintained by the budget tracker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemPerformanceData {
    /// Name of the system (e.g. `"Combat"`).
    pub system_name: String,
    /// Time allowance per frame in milliseconds.
    pub budget_ms: f64,
    /// Time of the most recent call this frame, reset by `update_frame`.
    pub cycle_time_ms: f64,
    /// Number of calls recorded this frame, reset by `update_frame`.
    pub call_count: u32,
    /// Slowest call ever recorded.
    pub peak_time_ms: f64,
    /// Mean over the rolling window of recent calls.
    pub average_time_ms: f64,
}

impl SystemPerformanceData {
    /// Creates an empty record for `system_name` with the given budget.
    pub fn new(system_name: impl Into<String>, budget_ms: f64) -> Self {
        Self {
            system_name: system_name.into(),
            budget_ms,
            ..Default::default()
        }
    }

    /// Current cycle time as a fraction of the budget; may exceed 1.0.
    pub fn budget_utilization(&self) -> f64 {
        if self.budget_ms > 0.0 {
            self.cycle_time_ms / self.budget_ms
        } else {
            0.0
        }
    }

    /// Returns `true` when the current cycle time exceeds the budget.
    pub fn is_budget_violated(&self) -> bool {
        self.budget_utilization() > 1.0
    }
}

/// A recorded call that exceeded its system budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetViolation {
    /// Name of the offending system.
    pub system_name: String,
    /// Measured time in milliseconds.
    pub actual_ms: f64,
    /// Budget at the time of the violation.
    pub budget_ms: f64,
    /// `(actual - budget) / budget * 100`.
    pub overage_percent: f64,
    /// Session time in seconds.
    pub timestamp: f64,
    /// Frame number the violation happened in.
    pub frame_number: u64,
}
