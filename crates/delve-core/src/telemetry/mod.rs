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

//! Telemetry record types shared by the trackers, baselines and reports.

mod baseline;
mod frame;
mod memory;
mod system;

pub use self::baseline::{
    percent_change, BaselineComparison, PerformanceBaseline, FRAME_CHANGE_THRESHOLD_PERCENT,
    MEMORY_REGRESSION_THRESHOLD_PERCENT,
};
pub use self::frame::{FrameSample, FrameStatistics};
pub use self::memory::{bytes_to_mb, MemorySnapshot, BYTES_PER_MB};
pub use self::system::{BudgetViolation, SystemPerformanceData};
