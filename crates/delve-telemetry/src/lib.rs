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

//! # Delve Telemetry
//!
//! Frame time, system budget and memory telemetry for a game loop, with
//! named baselines that can be compared against the live state and
//! persisted as JSON.
//!
//! Everything is driven by [`TelemetryService::tick`], called once per frame.

#![warn(missing_docs)]

pub mod baseline;
pub mod config;
pub mod error;
pub mod frame;
pub mod memory;
pub mod report;
pub mod service;
pub mod system;

pub use baseline::BaselineStore;
pub use config::{MemoryProbeKind, TelemetryConfig};
pub use error::{TelemetryError, TelemetryResult};
pub use frame::FrameTracker;
pub use memory::{MemoryProbe, MemoryTracker, ProcessMemoryProbe, TrackedMemoryProbe};
pub use report::PerformanceReport;
pub use service::TelemetryService;
pub use system::SystemBudgetTracker;
