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
use std::collections::BTreeMap;

/// Number of bytes in one megabyte, as used for growth rates.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Converts a byte count to megabytes.
#[inline]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Point-in-time view of the process memory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Total memory attributed to the process, in bytes.
    pub total_memory: u64,
    /// Part of the total not accounted for by tracked systems.
    pub native_memory: u64,
    /// Part of the total explicitly tracked by game systems.
    pub managed_memory: u64,
    /// Tracked bytes per system.
    pub per_system_memory: BTreeMap<String, u64>,
    /// Session time in seconds.
    pub timestamp: f64,
}

impl MemorySnapshot {
    /// Total memory in megabytes.
    pub fn total_mb(&self) -> f64 {
        bytes_to_mb(self.total_memory)
    }
}
