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

//! Dispatcher configuration.

use serde::{Deserialize, Serialize};

/// What to do when a deferred event arrives while the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeferredOverflowPolicy {
    /// Keep the queue as is and drop the incoming event.
    #[default]
    DropNewest,
    /// Evict the oldest queued event to make room for the incoming one.
    DropOldest,
}

/// How listener spatial filters are evaluated during a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpatialFilterMode {
    /// Only the actor restriction is evaluated; spatial filters never reject.
    #[default]
    PayloadOnly,
    /// Spatial filters are evaluated against the payload location when it has one.
    UsePayloadLocation,
}

/// Configuration of an [`EventDispatcher`](crate::EventDispatcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSystemConfig {
    /// Maximum number of events held while in deferred mode.
    pub deferred_queue_capacity: usize,
    /// Behavior when the deferred queue is full.
    pub overflow_policy: DeferredOverflowPolicy,
    /// Validate payloads before broadcasting them.
    pub validate_payloads: bool,
    /// Spatial filter evaluation mode.
    pub spatial_filter_mode: SpatialFilterMode,
    /// Run the stale listener sweep every this many ticks. Zero disables it.
    pub stale_sweep_interval_frames: u64,
}

impl Default for EventSystemConfig {
    fn default() -> Self {
        Self {
            deferred_queue_capacity: 1000,
            overflow_policy: DeferredOverflowPolicy::default(),
            validate_payloads: cfg!(debug_assertions),
            spatial_filter_mode: SpatialFilterMode::default(),
            stale_sweep_interval_frames: 300,
        }
    }
}

impl EventSystemConfig {
    /// Load the configuration from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load the configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Save the configuration to a JSON file.
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
