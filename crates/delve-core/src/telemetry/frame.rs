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

/// One recorded frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSample {
    /// Duration of the frame in milliseconds.
    pub frame_time_ms: f64,
    /// Session time in seconds at which the frame ended.
    pub timestamp: f64,
}

/// Aggregate statistics over the buffered frame samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameStatistics {
    /// Mean frame time in milliseconds.
    pub average_frame_time_ms: f64,
    /// Fastest buffered frame in milliseconds.
    pub min_frame_time_ms: f64,
    /// Slowest buffered frame in milliseconds.
    pub max_frame_time_ms: f64,
    /// Population variance of the frame times, a stutter indicator.
    pub frame_time_variance: f64,
    /// Number of samples the statistics were computed from.
    pub sample_count: usize,
}

impl FrameStatistics {
    /// Frames per second matching the average frame time, 0 when unknown.
    pub fn average_fps(&self) -> f64 {
        if self.average_frame_time_ms > 0.0 {
            1000.0 / self.average_frame_time_ms
        } else {
            0.0
        }
    }
}
