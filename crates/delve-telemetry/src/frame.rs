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

//! Frame time tracking, FPS and percentile statistics.

use crate::config::TelemetryConfig;
use delve_core::telemetry::{FrameSample, FrameStatistics};
use delve_core::utils::RingBuffer;

/// Consecutive slow frames are re-reported every this many frames.
const SPIKE_LOG_STREAK: u32 = 5;

/// Records frame times into a ring buffer and derives FPS metrics.
#[derive(Debug, Clone)]
pub struct FrameTracker {
    samples: RingBuffer<FrameSample>,
    frame_times_ms: RingBuffer<f64>,
    spike_threshold_ms: f64,
    current_fps: f64,
    consecutive_slow_frames: u32,
    total_frames: u64,
}

impl FrameTracker {
    /// Creates a tracker keeping `capacity` samples.
    pub fn new(capacity: usize, spike_threshold_ms: f64) -> Self {
        Self {
            samples: RingBuffer::new(capacity),
            frame_times_ms: RingBuffer::new(capacity),
            spike_threshold_ms,
            current_fps: 0.0,
            consecutive_slow_frames: 0,
            total_frames: 0,
        }
    }

    /// Creates a tracker from the frame settings of `config`.
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.frame_buffer_capacity, config.spike_threshold_ms)
    }

    /// Records one frame. Non-positive or non-finite deltas are ignored.
    pub fn record_frame(&mut self, delta_seconds: f64, timestamp: f64) {
        let valid_delta = delta_seconds.is_finite() && delta_seconds > 0.0;
        let frame_time_ms = if valid_delta {
            delta_seconds * 1000.0
        } else {
            log::debug!("Frame with non-positive delta {delta_seconds}s recorded as 0 ms.");
            0.0
        };

        self.samples.push(FrameSample {
            frame_time_ms,
            timestamp,
        });
        self.frame_times_ms.push(frame_time_ms);
        // FPS keeps its last value across a zero-length frame.
        if valid_delta {
            self.current_fps = 1.0 / delta_seconds;
        }
        self.total_frames += 1;

        self.detect_spike(frame_time_ms);
    }

    fn detect_spike(&mut self, frame_time_ms: f64) {
        if frame_time_ms > self.spike_threshold_ms {
            self.consecutive_slow_frames += 1;
            let streak = self.consecutive_slow_frames;
            if streak == 1 {
                log::warn!(
                    "Frame spike: {frame_time_ms:.2} ms (threshold {:.2} ms).",
                    self.spike_threshold_ms
                );
            } else if streak % SPIKE_LOG_STREAK == 0 {
                log::warn!("Sustained frame spike: {streak} consecutive slow frames ({frame_time_ms:.2} ms).");
            }
        } else if self.consecutive_slow_frames > 0 {
            log::info!(
                "Frame time recovered after {} slow frame(s).",
                self.consecutive_slow_frames
            );
            self.consecutive_slow_frames = 0;
        }
    }

    /// FPS of the most recent frame, 0 before any frame.
    pub fn current_fps(&self) -> f64 {
        self.current_fps
    }

    /// FPS over the mean of the last `frames` samples.
    pub fn average_fps(&self, frames: usize) -> f64 {
        let count = frames.min(self.frame_times_ms.len());
        if count == 0 {
            return 0.0;
        }
        let mean = self.frame_times_ms.recent(count).sum::<f64>() / count as f64;
        ms_to_fps(mean)
    }

    /// Frame time at percentile `p` (0 to 1) of the buffered samples.
    ///
    /// Samples are sorted ascending and the index is `floor(p * (n - 1))`,
    /// so high percentiles select from the slow end.
    pub fn percentile_frame_time_ms(&self, p: f64) -> f64 {
        let sorted = self.frame_times_ms.sorted();
        if sorted.is_empty() {
            return 0.0;
        }
        let p = p.clamp(0.0, 1.0);
        let index = (p * (sorted.len() - 1) as f64).floor() as usize;
        sorted[index]
    }

    /// FPS matching the frame time at percentile `p`.
    pub fn percentile_low_fps(&self, p: f64) -> f64 {
        ms_to_fps(self.percentile_frame_time_ms(p))
    }

    /// The 1% low FPS.
    pub fn one_percent_low_fps(&self) -> f64 {
        self.percentile_low_fps(0.99)
    }

    /// The 0.1% low FPS.
    pub fn point_one_percent_low_fps(&self) -> f64 {
        self.percentile_low_fps(0.999)
    }

    /// Statistics over every buffered sample.
    pub fn frame_statistics(&self) -> FrameStatistics {
        FrameStatistics {
            average_frame_time_ms: self.frame_times_ms.average(),
            min_frame_time_ms: self.frame_times_ms.min().unwrap_or(0.0),
            max_frame_time_ms: self.frame_times_ms.max().unwrap_or(0.0),
            frame_time_variance: self.frame_times_ms.variance(),
            sample_count: self.frame_times_ms.len(),
        }
    }

    /// Returns `true` while the current run of slow frames is non-empty.
    pub fn is_spike_detected(&self) -> bool {
        self.consecutive_slow_frames > 0
    }

    /// Length of the current run of slow frames.
    pub fn consecutive_slow_frames(&self) -> u32 {
        self.consecutive_slow_frames
    }

    /// Frames recorded since creation or the last reset.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Number of buffered samples.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Up to `count` of the newest samples, newest first.
    pub fn recent_frames(&self, count: usize) -> Vec<FrameSample> {
        self.samples.recent(count).copied().collect()
    }

    /// Clears every sample and counter.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.frame_times_ms.clear();
        self.current_fps = 0.0;
        self.consecutive_slow_frames = 0;
        self.total_frames = 0;
    }
}

impl Default for FrameTracker {
    fn default() -> Self {
        Self::from_config(&TelemetryConfig::default())
    }
}

fn ms_to_fps(ms: f64) -> f64 {
    if ms > 0.0 {
        1000.0 / ms
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FRAME_60: f64 = 1.0 / 60.0;

    fn run(tracker: &mut FrameTracker, delta: f64, frames: usize) {
        for _ in 0..frames {
            tracker.record_frame(delta, 0.0);
        }
    }

    #[test]
    fn test_average_fps_at_60_and_30() {
        let mut tracker = FrameTracker::default();
        run(&mut tracker, FRAME_60, 120);
        let fps = tracker.average_fps(60);
        assert!((fps - 60.0).abs() < 0.6, "Expected ~60 FPS, got {fps}");

        let mut tracker = FrameTracker::default();
        run(&mut tracker, 1.0 / 30.0, 120);
        assert_relative_eq!(tracker.average_fps(60), 30.0, epsilon = 0.3);
    }

    #[test]
    fn test_average_fps_uses_newest_samples() {
        let mut tracker = FrameTracker::default();
        run(&mut tracker, 0.1, 10);
        run(&mut tracker, 0.01, 5);
        assert_relative_eq!(tracker.average_fps(5), 100.0, epsilon = 1e-6);
        // More frames requested than buffered: everything is used.
        assert_relative_eq!(tracker.average_fps(1000), 1000.0 / 70.0, epsilon = 1e-6);
    }

    #[test]
    fn test_spike_detected_and_cleared() {
        let mut tracker = FrameTracker::default();
        run(&mut tracker, FRAME_60, 30);
        assert!(!tracker.is_spike_detected());

        tracker.record_frame(0.050, 0.5);
        assert!(tracker.is_spike_detected(), "A 50 ms frame is a spike");
        assert_eq!(tracker.consecutive_slow_frames(), 1);

        tracker.record_frame(FRAME_60, 0.6);
        assert!(!tracker.is_spike_detected(), "One good frame clears the spike");
    }

    #[test]
    fn test_zero_delta_frame_is_counted_without_fps_change() {
        let mut tracker = FrameTracker::default();
        tracker.record_frame(FRAME_60, 0.0);
        let fps = tracker.current_fps();

        tracker.record_frame(0.0, 0.1);
        tracker.record_frame(-1.0, 0.2);

        assert_eq!(tracker.total_frames(), 3);
        assert_eq!(tracker.sample_count(), 3);
        assert_eq!(tracker.current_fps(), fps, "FPS is only updated for positive deltas");
        let recent = tracker.recent_frames(2);
        assert_eq!(recent[0].frame_time_ms, 0.0, "Negative delta clamps to 0 ms");
        assert_eq!(recent[1].frame_time_ms, 0.0);
        assert!(!tracker.is_spike_detected());
    }

    #[test]
    fn test_percentile_lows_pick_slow_end() {
        let mut tracker = FrameTracker::new(1000, 16.67);
        // 99 fast frames and one 100 ms hitch.
        run(&mut tracker, 0.010, 99);
        tracker.record_frame(0.100, 1.0);

        // n = 100: 0.99 -> index 98 (a fast frame), 0.999 -> index 98 as well.
        assert_relative_eq!(tracker.percentile_frame_time_ms(0.99), 10.0, epsilon = 1e-9);
        assert_relative_eq!(tracker.percentile_frame_time_ms(1.0), 100.0, epsilon = 1e-9);
        assert_relative_eq!(tracker.one_percent_low_fps(), 100.0, epsilon = 1e-6);
        assert_relative_eq!(tracker.percentile_low_fps(0.0), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_statistics_and_ring_eviction() {
        let mut tracker = FrameTracker::new(4, 16.67);
        for delta in [0.010, 0.020, 0.010, 0.020, 0.030] {
            tracker.record_frame(delta, 0.0);
        }
        let stats = tracker.frame_statistics();
        assert_eq!(stats.sample_count, 4);
        assert_relative_eq!(stats.min_frame_time_ms, 10.0, epsilon = 1e-9);
        assert_relative_eq!(stats.max_frame_time_ms, 30.0, epsilon = 1e-9);
        assert_relative_eq!(stats.average_frame_time_ms, 20.0, epsilon = 1e-9);
        assert_eq!(tracker.total_frames(), 5);

        let newest = tracker.recent_frames(1);
        assert_relative_eq!(newest[0].frame_time_ms, 30.0, epsilon = 1e-9);

        tracker.reset();
        assert_eq!(tracker.sample_count(), 0);
        assert_eq!(tracker.average_fps(60), 0.0);
    }
}
