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

//! Dispatcher performance counters.

use serde::{Deserialize, Serialize};

/// Aggregated counters describing dispatcher activity since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EventSystemMetrics {
    /// Broadcasts that reached the delivery stage.
    pub total_events_broadcast: u64,
    /// Listener callbacks invoked.
    pub total_listener_invocations: u64,
    /// Highest number of listeners invoked by a single broadcast.
    pub peak_listeners_per_event: usize,
    /// Running mean of a full broadcast, in milliseconds.
    pub average_broadcast_time_ms: f64,
    /// Running mean of a single listener callback, in milliseconds.
    pub average_listener_time_ms: f64,
    /// Callbacks that panicked.
    pub listener_faults: u64,
    /// Broadcasts refused because the payload failed validation.
    pub rejected_events: u64,
    /// Events queued in deferred mode.
    pub deferred_events_queued: u64,
    /// Deferred events lost to queue overflow.
    pub dropped_deferred_events: u64,
}

impl EventSystemMetrics {
    /// Folds one finished broadcast into the counters.
    pub(crate) fn record_broadcast(
        &mut self,
        invocations: usize,
        broadcast_ms: f64,
        listener_ms: f64,
        faults: u64,
    ) {
        let previous_events = self.total_events_broadcast as f64;
        self.total_events_broadcast += 1;
        self.average_broadcast_time_ms = (self.average_broadcast_time_ms * previous_events
            + broadcast_ms)
            / self.total_events_broadcast as f64;

        if invocations > 0 {
            let previous_invocations = self.total_listener_invocations as f64;
            self.total_listener_invocations += invocations as u64;
            self.average_listener_time_ms = (self.average_listener_time_ms
                * previous_invocations
                + listener_ms)
                / self.total_listener_invocations as f64;
        }

        self.peak_listeners_per_event = self.peak_listeners_per_event.max(invocations);
        self.listener_faults += faults;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_running_means() {
        let mut metrics = EventSystemMetrics::default();
        metrics.record_broadcast(2, 1.0, 0.5, 0);
        metrics.record_broadcast(4, 3.0, 2.5, 1);

        assert_eq!(metrics.total_events_broadcast, 2);
        assert_eq!(metrics.total_listener_invocations, 6);
        assert_eq!(metrics.peak_listeners_per_event, 4);
        assert_eq!(metrics.listener_faults, 1);
        assert_relative_eq!(metrics.average_broadcast_time_ms, 2.0);
        // (0.5 + 2.5) spread over 6 invocations.
        assert_relative_eq!(metrics.average_listener_time_ms, 0.5);
    }

    #[test]
    fn test_broadcast_without_listeners() {
        let mut metrics = EventSystemMetrics::default();
        metrics.record_broadcast(0, 0.2, 0.0, 0);
        assert_eq!(metrics.total_events_broadcast, 1);
        assert_eq!(metrics.average_listener_time_ms, 0.0);
    }
}
