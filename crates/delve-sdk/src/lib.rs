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

//! The public-facing entry point of the Delve runtime.
//!
//! [`DelveRuntime`] owns one [`EventDispatcher`] and one [`TelemetryService`]
//! and advances both from a single [`tick`](DelveRuntime::tick).

use anyhow::{Context, Result};
use delve_core::EventPayload;
use delve_events::{EventDispatcher, EventSystemConfig};
use delve_telemetry::{PerformanceReport, TelemetryConfig, TelemetryService};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// System name the deferred-event flush is recorded under.
pub const EVENTS_SYSTEM: &str = "Events";

pub mod prelude {
    //! Types most game code needs.
    pub use crate::{DelveRuntime, RuntimeConfig};
    pub use delve_core::event::{EventFilter, PayloadData};
    pub use delve_core::{
        EventPayload, EventTag, ListenerHandle, ListenerPriority, ObjectRef, ObjectToken, Vec3,
    };
    pub use delve_events::{EventDispatcher, ListenerOptions};
    pub use delve_telemetry::{PerformanceReport, TelemetryService};
}

/// Configuration of the whole runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Event dispatcher settings.
    pub events: EventSystemConfig,
    /// Telemetry settings.
    pub telemetry: TelemetryConfig,
    /// Flush deferred events at the end of every tick.
    pub auto_flush_deferred: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            events: EventSystemConfig::default(),
            telemetry: TelemetryConfig::default(),
            auto_flush_deferred: true,
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load runtime configuration from JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read runtime config '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("Invalid runtime config '{path}'"))
    }

    /// Save runtime configuration to JSON file
    pub fn to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write runtime config '{path}'"))?;
        Ok(())
    }
}

/// One event dispatcher and one telemetry service driven by the host loop.
pub struct DelveRuntime {
    events: Rc<EventDispatcher>,
    telemetry: TelemetryService,
    auto_flush_deferred: bool,
}

impl DelveRuntime {
    /// Builds the runtime from `config`.
    pub fn new(config: RuntimeConfig) -> Self {
        log::info!("Starting Delve runtime.");
        Self {
            events: Rc::new(EventDispatcher::new(config.events)),
            telemetry: TelemetryService::new(config.telemetry),
            auto_flush_deferred: config.auto_flush_deferred,
        }
    }

    /// Builds the runtime from a JSON configuration file.
    pub fn from_config_file(path: &str) -> Result<Self> {
        Ok(Self::new(RuntimeConfig::from_file(path)?))
    }

    /// Advances one frame.
    ///
    /// Ticks telemetry, flushes deferred events (timed as the
    /// [`EVENTS_SYSTEM`] system) when auto-flush is on, then ticks the
    /// dispatcher's stale listener sweep.
    pub fn tick(&mut self, delta_seconds: f64) {
        self.telemetry.tick(delta_seconds);
        if self.auto_flush_deferred {
            let events = &self.events;
            let flushed = self
                .telemetry
                .time_system(EVENTS_SYSTEM, || events.process_deferred_events());
            if flushed > 0 {
                log::trace!("Flushed {flushed} deferred event(s) this frame.");
            }
        }
        self.events.tick();
    }

    /// Shared handle to the dispatcher, for listeners that need to call back into it.
    pub fn events(&self) -> &Rc<EventDispatcher> {
        &self.events
    }

    /// Broadcasts `payload` through the dispatcher.
    pub fn broadcast(&self, payload: &EventPayload) {
        self.events.broadcast_event(payload);
    }

    /// Returns a reference to the telemetry service.
    pub fn telemetry(&self) -> &TelemetryService {
        &self.telemetry
    }

    /// Returns a mutable reference to the telemetry service.
    pub fn telemetry_mut(&mut self) -> &mut TelemetryService {
        &mut self.telemetry
    }

    /// Builds a telemetry report.
    pub fn report(&self) -> PerformanceReport {
        self.telemetry.generate_report()
    }

    /// Logs a summary of the session to the console.
    pub fn log_summary(&self) {
        let report = self.report();
        let events = self.events.performance_metrics();
        log::info!("--- Delve Session Summary ---");
        log::info!(
            "  Frames: {} over {:.2}s (avg {:.1} FPS, 1% low {:.1} FPS)",
            report.total_frames,
            report.session_duration_seconds,
            report.average_fps,
            report.one_percent_low_fps
        );
        log::info!(
            "  Events: {} broadcast, {} listener calls, {} fault(s), {} dropped",
            events.total_events_broadcast,
            events.total_listener_invocations,
            events.listener_faults,
            events.dropped_deferred_events
        );
        log::info!(
            "  Budget violations: {} (peak memory {:.2} MB)",
            report.total_violations,
            report.peak_memory as f64 / (1024.0 * 1024.0)
        );
        if report.leak_detected {
            log::warn!(
                "  Memory growing at {:.2} MB/min",
                report.memory_growth_mb_per_min
            );
        }
        log::info!("-----------------------------");
    }
}

impl Default for DelveRuntime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Drop for DelveRuntime {
    fn drop(&mut self) {
        let pending = self.events.pending_deferred_events();
        if pending > 0 {
            log::warn!("Delve runtime dropped with {pending} undelivered deferred event(s).");
        }
        log::info!("Delve runtime shut down.");
    }
}
