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

use approx::assert_relative_eq;
use delve_telemetry::{MemoryProbeKind, TelemetryConfig, TelemetryError, TelemetryService};

const FRAME_60: f64 = 1.0 / 60.0;
const FRAME_30: f64 = 1.0 / 30.0;

fn service() -> TelemetryService {
    TelemetryService::new(TelemetryConfig {
        memory_probe: MemoryProbeKind::TrackedOnly,
        ..Default::default()
    })
}

fn run(telemetry: &mut TelemetryService, delta: f64, frames: usize) {
    for _ in 0..frames {
        telemetry.tick(delta);
    }
}

#[test]
fn steady_frame_rates_average_correctly() {
    let mut telemetry = service();
    run(&mut telemetry, FRAME_60, 120);
    let fps = telemetry.average_fps(60);
    assert!(
        (fps - 60.0).abs() <= 0.6,
        "Average FPS at 1/60s should be within 1% of 60, got {fps}"
    );

    let mut telemetry = service();
    run(&mut telemetry, FRAME_30, 120);
    let fps = telemetry.average_fps(60);
    assert!(
        (fps - 30.0).abs() <= 0.3,
        "Average FPS at 1/30s should be within 1% of 30, got {fps}"
    );
}

#[test]
fn slow_frame_is_flagged_immediately_and_clears() {
    let mut telemetry = service();
    run(&mut telemetry, FRAME_60, 30);
    assert!(!telemetry.frames().is_spike_detected());

    telemetry.tick(0.050);
    assert!(
        telemetry.frames().is_spike_detected(),
        "A 50 ms frame should be detected on the frame it happens"
    );

    run(&mut telemetry, FRAME_60, 3);
    assert!(!telemetry.frames().is_spike_detected());
}

#[test]
fn budget_violation_is_recorded_once() {
    let mut telemetry = service();
    telemetry.register_system("Combat", 2.0).unwrap();
    telemetry.tick(FRAME_60);

    telemetry.record_system_time("Combat", 2.5);

    assert_eq!(telemetry.systems().total_violations(), 1);
    let violation = &telemetry.systems().recent_violations(1)[0];
    assert_relative_eq!(violation.overage_percent, 25.0);
    assert_relative_eq!(violation.timestamp, FRAME_60);
    assert_eq!(violation.frame_number, 1);
    assert!(telemetry.systems().is_budget_violated("Combat"));
}

#[test]
fn immediate_compare_shows_no_regression() {
    let mut telemetry = service();
    telemetry.record_system_time("AI", 0.4);
    run(&mut telemetry, FRAME_60, 120);

    telemetry.capture_baseline("startup").unwrap();
    let comparison = telemetry.compare_to_baseline("startup").unwrap();

    assert!(comparison.fps_change_percent.abs() < 5.0);
    assert!(!comparison.is_regression);
    assert!(!comparison.is_improvement);
    assert_eq!(comparison.system_changes.get("AI"), Some(&0.0));
}

#[test]
fn slower_frames_are_a_regression() {
    let mut telemetry = service();
    run(&mut telemetry, FRAME_60, 120);
    telemetry.capture_baseline("fast").unwrap();

    // Replace the whole frame buffer with 30 FPS frames.
    let capacity = telemetry.config().frame_buffer_capacity;
    run(&mut telemetry, FRAME_30, capacity);
    let comparison = telemetry.compare_to_baseline("fast").unwrap();

    assert!(comparison.is_regression, "Halving the FPS must be a regression");
    assert_relative_eq!(comparison.fps_change_percent, -50.0, epsilon = 0.5);
    assert!(comparison.frame_time_change_percent > 95.0);
}

#[test]
fn steady_allocation_is_reported_as_leak() {
    let mut telemetry = service();

    for _ in 0..200 {
        telemetry.track_allocation("Inventory", 10 * 1024);
        telemetry.tick(FRAME_60);
    }

    let memory = telemetry.memory();
    assert_eq!(memory.snapshot_history().len(), 2, "Snapshots at ticks 100 and 200");
    assert!(
        memory.memory_growth_rate() > 10.0,
        "Growth rate should exceed 10 MB/min, got {}",
        memory.memory_growth_rate()
    );
    assert!(memory.is_leak_detected());
}

#[test]
fn balanced_allocation_is_not_a_leak() {
    let mut telemetry = service();

    for _ in 0..200 {
        telemetry.track_allocation("Inventory", 10 * 1024);
        telemetry.tick(FRAME_60);
        telemetry.track_deallocation("Inventory", 10 * 1024);
    }

    let memory = telemetry.memory();
    assert!(memory.memory_growth_rate() <= 10.0);
    assert!(!memory.is_leak_detected());
    assert_eq!(memory.tracked_total(), 0);
}

#[test]
fn baselines_survive_save_and_load() {
    let path = std::env::temp_dir().join(format!(
        "delve_service_baseline_{}.json",
        std::process::id()
    ));
    let mut telemetry = service();
    run(&mut telemetry, FRAME_60, 60);
    telemetry.capture_baseline("checkpoint").unwrap();
    telemetry.save_baseline("checkpoint", &path).unwrap();

    let mut fresh = service();
    let name = fresh.load_baseline(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(name, "checkpoint");
    assert_eq!(fresh.baseline_names(), vec!["checkpoint"]);
    assert_eq!(
        fresh.baseline("checkpoint").unwrap().total_frames_captured,
        60
    );
}

#[test]
fn baseline_errors_are_reported() {
    let mut telemetry = service();
    assert!(matches!(
        telemetry.capture_baseline(""),
        Err(TelemetryError::InvalidBaselineName)
    ));
    assert!(matches!(
        telemetry.compare_to_baseline("nope"),
        Err(TelemetryError::BaselineNotFound(_))
    ));
    assert!(matches!(
        telemetry.save_baseline("nope", std::env::temp_dir().join("unused.json")),
        Err(TelemetryError::BaselineNotFound(_))
    ));
}
