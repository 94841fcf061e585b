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

//! Platform memory sampling.

use crate::config::MemoryProbeKind;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// A source of process-wide memory usage.
pub trait MemoryProbe: std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Bytes currently used by the process, or `None` when unavailable.
    fn sample_process_memory(&mut self) -> Option<u64>;
}

/// Builds the probe selected in the configuration.
pub fn probe_for(kind: MemoryProbeKind) -> Box<dyn MemoryProbe> {
    match kind {
        MemoryProbeKind::Process => Box::new(ProcessMemoryProbe::new()),
        MemoryProbeKind::TrackedOnly => Box::new(TrackedMemoryProbe),
    }
}

/// Reads the resident memory of the current process with `sysinfo`.
pub struct ProcessMemoryProbe {
    system: System,
    pid: Option<Pid>,
}

impl ProcessMemoryProbe {
    /// Creates a probe for the current process.
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("Process memory probe unavailable: {e}");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessMemoryProbe")
            .field("pid", &self.pid)
            .finish()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn name(&self) -> &str {
        "process"
    }

    fn sample_process_memory(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        self.system.process(pid).map(|process| process.memory())
    }
}

/// A probe with no platform source; the tracker falls back to tracked bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackedMemoryProbe;

impl MemoryProbe for TrackedMemoryProbe {
    fn name(&self) -> &str {
        "tracked-only"
    }

    fn sample_process_memory(&mut self) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_probe_has_no_sample() {
        let mut probe = probe_for(MemoryProbeKind::TrackedOnly);
        assert_eq!(probe.name(), "tracked-only");
        assert_eq!(probe.sample_process_memory(), None);
    }

    #[test]
    fn test_process_probe_reports_memory() {
        let mut probe = ProcessMemoryProbe::new();
        if probe.pid.is_none() {
            return;
        }
        let sample = probe.sample_process_memory();
        assert!(
            sample.map_or(true, |bytes| bytes > 0),
            "A live process should report non-zero memory"
        );
    }
}
