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

//! Named baseline storage and JSON persistence.

use crate::error::{TelemetryError, TelemetryResult};
use delve_core::telemetry::PerformanceBaseline;
use std::collections::HashMap;
use std::path::Path;

/// Baselines stored by name.
#[derive(Debug, Clone, Default)]
pub struct BaselineStore {
    baselines: HashMap<String, PerformanceBaseline>,
}

impl BaselineStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `baseline` under its name, replacing any previous one.
    pub fn insert(&mut self, baseline: PerformanceBaseline) -> TelemetryResult<()> {
        if baseline.name.is_empty() {
            log::error!("{}", TelemetryError::InvalidBaselineName);
            return Err(TelemetryError::InvalidBaselineName);
        }
        if self.baselines.contains_key(&baseline.name) {
            log::warn!("Overwriting existing baseline '{}'.", baseline.name);
        }
        self.baselines.insert(baseline.name.clone(), baseline);
        Ok(())
    }

    /// Looks up a baseline.
    pub fn get(&self, name: &str) -> Option<&PerformanceBaseline> {
        self.baselines.get(name)
    }

    /// Looks up a baseline, logging and failing when it is missing.
    pub fn require(&self, name: &str) -> TelemetryResult<&PerformanceBaseline> {
        self.baselines.get(name).ok_or_else(|| {
            let err = TelemetryError::BaselineNotFound(name.to_string());
            log::warn!("{err}");
            err
        })
    }

    /// Removes a baseline.
    pub fn remove(&mut self, name: &str) -> Option<PerformanceBaseline> {
        self.baselines.remove(name)
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.baselines.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of stored baselines.
    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    /// Returns `true` when no baseline is stored.
    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }

    /// Writes the baseline `name` to `path` as pretty JSON.
    pub fn save(&self, name: &str, path: impl AsRef<Path>) -> TelemetryResult<()> {
        let baseline = self.require(name)?;
        let json = serde_json::to_string_pretty(baseline)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Saved baseline '{name}' to {}.", path.as_ref().display());
        Ok(())
    }

    /// Reads a baseline from `path` and stores it under its recorded name.
    ///
    /// Returns the name it was stored under.
    pub fn load(&mut self, path: impl AsRef<Path>) -> TelemetryResult<String> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let baseline: PerformanceBaseline = serde_json::from_str(&content)?;
        let name = baseline.name.clone();
        self.insert(baseline)?;
        log::info!("Loaded baseline '{name}' from {}.", path.as_ref().display());
        Ok(name)
    }
}
