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

//! Registration options and listener introspection records.

use delve_core::event::EventFilter;
use delve_core::{EventTag, ListenerHandle, ListenerPriority, ObjectId};

/// Optional registration parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListenerOptions {
    /// Invocation priority, `Normal` by default.
    pub priority: ListenerPriority,
    /// Payload filter, none by default.
    pub filter: Option<EventFilter>,
}

impl ListenerOptions {
    /// Options with the given priority and no filter.
    pub fn with_priority(priority: ListenerPriority) -> Self {
        Self {
            priority,
            filter: None,
        }
    }

    /// Attaches a filter.
    pub fn filtered(mut self, filter: EventFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Snapshot of a registered listener.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerInfo {
    /// The listener handle.
    pub handle: ListenerHandle,
    /// Tag the listener is registered on.
    pub tag: EventTag,
    /// Invocation priority.
    pub priority: ListenerPriority,
    /// Identifier of the owning object.
    pub owner: ObjectId,
    /// Whether the owner is still alive.
    pub owner_alive: bool,
    /// Seconds since dispatcher creation at registration time.
    pub registration_timestamp: f64,
    /// Number of times the callback ran.
    pub invocation_count: u64,
}
