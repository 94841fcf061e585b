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

//! # Delve Core
//!
//! Foundational crate containing the value types and contracts shared by the
//! event dispatcher and the telemetry aggregator: hierarchical event tags,
//! event payloads and their validation, listener priorities and handles,
//! liveness-checked object references, and telemetry record types.

#![warn(missing_docs)]

pub mod event;
pub mod math;
pub mod object;
pub mod telemetry;
pub mod utils;

pub use event::{EventPayload, EventTag, ListenerHandle, ListenerPriority};
pub use math::Vec3;
pub use object::{ObjectId, ObjectRef, ObjectToken};
pub use utils::timer::Stopwatch;
