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

//! # Delve Events
//!
//! A single-threaded, hierarchical event dispatcher. Listeners subscribe to a
//! dot-delimited [`EventTag`](delve_core::EventTag) and receive events
//! broadcast on that tag or any descendant, ordered by
//! [`ListenerPriority`](delve_core::ListenerPriority). Broadcasts can be
//! deferred into a bounded queue and flushed later.

#![warn(missing_docs)]

mod config;
mod deferred;
mod dispatcher;
mod error;
mod listener;
mod registry;
mod stats;

pub use config::{DeferredOverflowPolicy, EventSystemConfig, SpatialFilterMode};
pub use dispatcher::EventDispatcher;
pub use error::{EventError, EventResult};
pub use listener::{ListenerInfo, ListenerOptions};
pub use stats::EventSystemMetrics;
