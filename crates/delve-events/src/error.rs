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

//! Errors reported by the event dispatcher.

use delve_core::{EventTag, ListenerHandle};
use std::fmt::{self, Display};

/// A specialized `Result` for dispatcher operations.
pub type EventResult<T> = Result<T, EventError>;

/// An error that can occur when registering or unregistering listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum EventError {
    /// The tag is empty or malformed.
    InvalidTag(EventTag),
    /// The listener owner was already destroyed at registration time.
    OwnerNotAlive {
        /// Tag the registration targeted.
        tag: EventTag,
    },
    /// The handle is invalid or no longer registered.
    UnknownHandle(ListenerHandle),
}

impl Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::InvalidTag(tag) => write!(f, "Invalid event tag: {tag}"),
            EventError::OwnerNotAlive { tag } => {
                write!(f, "Listener owner for '{tag}' is no longer alive")
            }
            EventError::UnknownHandle(handle) => write!(f, "Unknown listener handle: {handle}"),
        }
    }
}

impl std::error::Error for EventError {}
