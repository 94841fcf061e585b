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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Invocation priority of a listener. Higher priorities run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ListenerPriority {
    /// Runs before every `Normal` and `Low` listener.
    High,
    /// The default priority.
    #[default]
    Normal,
    /// Runs after every `High` and `Normal` listener.
    Low,
}

impl ListenerPriority {
    /// All priorities in invocation order.
    pub const ORDERED: [ListenerPriority; 3] = [
        ListenerPriority::High,
        ListenerPriority::Normal,
        ListenerPriority::Low,
    ];

    /// Position of this priority in [`ListenerPriority::ORDERED`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            ListenerPriority::High => 0,
            ListenerPriority::Normal => 1,
            ListenerPriority::Low => 2,
        }
    }
}

/// Opaque identifier of a registered listener.
///
/// Handles are minted from a monotonically increasing counter and are never
/// reused by the dispatcher that issued them. The zero value is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    /// The invalid handle.
    pub const INVALID: ListenerHandle = ListenerHandle(0);

    /// Wraps a raw handle value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns `true` unless this is [`ListenerHandle::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let indices: Vec<usize> = ListenerPriority::ORDERED.iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(ListenerPriority::default(), ListenerPriority::Normal);
    }

    #[test]
    fn test_handle_validity() {
        assert!(!ListenerHandle::INVALID.is_valid());
        assert!(!ListenerHandle::default().is_valid());
        assert!(ListenerHandle::from_raw(7).is_valid());
        assert_eq!(ListenerHandle::from_raw(7).raw(), 7);
    }
}
