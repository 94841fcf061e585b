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

//! Liveness-checked references to game objects.
//!
//! A game object holds an [`ObjectToken`] for as long as it exists. Any system
//! that needs to remember the object without owning it (listener owners, event
//! instigators, actor filters) keeps an [`ObjectRef`] instead, which can be
//! compared by identity and asked whether the object is still alive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Returns the raw numeric value of the id.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object#{}", self.0)
    }
}

#[derive(Debug)]
struct ObjectCell {
    id: ObjectId,
    name: String,
}

/// Strong liveness token held by the owning game object.
///
/// Cloning the token keeps the same identity. The object is considered dead
/// once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct ObjectToken {
    cell: Arc<ObjectCell>,
}

impl ObjectToken {
    /// Creates a token for a new object with a debug name.
    pub fn new(name: impl Into<String>) -> Self {
        let id = ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            cell: Arc::new(ObjectCell {
                id,
                name: name.into(),
            }),
        }
    }

    /// Returns the identity of the object.
    pub fn id(&self) -> ObjectId {
        self.cell.id
    }

    /// Returns the debug name given at creation.
    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// Returns a non-owning reference to this object.
    pub fn downgrade(&self) -> ObjectRef {
        ObjectRef {
            id: self.cell.id,
            cell: Arc::downgrade(&self.cell),
        }
    }
}

/// Non-owning, comparable reference to a game object.
#[derive(Clone)]
pub struct ObjectRef {
    id: ObjectId,
    cell: Weak<ObjectCell>,
}

impl ObjectRef {
    /// Returns the identity of the referenced object, alive or not.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns `true` while the referenced object still exists.
    pub fn is_alive(&self) -> bool {
        self.cell.strong_count() > 0
    }

    /// Returns the debug name of the object if it is still alive.
    pub fn name(&self) -> Option<String> {
        self.cell.upgrade().map(|cell| cell.name.clone())
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ObjectRef {}

impl std::hash::Hash for ObjectRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl From<&ObjectToken> for ObjectRef {
    fn from(token: &ObjectToken) -> Self {
        token.downgrade()
    }
}
