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

//! Event contracts: tags, payloads, validation, filters, priorities and handles.

mod filter;
mod listener;
mod payload;
mod tag;
mod validation;

pub use self::filter::{ActorFilter, EventFilter, SpatialFilter};
pub use self::listener::{ListenerHandle, ListenerPriority};
pub use self::payload::{
    AttackData, DamageData, EventPayload, HealthChangeData, KillData, PayloadData,
};
pub use self::tag::{EventTag, TagError, TAG_SEPARATOR};
pub use self::validation::{ValidationIssue, ValidationReport};
