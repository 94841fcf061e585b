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

//! Per-listener payload filters.

use super::payload::EventPayload;
use crate::math::Vec3;
use crate::object::ObjectRef;

/// Restricts delivery to events instigated by one specific object.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorFilter {
    /// The only instigator accepted.
    pub target: ObjectRef,
}

/// Restricts delivery to events located within a sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialFilter {
    /// Fixed center of the sphere.
    pub center: Vec3,
    /// Radius of the sphere; negative or non-finite radii reject everything.
    pub radius: f32,
}

impl SpatialFilter {
    /// Returns `true` if `location` lies inside (or on) the sphere.
    pub fn contains(&self, location: Vec3) -> bool {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return false;
        }
        self.center.distance_squared(location) <= self.radius * self.radius
    }
}

/// Optional predicate attached to a listener registration.
///
/// The spatial part is only evaluated by [`EventFilter::passes_at`]; the
/// single-argument [`EventFilter::passes`] looks at the actor part alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Actor restriction, if enabled.
    pub actor: Option<ActorFilter>,
    /// Spatial restriction, if enabled.
    pub spatial: Option<SpatialFilter>,
}

impl EventFilter {
    /// A filter that only accepts events instigated by `target`.
    pub fn for_actor(target: impl Into<ObjectRef>) -> Self {
        Self::default().with_actor(target)
    }

    /// A filter that only accepts events located within `radius` of `center`.
    pub fn within_radius(center: Vec3, radius: f32) -> Self {
        Self::default().with_spatial(center, radius)
    }

    /// Enables the actor restriction.
    pub fn with_actor(mut self, target: impl Into<ObjectRef>) -> Self {
        self.actor = Some(ActorFilter {
            target: target.into(),
        });
        self
    }

    /// Enables the spatial restriction.
    pub fn with_spatial(mut self, center: Vec3, radius: f32) -> Self {
        self.spatial = Some(SpatialFilter { center, radius });
        self
    }

    /// Returns `true` if neither restriction is enabled.
    pub fn is_pass_through(&self) -> bool {
        self.actor.is_none() && self.spatial.is_none()
    }

    /// Evaluates the actor restriction against the payload instigator.
    ///
    /// The target must still be alive and be the instigator of the event.
    pub fn passes(&self, payload: &EventPayload) -> bool {
        match &self.actor {
            None => true,
            Some(actor) => {
                actor.target.is_alive() && payload.instigator.as_ref() == Some(&actor.target)
            }
        }
    }

    /// Evaluates the actor restriction and, when enabled, the spatial one
    /// against an explicit event location.
    pub fn passes_at(&self, payload: &EventPayload, location: Vec3) -> bool {
        if !self.passes(payload) {
            return false;
        }
        match &self.spatial {
            None => true,
            Some(spatial) => spatial.contains(location),
        }
    }
}
