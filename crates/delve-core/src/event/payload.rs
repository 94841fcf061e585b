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

//! Event payloads carried by broadcasts.

use super::tag::EventTag;
use super::validation::ValidationReport;
use crate::math::Vec3;
use crate::object::ObjectRef;

/// Damage dealt from one object to another.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageData {
    /// The object dealing the damage.
    pub attacker: Option<ObjectRef>,
    /// The object receiving the damage.
    pub victim: Option<ObjectRef>,
    /// Amount of damage, must be finite and non-negative.
    pub amount: f32,
    /// Free-form damage category (e.g. `"Physical"`, `"Fire"`).
    pub damage_type: String,
}

/// A change of an object's health pool.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthChangeData {
    /// The object whose health changed.
    pub character: Option<ObjectRef>,
    /// Health before the change.
    pub previous_health: f32,
    /// Health after the change.
    pub new_health: f32,
    /// Upper bound of the health pool, must be positive.
    pub max_health: f32,
}

/// An object was killed.
#[derive(Debug, Clone, PartialEq)]
pub struct KillData {
    /// The object credited with the kill, absent for environmental deaths.
    pub killer: Option<ObjectRef>,
    /// The object that died.
    pub victim: Option<ObjectRef>,
    /// Experience granted to the killer.
    pub experience_reward: u32,
}

/// An area attack was performed.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackData {
    /// The attacking object.
    pub attacker: Option<ObjectRef>,
    /// Center of the attack in world space.
    pub attack_location: Vec3,
    /// Radius of the attack, must be finite and non-negative.
    pub attack_radius: f32,
}

/// Type-specific part of an [`EventPayload`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PayloadData {
    /// No additional data.
    #[default]
    Generic,
    /// See [`DamageData`].
    Damage(DamageData),
    /// See [`HealthChangeData`].
    HealthChange(HealthChangeData),
    /// See [`KillData`].
    Kill(KillData),
    /// See [`AttackData`].
    Attack(AttackData),
}

impl PayloadData {
    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PayloadData::Generic => "Generic",
            PayloadData::Damage(_) => "Damage",
            PayloadData::HealthChange(_) => "HealthChange",
            PayloadData::Kill(_) => "Kill",
            PayloadData::Attack(_) => "Attack",
        }
    }
}

/// An event broadcast through the dispatcher.
///
/// Built by the broadcaster and handed to listeners by reference. Deferred
/// delivery keeps its own clone until the queue is flushed.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    /// Tag the event is broadcast on.
    pub tag: EventTag,
    /// Game time in seconds at which the event happened.
    pub timestamp: f64,
    /// The object that caused the event, if any.
    pub instigator: Option<ObjectRef>,
    /// World-space location of the event, if it has one.
    pub location: Option<Vec3>,
    /// Variant-specific data.
    pub data: PayloadData,
}

impl EventPayload {
    /// Creates a generic payload with no instigator or location.
    pub fn new(tag: EventTag) -> Self {
        Self {
            tag,
            timestamp: 0.0,
            instigator: None,
            location: None,
            data: PayloadData::Generic,
        }
    }

    /// Creates a damage payload. The attacker becomes the instigator.
    pub fn damage(
        tag: EventTag,
        attacker: Option<ObjectRef>,
        victim: Option<ObjectRef>,
        amount: f32,
        damage_type: impl Into<String>,
    ) -> Self {
        Self {
            instigator: attacker.clone(),
            data: PayloadData::Damage(DamageData {
                attacker,
                victim,
                amount,
                damage_type: damage_type.into(),
            }),
            ..Self::new(tag)
        }
    }

    /// Creates a health-change payload. The character becomes the instigator.
    pub fn health_change(
        tag: EventTag,
        character: Option<ObjectRef>,
        previous_health: f32,
        new_health: f32,
        max_health: f32,
    ) -> Self {
        Self {
            instigator: character.clone(),
            data: PayloadData::HealthChange(HealthChangeData {
                character,
                previous_health,
                new_health,
                max_health,
            }),
            ..Self::new(tag)
        }
    }

    /// Creates a kill payload. The killer becomes the instigator.
    pub fn kill(
        tag: EventTag,
        killer: Option<ObjectRef>,
        victim: Option<ObjectRef>,
        experience_reward: u32,
    ) -> Self {
        Self {
            instigator: killer.clone(),
            data: PayloadData::Kill(KillData {
                killer,
                victim,
                experience_reward,
            }),
            ..Self::new(tag)
        }
    }

    /// Creates an attack payload located at the attack center.
    pub fn attack(
        tag: EventTag,
        attacker: Option<ObjectRef>,
        attack_location: Vec3,
        attack_radius: f32,
    ) -> Self {
        Self {
            instigator: attacker.clone(),
            location: Some(attack_location),
            data: PayloadData::Attack(AttackData {
                attacker,
                attack_location,
                attack_radius,
            }),
            ..Self::new(tag)
        }
    }

    /// Sets the timestamp.
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the instigator.
    pub fn with_instigator(mut self, instigator: impl Into<ObjectRef>) -> Self {
        self.instigator = Some(instigator.into());
        self
    }

    /// Sets the world-space location.
    pub fn with_location(mut self, location: Vec3) -> Self {
        self.location = Some(location);
        self
    }

    /// Checks every rule for the common header and the variant data.
    ///
    /// All failures are collected into the returned report.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::new(self.tag.to_string());

        report.require(self.tag.is_valid(), "tag", "event tag is not valid");
        report.require(
            self.timestamp.is_finite() && self.timestamp >= 0.0,
            "timestamp",
            format!("timestamp must be finite and >= 0, got {}", self.timestamp),
        );
        if let Some(location) = &self.location {
            report.require(location.is_finite(), "location", "location must be finite");
        }

        match &self.data {
            PayloadData::Generic => {}
            PayloadData::Damage(damage) => {
                report.require(
                    damage.amount.is_finite() && damage.amount >= 0.0,
                    "damage.amount",
                    format!("damage amount must be finite and >= 0, got {}", damage.amount),
                );
                report.require(damage.attacker.is_some(), "damage.attacker", "attacker is missing");
                report.require(damage.victim.is_some(), "damage.victim", "victim is missing");
            }
            PayloadData::HealthChange(health) => {
                report.require(
                    health.max_health.is_finite() && health.max_health > 0.0,
                    "health.max_health",
                    format!("max health must be > 0, got {}", health.max_health),
                );
                report.require(
                    (0.0..=health.max_health).contains(&health.previous_health),
                    "health.previous_health",
                    format!(
                        "previous health {} outside [0, {}]",
                        health.previous_health, health.max_health
                    ),
                );
                report.require(
                    (0.0..=health.max_health).contains(&health.new_health),
                    "health.new_health",
                    format!(
                        "new health {} outside [0, {}]",
                        health.new_health, health.max_health
                    ),
                );
                report.require(health.character.is_some(), "health.character", "character is missing");
            }
            PayloadData::Kill(kill) => {
                report.require(kill.victim.is_some(), "kill.victim", "victim is missing");
            }
            PayloadData::Attack(attack) => {
                report.require(
                    attack.attack_radius.is_finite() && attack.attack_radius >= 0.0,
                    "attack.radius",
                    format!("attack radius must be finite and >= 0, got {}", attack.attack_radius),
                );
                report.require(
                    attack.attack_location.is_finite(),
                    "attack.location",
                    "attack location must be finite",
                );
                report.require(attack.attacker.is_some(), "attack.attacker", "attacker is missing");
            }
        }

        report.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectToken;

    fn tag(name: &str) -> EventTag {
        EventTag::new(name).unwrap()
    }

    #[test]
    fn test_generic_payload_is_valid() {
        let payload = EventPayload::new(tag("Game.World.DoorOpened")).with_timestamp(2.5);
        assert!(payload.validate().is_ok());
        assert_eq!(payload.data.kind(), "Generic");
    }

    #[test]
    fn test_invalid_tag_and_timestamp_are_reported_together() {
        let payload = EventPayload::new(EventTag::none()).with_timestamp(-1.0);
        let report = payload.validate().unwrap_err();
        assert!(report.has_issue_for("tag"));
        assert!(report.has_issue_for("timestamp"));
    }

    #[test]
    fn test_damage_validation() {
        let attacker = ObjectToken::new("Dwarf");
        let victim = ObjectToken::new("Goblin");

        let ok = EventPayload::damage(
            tag("Game.Combat.Damage"),
            Some(attacker.downgrade()),
            Some(victim.downgrade()),
            12.0,
            "Physical",
        );
        assert!(ok.validate().is_ok());
        assert_eq!(ok.instigator, Some(attacker.downgrade()));

        let bad = EventPayload::damage(tag("Game.Combat.Damage"), None, None, -3.0, "Fire");
        let report = bad.validate().unwrap_err();
        assert_eq!(report.issues().len(), 3);
        assert!(report.has_issue_for("damage.amount"));
        assert!(report.has_issue_for("damage.attacker"));
        assert!(report.has_issue_for("damage.victim"));
    }

    #[test]
    fn test_health_change_validation() {
        let character = ObjectToken::new("Dwarf");
        let ok = EventPayload::health_change(
            tag("Game.Character.Health"),
            Some(character.downgrade()),
            100.0,
            80.0,
            100.0,
        );
        assert!(ok.validate().is_ok());

        let bad = EventPayload::health_change(
            tag("Game.Character.Health"),
            Some(character.downgrade()),
            100.0,
            150.0,
            0.0,
        );
        let report = bad.validate().unwrap_err();
        assert!(report.has_issue_for("health.max_health"));
        assert!(report.has_issue_for("health.new_health"));
    }

    #[test]
    fn test_kill_and_attack_validation() {
        let victim = ObjectToken::new("Goblin");
        let kill = EventPayload::kill(tag("Game.Combat.Kill"), None, Some(victim.downgrade()), 50);
        assert!(kill.validate().is_ok(), "environmental kills have no killer");

        let attacker = ObjectToken::new("Dwarf");
        let attack = EventPayload::attack(
            tag("Game.Combat.Attack"),
            Some(attacker.downgrade()),
            Vec3::new(1.0, 2.0, 0.0),
            -1.0,
        );
        assert_eq!(attack.location, Some(Vec3::new(1.0, 2.0, 0.0)));
        let report = attack.validate().unwrap_err();
        assert!(report.has_issue_for("attack.radius"));
    }
}
