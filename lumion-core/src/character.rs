//! The persisted character record.

use crate::abilities::AbilityScores;
use crate::derive;
use crate::skills::LearnedSkills;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the player who owns a character.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a character within its owner's collection.
///
/// Assigned by the store; numeric in practice, but treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id, if it is numeric.
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage key of a character: owner plus character id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CharacterKey {
    pub owner: OwnerId,
    pub character: CharacterId,
}

impl CharacterKey {
    pub fn new(owner: impl Into<String>, character: impl Into<String>) -> Self {
        Self {
            owner: OwnerId::new(owner),
            character: CharacterId::new(character),
        }
    }
}

impl fmt::Display for CharacterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.character)
    }
}

/// Whether the character is still in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Alive,
    Dead,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Alive => write!(f, "alive"),
            Status::Dead => write!(f, "dead"),
        }
    }
}

/// A player's character as stored and edited.
///
/// `armor` is the base value only. The Dexterity bonus is applied on read by
/// [`CharacterProfile::computed_defense`] and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    // Identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CharacterId>,
    pub name: String,
    /// Class id.
    pub class: String,
    pub created_at: DateTime<Utc>,

    // Vitals
    pub level: u32,
    #[serde(default)]
    pub status: Status,
    pub hp: i32,
    pub hp_max: i32,
    pub armor: i32,

    // Progression
    #[serde(default)]
    pub ability_points: u32,
    #[serde(default)]
    pub skillpoints: u32,

    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default)]
    pub skills: LearnedSkills,
    #[serde(default)]
    pub inventory: Vec<String>,

    // Narrative
    #[serde(default)]
    pub history: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub picture: String,
}

impl CharacterProfile {
    /// A level 1 character with no class data applied.
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            class: class.into(),
            created_at: Utc::now(),
            level: 1,
            status: Status::Alive,
            hp: 0,
            hp_max: 0,
            armor: 0,
            ability_points: 0,
            skillpoints: 0,
            abilities: AbilityScores::new(),
            skills: LearnedSkills::new(),
            inventory: Vec::new(),
            history: String::new(),
            story: String::new(),
            note: String::new(),
            picture: String::new(),
        }
    }

    /// Defense as displayed: base armor plus the Dexterity bonus.
    pub fn computed_defense(&self) -> i32 {
        derive::computed_defense(self.armor, &self.abilities)
    }

    pub fn is_alive(&self) -> bool {
        self.status == Status::Alive
    }

    pub fn is_full_health(&self) -> bool {
        self.hp == self.hp_max
    }

    /// Current HP as a fraction of max, in `[0, 1]`.
    pub fn hp_ratio(&self) -> f32 {
        if self.hp_max <= 0 {
            return 0.0;
        }
        (self.hp as f32 / self.hp_max as f32).clamp(0.0, 1.0)
    }

    /// Storage key, once the store has assigned an id.
    pub fn key(&self, owner: &OwnerId) -> Option<CharacterKey> {
        self.id.as_ref().map(|id| CharacterKey {
            owner: owner.clone(),
            character: id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_defaults() {
        let profile = CharacterProfile::new("Mira", "locksmith");
        assert_eq!(profile.level, 1);
        assert!(profile.is_alive());
        assert!(profile.id.is_none());
        assert!(profile.key(&OwnerId::new("42")).is_none());
    }

    #[test]
    fn test_computed_defense_is_not_persisted() {
        let mut profile = CharacterProfile::new("Mira", "locksmith");
        profile.armor = 1;
        profile.abilities.set("Dexterity", 23);
        assert_eq!(profile.computed_defense(), 3);

        profile.abilities.set("Dexterity", 35);
        assert_eq!(profile.computed_defense(), 4);
        assert_eq!(profile.armor, 1);

        let json = serde_json::to_value(&profile).expect("Should serialize");
        assert_eq!(json["armor"], 1);
    }

    #[test]
    fn test_wire_names() {
        let mut profile = CharacterProfile::new("Mira", "locksmith");
        profile.id = Some(CharacterId::new("3"));
        profile.hp_max = 20;
        profile.ability_points = 10;
        profile.skillpoints = 3;

        let json = serde_json::to_value(&profile).expect("Should serialize");
        assert_eq!(json["id"], "3");
        assert_eq!(json["hpMax"], 20);
        assert_eq!(json["abilityPoints"], 10);
        assert_eq!(json["skillpoints"], 3);
        assert_eq!(json["status"], "alive");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_key_display() {
        let key = CharacterKey::new("777", "2");
        assert_eq!(key.to_string(), "777/2");
        assert_eq!(key.character.numeric(), Some(2));
    }

    #[test]
    fn test_hp_ratio() {
        let mut profile = CharacterProfile::new("Mira", "locksmith");
        assert_eq!(profile.hp_ratio(), 0.0);
        profile.hp_max = 40;
        profile.hp = 10;
        assert!((profile.hp_ratio() - 0.25).abs() < f32::EPSILON);
    }
}
