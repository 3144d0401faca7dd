//! Reading character documents written by older clients.
//!
//! Stored records carry several spellings for the same field (`skillPoints`
//! next to `skillpoints`, five different id keys, the class as a bare id or
//! an object, skills wrapped in an array). [`CharacterRecord`] accepts all of
//! them once at ingress and [`CharacterRecord::canonicalize`] produces the
//! one [`CharacterProfile`] shape the rest of the crate works with.

use crate::abilities::AbilityScores;
use crate::character::{CharacterId, CharacterProfile, Status};
use crate::class_data::{deserialize_skills, ClassDefinition, ClassSkills};
use crate::config::EngineConfig;
use crate::derive::{fill_missing_vitals, max_hit_points};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys that have held the character id, in lookup order.
const ID_KEYS: [&str; 5] = ["id", "charId", "_remoteId", "_id", "remoteId"];

/// Class reference: a bare id or an `{id, name}` object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClassRef {
    Id(String),
    Object {
        #[serde(alias = "class")]
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl ClassRef {
    pub fn id(&self) -> &str {
        match self {
            ClassRef::Id(id) => id,
            ClassRef::Object { id, .. } => id,
        }
    }
}

/// An inventory entry as stored: a name or an object with one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum StoredItem {
    Name(String),
    Named { name: String },
}

impl StoredItem {
    fn into_name(self) -> String {
        match self {
            StoredItem::Name(name) | StoredItem::Named { name } => name,
        }
    }
}

/// A character document as found in storage, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    /// Resolved from [`ID_KEYS`] by [`CharacterRecord::from_value`].
    #[serde(skip)]
    pub id: Option<CharacterId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub class: Option<ClassRef>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default, alias = "maxHp")]
    pub hp_max: Option<i32>,
    #[serde(default, alias = "defense")]
    pub armor: Option<i32>,
    #[serde(default)]
    pub ability_points: Option<u32>,
    #[serde(default, alias = "skillPoints")]
    pub skillpoints: Option<u32>,
    #[serde(default)]
    pub abilities: Option<BTreeMap<String, Option<i32>>>,
    #[serde(default, deserialize_with = "deserialize_optional_skills")]
    pub skills: Option<ClassSkills>,
    #[serde(default)]
    inventory: Option<Vec<StoredItem>>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub story: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

fn deserialize_optional_skills<'de, D>(deserializer: D) -> Result<Option<ClassSkills>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => deserialize_skills(value).map(Some).map_err(D::Error::custom),
    }
}

impl CharacterRecord {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::from_str(content)?)
    }

    /// Parse a stored document, resolving the id from whichever key holds it.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let id = resolve_id(&value);
        let mut record: CharacterRecord = serde_json::from_value(value)?;
        record.id = id;
        Ok(record)
    }

    /// Class id the record refers to, if any.
    pub fn class_id(&self) -> Option<&str> {
        self.class.as_ref().map(ClassRef::id)
    }

    /// Produce the canonical profile.
    ///
    /// `class` fills vitals the record never stored. Without it the class
    /// base counts as 0. Armor falls back to the configured value.
    pub fn canonicalize(
        self,
        class: Option<&ClassDefinition>,
        config: &EngineConfig,
    ) -> CharacterProfile {
        let abilities: AbilityScores = self
            .abilities
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.unwrap_or(0)))
            .collect();

        let mut hp = self.hp;
        let mut hp_max = self.hp_max;
        fill_missing_vitals(&mut hp, &mut hp_max, &abilities, class);
        let hp_max = hp_max.unwrap_or_else(|| {
            tracing::warn!(id = ?self.id, "Record has no max HP and no class metadata");
            max_hit_points(None, &abilities)
        });
        let hp = hp.unwrap_or(hp_max).min(hp_max);

        let class_id = self
            .class
            .as_ref()
            .map(|c| c.id().to_string())
            .or_else(|| class.map(|c| c.id.clone()))
            .unwrap_or_default();
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| config.fallback_name.clone());

        let mut profile = CharacterProfile::new(name, class_id);
        profile.id = self.id;
        if let Some(created_at) = self.created_at {
            profile.created_at = created_at;
        }
        profile.level = self.level.unwrap_or(1).max(1);
        profile.status = self.status.unwrap_or_default();
        profile.hp = hp;
        profile.hp_max = hp_max;
        profile.armor = self.armor.unwrap_or(config.fallback_armor);
        profile.ability_points = self.ability_points.unwrap_or(0);
        profile.skillpoints = self.skillpoints.unwrap_or(0);
        profile.abilities = abilities;
        profile.skills = self.skills.map(ClassSkills::into_learned).unwrap_or_default();
        profile.inventory = self
            .inventory
            .unwrap_or_default()
            .into_iter()
            .map(StoredItem::into_name)
            .collect();
        profile.history = self.history.unwrap_or_default();
        profile.story = self.story.unwrap_or_default();
        profile.note = self.note.unwrap_or_default();
        profile.picture = self
            .picture
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| config.default_picture.clone());
        profile
    }
}

fn resolve_id(value: &Value) -> Option<CharacterId> {
    let object = value.as_object()?;
    ID_KEYS.iter().find_map(|key| match object.get(*key)? {
        Value::String(id) if !id.is_empty() => Some(CharacterId::new(id.clone())),
        Value::Number(id) => Some(CharacterId::new(id.to_string())),
        _ => None,
    })
}
