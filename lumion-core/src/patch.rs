//! Partial-field updates to a character.
//!
//! Edits produce a [`CharacterPatch`] holding only the fields they changed.
//! `abilities` carries only the touched keys and `skills` only the touched
//! categories; both merge per key when applied. Two actors editing different
//! fields of the same character therefore never overwrite each other.

use crate::abilities::AbilityScores;
use crate::character::{CharacterProfile, Status};
use crate::skills::LearnedSkills;
use serde::{Deserialize, Serialize};

/// Minimal delta to persist for one edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skillpoints: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abilities: Option<AbilityScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<LearnedSkills>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl CharacterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set one ability key in the patch.
    pub fn set_ability(&mut self, key: &str, value: i32) {
        self.abilities
            .get_or_insert_with(AbilityScores::new)
            .set(key, value);
    }

    /// Names of the top-level fields this patch touches, in wire spelling.
    pub fn fields(&self) -> Vec<&'static str> {
        [
            (self.name.is_some(), "name"),
            (self.level.is_some(), "level"),
            (self.status.is_some(), "status"),
            (self.hp.is_some(), "hp"),
            (self.hp_max.is_some(), "hpMax"),
            (self.armor.is_some(), "armor"),
            (self.ability_points.is_some(), "abilityPoints"),
            (self.skillpoints.is_some(), "skillpoints"),
            (self.abilities.is_some(), "abilities"),
            (self.skills.is_some(), "skills"),
            (self.inventory.is_some(), "inventory"),
            (self.story.is_some(), "story"),
            (self.note.is_some(), "note"),
            (self.picture.is_some(), "picture"),
        ]
        .into_iter()
        .filter_map(|(touched, wire)| touched.then_some(wire))
        .collect()
    }

    /// Apply the patch. Map fields merge per key.
    pub fn apply_to(&self, profile: &mut CharacterProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(level) = self.level {
            profile.level = level;
        }
        if let Some(status) = self.status {
            profile.status = status;
        }
        if let Some(hp) = self.hp {
            profile.hp = hp;
        }
        if let Some(hp_max) = self.hp_max {
            profile.hp_max = hp_max;
        }
        if let Some(armor) = self.armor {
            profile.armor = armor;
        }
        if let Some(points) = self.ability_points {
            profile.ability_points = points;
        }
        if let Some(points) = self.skillpoints {
            profile.skillpoints = points;
        }
        if let Some(abilities) = &self.abilities {
            for (key, value) in abilities.iter() {
                profile.abilities.set(key, value);
            }
        }
        if let Some(skills) = &self.skills {
            for (category, list) in skills {
                profile.skills.insert(*category, list.clone());
            }
        }
        if let Some(inventory) = &self.inventory {
            profile.inventory = inventory.clone();
        }
        if let Some(story) = &self.story {
            profile.story = story.clone();
        }
        if let Some(note) = &self.note {
            profile.note = note.clone();
        }
        if let Some(picture) = &self.picture {
            profile.picture = picture.clone();
        }
    }

    /// The patch that restores what `profile` holds now for every field this
    /// patch touches. Applying `self` and then the snapshot is a no-op as far
    /// as reads go: an ability key that was absent comes back as an explicit
    /// 0, which reads the same.
    pub fn snapshot_of(&self, profile: &CharacterProfile) -> CharacterPatch {
        CharacterPatch {
            name: self.name.as_ref().map(|_| profile.name.clone()),
            level: self.level.map(|_| profile.level),
            status: self.status.map(|_| profile.status),
            hp: self.hp.map(|_| profile.hp),
            hp_max: self.hp_max.map(|_| profile.hp_max),
            armor: self.armor.map(|_| profile.armor),
            ability_points: self.ability_points.map(|_| profile.ability_points),
            skillpoints: self.skillpoints.map(|_| profile.skillpoints),
            abilities: self.abilities.as_ref().map(|touched| {
                touched
                    .iter()
                    .map(|(key, _)| (key, profile.abilities.get(key)))
                    .collect()
            }),
            skills: self.skills.as_ref().map(|touched| {
                touched
                    .keys()
                    .map(|category| {
                        let list = profile.skills.get(category).cloned().unwrap_or_default();
                        (*category, list)
                    })
                    .collect()
            }),
            inventory: self.inventory.as_ref().map(|_| profile.inventory.clone()),
            story: self.story.as_ref().map(|_| profile.story.clone()),
            note: self.note.as_ref().map(|_| profile.note.clone()),
            picture: self.picture.as_ref().map(|_| profile.picture.clone()),
        }
    }

    /// Fold `later` into this patch; `later` wins where both touch a field.
    pub fn merge(&mut self, later: CharacterPatch) {
        fn take<T>(slot: &mut Option<T>, later: Option<T>) {
            if later.is_some() {
                *slot = later;
            }
        }
        take(&mut self.name, later.name);
        take(&mut self.level, later.level);
        take(&mut self.status, later.status);
        take(&mut self.hp, later.hp);
        take(&mut self.hp_max, later.hp_max);
        take(&mut self.armor, later.armor);
        take(&mut self.ability_points, later.ability_points);
        take(&mut self.skillpoints, later.skillpoints);
        take(&mut self.inventory, later.inventory);
        take(&mut self.story, later.story);
        take(&mut self.note, later.note);
        take(&mut self.picture, later.picture);
        if let Some(abilities) = later.abilities {
            for (key, value) in abilities.iter() {
                self.set_ability(key, value);
            }
        }
        if let Some(skills) = later.skills {
            self.skills.get_or_insert_with(LearnedSkills::new).extend(skills);
        }
    }
}
