//! Edit operations on an existing character.
//!
//! Every operation reads the current known profile and returns the minimal
//! [`CharacterPatch`] to persist. Nothing here mutates the profile; callers
//! apply the patch locally and send it to the store.

use crate::abilities::CONSTITUTION;
use crate::character::{CharacterProfile, Status};
use crate::class_data::ClassDefinition;
use crate::config::{EngineConfig, InventoryPolicy};
use crate::derive::{max_hit_points, recompute_hit_points};
use crate::patch::CharacterPatch;
use crate::skills::{is_learned, LearnedSkills, SkillCategory, SkillDefinition};
use thiserror::Error;

/// Why an edit was refused. A refused edit changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditRejection {
    #[error("No ability points left")]
    NoAbilityPoints,

    #[error("No skill points left")]
    NoSkillPoints,

    #[error("Requires level {required}")]
    LevelTooLow { required: u32 },

    #[error("Inventory is full ({limit} item(s))")]
    InventoryFull { limit: usize },

    #[error("Name cannot be empty")]
    EmptyName,
}

/// Result of an accepted edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The patch to apply and persist.
    Applied(CharacterPatch),
    /// The edit was already satisfied; there is nothing to write.
    Unchanged,
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied(_))
    }

    pub fn patch(&self) -> Option<&CharacterPatch> {
        match self {
            EditOutcome::Applied(patch) => Some(patch),
            EditOutcome::Unchanged => None,
        }
    }

    pub fn into_patch(self) -> Option<CharacterPatch> {
        match self {
            EditOutcome::Applied(patch) => Some(patch),
            EditOutcome::Unchanged => None,
        }
    }

    fn from_patch(patch: CharacterPatch) -> Self {
        if patch.is_empty() {
            EditOutcome::Unchanged
        } else {
            EditOutcome::Applied(patch)
        }
    }
}

pub type EditResult = Result<EditOutcome, EditRejection>;

// ============================================================================
// Abilities and skills
// ============================================================================

/// Move one ability by `delta`.
///
/// Raising costs one ability point; lowering is free. The result is clamped
/// to the configured bound. Changing Constitution moves max HP, and a
/// character at full health stays at full health.
pub fn adjust_ability(
    profile: &CharacterProfile,
    key: &str,
    delta: i32,
    class: Option<&ClassDefinition>,
    config: &EngineConfig,
) -> EditResult {
    if delta == 0 {
        return Ok(EditOutcome::Unchanged);
    }
    if delta > 0 && profile.ability_points == 0 {
        return Err(EditRejection::NoAbilityPoints);
    }

    let previous = profile.abilities.get(key);
    let value = config.clamp_ability(previous.saturating_add(delta));
    if value == previous {
        return Ok(EditOutcome::Unchanged);
    }

    let mut patch = CharacterPatch::new();
    patch.set_ability(key, value);
    if delta > 0 {
        patch.ability_points = Some(profile.ability_points - 1);
    }

    if key == CONSTITUTION {
        let base = class.and_then(|c| c.hp);
        if base.is_none() {
            tracing::warn!(class_id = %profile.class, "Class base HP unavailable, using 0");
        }
        let mut abilities = profile.abilities.clone();
        abilities.set(key, value);
        let hp_max = max_hit_points(base, &abilities);
        if hp_max != profile.hp_max {
            patch.hp_max = Some(hp_max);
        }
        let hp = recompute_hit_points(profile.hp, profile.hp_max, hp_max);
        if hp != profile.hp {
            patch.hp = Some(hp);
        }
    }

    tracing::debug!(ability = key, value, "Adjusted ability");
    Ok(EditOutcome::Applied(patch))
}

/// Learn `skill` in `category`.
///
/// Checks run in order: skill points, then level, then whether the skill is
/// already known in that category. Prerequisites are not enforced.
pub fn learn_skill(
    profile: &CharacterProfile,
    category: SkillCategory,
    skill: &SkillDefinition,
) -> EditResult {
    if profile.skillpoints == 0 {
        return Err(EditRejection::NoSkillPoints);
    }
    if profile.level < skill.level {
        return Err(EditRejection::LevelTooLow {
            required: skill.level,
        });
    }
    if is_learned(&profile.skills, category, &skill.name) {
        return Ok(EditOutcome::Unchanged);
    }

    let mut list = profile.skills.get(&category).cloned().unwrap_or_default();
    list.push(skill.clone());
    let mut skills = LearnedSkills::new();
    skills.insert(category, list);

    tracing::debug!(skill = %skill.name, category = %category, "Learned skill");
    Ok(EditOutcome::Applied(CharacterPatch {
        skills: Some(skills),
        skillpoints: Some(profile.skillpoints - 1),
        ..Default::default()
    }))
}

/// Add ability points, e.g. from the game master.
pub fn grant_ability_points(profile: &CharacterProfile, amount: u32) -> EditResult {
    if amount == 0 {
        return Ok(EditOutcome::Unchanged);
    }
    Ok(EditOutcome::Applied(CharacterPatch {
        ability_points: Some(profile.ability_points.saturating_add(amount)),
        ..Default::default()
    }))
}

/// Add skill points, e.g. from the game master.
pub fn grant_skill_points(profile: &CharacterProfile, amount: u32) -> EditResult {
    if amount == 0 {
        return Ok(EditOutcome::Unchanged);
    }
    Ok(EditOutcome::Applied(CharacterPatch {
        skillpoints: Some(profile.skillpoints.saturating_add(amount)),
        ..Default::default()
    }))
}

/// Raise the level by `by`.
pub fn raise_level(profile: &CharacterProfile, by: u32) -> EditResult {
    if by == 0 {
        return Ok(EditOutcome::Unchanged);
    }
    Ok(EditOutcome::Applied(CharacterPatch {
        level: Some(profile.level.saturating_add(by)),
        ..Default::default()
    }))
}

// ============================================================================
// Inventory
// ============================================================================

/// Append `item` to the inventory.
///
/// Under [`InventoryPolicy::ClassLimit`] a full inventory rejects the add.
pub fn add_item(
    profile: &CharacterProfile,
    item: &str,
    class: Option<&ClassDefinition>,
    config: &EngineConfig,
) -> EditResult {
    let item = item.trim();
    if item.is_empty() {
        return Ok(EditOutcome::Unchanged);
    }
    if config.inventory_policy == InventoryPolicy::ClassLimit {
        let limit = class
            .map(|c| c.inventory_limit_or(config.default_inventory_limit))
            .unwrap_or(config.default_inventory_limit);
        if profile.inventory.len() >= limit {
            return Err(EditRejection::InventoryFull { limit });
        }
    }

    let mut inventory = profile.inventory.clone();
    inventory.push(item.to_string());
    Ok(EditOutcome::Applied(CharacterPatch {
        inventory: Some(inventory),
        ..Default::default()
    }))
}

/// Remove the item at `index`. An index past the end changes nothing.
pub fn remove_item(profile: &CharacterProfile, index: usize) -> EditResult {
    if index >= profile.inventory.len() {
        return Ok(EditOutcome::Unchanged);
    }
    let mut inventory = profile.inventory.clone();
    inventory.remove(index);
    Ok(EditOutcome::Applied(CharacterPatch {
        inventory: Some(inventory),
        ..Default::default()
    }))
}

// ============================================================================
// Vitals
// ============================================================================

/// Apply damage (negative) or healing (positive). HP stays within `[0, hpMax]`.
pub fn change_hp(profile: &CharacterProfile, delta: i32) -> EditResult {
    let hp = profile.hp.saturating_add(delta).max(0).min(profile.hp_max);
    let patch = CharacterPatch {
        hp: (hp != profile.hp).then_some(hp),
        ..Default::default()
    };
    Ok(EditOutcome::from_patch(patch))
}

/// Heal to full.
pub fn restore_hp(profile: &CharacterProfile) -> EditResult {
    let patch = CharacterPatch {
        hp: (profile.hp != profile.hp_max).then_some(profile.hp_max),
        ..Default::default()
    };
    Ok(EditOutcome::from_patch(patch))
}

pub fn set_status(profile: &CharacterProfile, status: Status) -> EditResult {
    let patch = CharacterPatch {
        status: (profile.status != status).then_some(status),
        ..Default::default()
    };
    Ok(EditOutcome::from_patch(patch))
}

// ============================================================================
// Text fields
// ============================================================================

/// Rename the character. Surrounding whitespace is dropped.
pub fn rename(profile: &CharacterProfile, name: &str) -> EditResult {
    let name = name.trim();
    if name.is_empty() {
        return Err(EditRejection::EmptyName);
    }
    let patch = CharacterPatch {
        name: (profile.name != name).then(|| name.to_string()),
        ..Default::default()
    };
    Ok(EditOutcome::from_patch(patch))
}

pub fn set_note(profile: &CharacterProfile, note: &str) -> EditResult {
    let patch = CharacterPatch {
        note: (profile.note != note).then(|| note.to_string()),
        ..Default::default()
    };
    Ok(EditOutcome::from_patch(patch))
}

pub fn set_story(profile: &CharacterProfile, story: &str) -> EditResult {
    let patch = CharacterPatch {
        story: (profile.story != story).then(|| story.to_string()),
        ..Default::default()
    };
    Ok(EditOutcome::from_patch(patch))
}
