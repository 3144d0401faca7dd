//! Character builder for the end of character creation.
//!
//! Turns the questionnaire result, the chosen class and the chosen starting
//! kit into a level 1 [`CharacterProfile`] ready to hand to the store.

use crate::abilities::aggregate;
use crate::character::CharacterProfile;
use crate::class_data::ClassDefinition;
use crate::config::EngineConfig;
use crate::creation::CreationResult;
use crate::derive::max_hit_points;
use crate::history::compose_history;
use crate::inventory::InventorySelections;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error from character building.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("Class selection is required")]
    MissingClass,

    #[error("Starting kit allows {limit} item(s), got {got}")]
    StartingKitTooLarge { limit: usize, got: usize },
}

#[derive(Debug, Clone)]
enum StartingKit {
    Items(Vec<String>),
    Selections(InventorySelections),
}

impl Default for StartingKit {
    fn default() -> Self {
        StartingKit::Items(Vec::new())
    }
}

/// Builder for new characters.
#[derive(Debug, Clone, Default)]
pub struct CharacterBuilder {
    name: Option<String>,
    class_id: Option<String>,
    class: Option<ClassDefinition>,
    creation: CreationResult,
    starting_kit: StartingKit,
    picture: Option<String>,
    created_at: Option<DateTime<Utc>>,
    config: EngineConfig,
}

impl CharacterBuilder {
    /// Create a new character builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` for starting points, limits and fallbacks.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the character's name. Blank names fall back to the configured one.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the chosen class together with its definition.
    pub fn class(mut self, class: ClassDefinition) -> Self {
        self.class_id = Some(class.id.clone());
        self.class = Some(class);
        self
    }

    /// Set the chosen class id when its definition could not be loaded.
    ///
    /// The character is still built; class contributions count as zero.
    pub fn class_id(mut self, class_id: impl Into<String>) -> Self {
        self.class_id = Some(class_id.into());
        self.class = None;
        self
    }

    /// Set the questionnaire result.
    pub fn creation(mut self, creation: CreationResult) -> Self {
        self.creation = creation;
        self
    }

    /// Set the starting items directly.
    pub fn starting_kit<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.starting_kit = StartingKit::Items(items.into_iter().map(Into::into).collect());
        self
    }

    /// Take the starting items chosen for the final class from `selections`.
    pub fn starting_kit_from(mut self, selections: &InventorySelections) -> Self {
        self.starting_kit = StartingKit::Selections(selections.clone());
        self
    }

    /// Set the avatar file name.
    pub fn picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    /// Pin the creation timestamp instead of using the current time.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Build the character.
    ///
    /// Abilities are the questionnaire scores plus the summed class bonuses.
    /// HP starts full at class base plus Constitution. Armor stores the class
    /// base only.
    pub fn build(self) -> Result<CharacterProfile, BuilderError> {
        let class_id = self.class_id.ok_or(BuilderError::MissingClass)?;
        let class = self.class.as_ref();
        let config = &self.config;

        if class.is_none() {
            tracing::warn!(class_id = %class_id, "Building character without class metadata");
        }

        let limit = class
            .map(|c| c.inventory_limit_or(config.default_inventory_limit))
            .unwrap_or(config.default_inventory_limit);
        let requested = match self.starting_kit {
            StartingKit::Items(items) => items,
            StartingKit::Selections(selections) => selections.selected(&class_id).to_vec(),
        };
        let mut inventory: Vec<String> = Vec::with_capacity(requested.len());
        for item in requested {
            if !inventory.contains(&item) {
                inventory.push(item);
            }
        }
        if inventory.len() > limit {
            return Err(BuilderError::StartingKitTooLarge {
                limit,
                got: inventory.len(),
            });
        }

        let abilities = match class {
            Some(class) => aggregate(&self.creation.abilities, &class.abilities),
            None => self.creation.abilities.clone(),
        };
        let hp_max = max_hit_points(class.and_then(|c| c.hp), &abilities);
        let armor = class
            .and_then(|c| c.defense)
            .unwrap_or(config.fallback_armor);

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| config.fallback_name.clone());

        let mut character = CharacterProfile::new(name, class_id);
        if let Some(created_at) = self.created_at {
            character.created_at = created_at;
        }
        character.hp_max = hp_max;
        character.hp = hp_max;
        character.armor = armor;
        character.ability_points = config.starting_ability_points;
        character.skillpoints = config.starting_skill_points;
        character.abilities = abilities;
        character.inventory = inventory;
        character.history = compose_history(&self.creation.answers);
        character.picture = self
            .picture
            .unwrap_or_else(|| config.default_picture.clone());

        tracing::debug!(
            class_id = %character.class,
            hp_max = character.hp_max,
            items = character.inventory.len(),
            "Built character"
        );

        Ok(character)
    }
}
