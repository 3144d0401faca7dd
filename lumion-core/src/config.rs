//! Engine configuration.
//!
//! Defaults mirror the values the companion app has always used for new
//! characters. A deployment may override them from a JSON file.

use crate::abilities::MANUAL_ABILITY_BOUND;
use crate::class_data::DEFAULT_INVENTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether items added after creation respect the class inventory limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryPolicy {
    /// The limit applies to the starting kit only.
    #[default]
    Unbounded,
    /// Live characters are held to the class limit as well.
    ClassLimit,
}

/// Tunables for character building and editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Starting kit limit for classes that do not declare one.
    pub default_inventory_limit: usize,

    /// Ability points granted to a new character.
    pub starting_ability_points: u32,

    /// Skill points granted to a new character.
    pub starting_skill_points: u32,

    /// Avatar assigned to a new character.
    pub default_picture: String,

    /// Name used when the chosen name is blank.
    pub fallback_name: String,

    /// Armor assumed for records that never stored one.
    pub fallback_armor: i32,

    /// Bound for hand-adjusted ability values, applied on both sides of zero.
    pub ability_bound: u32,

    /// Limit policy for items added after creation.
    pub inventory_policy: InventoryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_inventory_limit: DEFAULT_INVENTORY_LIMIT,
            starting_ability_points: 10,
            starting_skill_points: 3,
            default_picture: "profile_picture.webp".to_string(),
            fallback_name: "Nameless Hero".to_string(),
            fallback_armor: 1,
            ability_bound: MANUAL_ABILITY_BOUND.unsigned_abs(),
            inventory_policy: InventoryPolicy::Unbounded,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file. Missing fields keep their defaults; a negative
    /// `ability_bound` is rejected as a JSON error.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_default_inventory_limit(mut self, limit: usize) -> Self {
        self.default_inventory_limit = limit;
        self
    }

    pub fn with_starting_points(mut self, ability_points: u32, skill_points: u32) -> Self {
        self.starting_ability_points = ability_points;
        self.starting_skill_points = skill_points;
        self
    }

    pub fn with_default_picture(mut self, picture: impl Into<String>) -> Self {
        self.default_picture = picture.into();
        self
    }

    pub fn with_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = name.into();
        self
    }

    pub fn with_ability_bound(mut self, bound: i32) -> Self {
        self.ability_bound = bound.unsigned_abs();
        self
    }

    pub fn with_inventory_policy(mut self, policy: InventoryPolicy) -> Self {
        self.inventory_policy = policy;
        self
    }

    /// Clamp a hand-adjusted ability value to the configured bound.
    pub fn clamp_ability(&self, value: i32) -> i32 {
        let bound = i32::try_from(self.ability_bound).unwrap_or(i32::MAX);
        value.clamp(-bound, bound)
    }
}
