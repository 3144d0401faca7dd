//! Testing utilities for the character engine.
//!
//! This module provides tools for integration testing:
//! - Sample classes and questionnaire content
//! - `TestHarness` for create-then-edit scenarios over a `MemoryStore`
//! - Assertion helpers for vitals

use crate::character::{CharacterProfile, OwnerId};
use crate::character_builder::{BuilderError, CharacterBuilder};
use crate::class_data::{ClassDefinition, ClassLibrary};
use crate::config::EngineConfig;
use crate::creation::{CreationResult, OptionEffects, Question, QuestionOption};
use crate::session::{CharacterSession, SessionError};
use crate::skills::{SkillCategory, SkillDefinition};
use crate::store::MemoryStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Sturdy front-line class: 20 base HP, defense 2, two-item kit.
pub fn guardian_class() -> ClassDefinition {
    ClassDefinition::new("guardian", "Guardian")
        .with_hp(20)
        .with_defense(2)
        .with_bonus("Constitution", 10)
        .with_bonus("Strength", 5)
        .with_bonus("Constitution", 5)
        .with_items(["Shield", "Spear", "Horn"])
        .with_skill(
            SkillCategory::Actions,
            SkillDefinition::new("shield_bash", "Shield Bash", 1).with_effect("Knock a foe back"),
        )
        .with_skill(
            SkillCategory::Actions,
            SkillDefinition::new("whirlwind", "Whirlwind", 3).with_needs(["shield_bash"]),
        )
        .with_skill(
            SkillCategory::Passive,
            SkillDefinition::new("tough", "Tough", 1),
        )
}

/// Class whose bonuses match the worked aggregation example.
pub fn locksmith_class() -> ClassDefinition {
    ClassDefinition::new("locksmith", "Locksmith")
        .with_hp(12)
        .with_defense(1)
        .with_bonus("Stealth", 5)
        .with_bonus("Charisma", -10)
        .with_bonus("Stealth", 2)
        .with_items(["Lockpicks", "Lantern", "Crowbar"])
        .with_inventory_limit(3)
}

/// Hidden class offered only when the questionnaire recommends it.
pub fn wanderer_class() -> ClassDefinition {
    ClassDefinition::new("wanderer", "Wanderer")
        .with_hp(15)
        .hidden()
}

/// Library holding every sample class.
pub fn sample_classes() -> ClassLibrary {
    ClassLibrary::new([guardian_class(), locksmith_class(), wanderer_class()])
}

fn option(id: &str, text: &str, effects: OptionEffects) -> QuestionOption {
    QuestionOption {
        id: id.to_string(),
        text: text.to_string(),
        effects,
    }
}

/// A two-question questionnaire.
pub fn sample_questions() -> Vec<Question> {
    let mut thief = OptionEffects::default();
    thief.abilities.set("Stealth", -90);
    thief.abilities.set("Lockpicking", 10);
    thief.tags.push("outlaw".to_string());
    thief.classes.push("locksmith".to_string());
    thief.currency = 5;

    let mut soldier = OptionEffects::default();
    soldier.abilities.set("Strength", 3);
    soldier.classes.push("guardian".to_string());
    soldier.currency = 10;

    let mut road = OptionEffects::default();
    road.classes.push("wanderer".to_string());
    road.tags.push("outlaw".to_string());

    vec![
        Question {
            id: "past".to_string(),
            text: "What did you do before?".to_string(),
            options: vec![
                option("thief", "I stole", thief),
                option("soldier", "I served", soldier),
            ],
        },
        Question {
            id: "home".to_string(),
            text: "Where do you sleep?".to_string(),
            options: vec![
                option("road", "On the road", road),
                option("town", "In town", OptionEffects::default()),
            ],
        },
    ]
}

/// Result of answering the sample questionnaire as a thief on the road.
///
/// Abilities: Stealth -90, Lockpicking 10.
pub fn sample_creation() -> CreationResult {
    let chosen: HashMap<String, String> = [
        ("past".to_string(), "thief".to_string()),
        ("home".to_string(), "road".to_string()),
    ]
    .into_iter()
    .collect();
    CreationResult::from_answers(&sample_questions(), &chosen)
}

/// A built locksmith named Mira, not yet stored.
pub fn sample_character() -> Result<CharacterProfile, BuilderError> {
    CharacterBuilder::new()
        .name("Mira")
        .class(locksmith_class())
        .creation(sample_creation())
        .starting_kit(["Lockpicks", "Lantern"])
        .build()
}

/// Scripted create-then-edit scenarios over an in-memory store.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub classes: ClassLibrary,
    pub config: EngineConfig,
    pub owner: OwnerId,
}

impl TestHarness {
    /// Create a harness with the sample classes and default configuration.
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            classes: sample_classes(),
            config: EngineConfig::default(),
            owner: OwnerId::new("777"),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a character of `class_id` and store it.
    ///
    /// Unknown class ids still build, without class contributions.
    pub async fn create(
        &self,
        name: &str,
        class_id: &str,
        creation: CreationResult,
        kit: &[&str],
    ) -> Result<CharacterSession<MemoryStore>, HarnessError> {
        let class = self.classes.get(class_id).cloned();
        let builder = CharacterBuilder::new()
            .config(self.config.clone())
            .name(name)
            .creation(creation)
            .starting_kit(kit.iter().copied());
        let builder = match &class {
            Some(class) => builder.class(class.clone()),
            None => builder.class_id(class_id),
        };
        let profile = builder.build()?;
        let session = CharacterSession::create(
            self.store.clone(),
            &self.owner,
            profile,
            class,
            self.config.clone(),
        )
        .await?;
        Ok(session)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from harness setup.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Build error: {0}")]
    Build(#[from] BuilderError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Assert current and maximum HP.
pub fn assert_vitals(profile: &CharacterProfile, hp: i32, hp_max: i32) {
    assert_eq!(
        (profile.hp, profile.hp_max),
        (hp, hp_max),
        "Expected HP {hp}/{hp_max}, got {}/{}",
        profile.hp,
        profile.hp_max
    );
}
