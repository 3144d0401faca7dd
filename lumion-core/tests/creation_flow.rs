//! Scenario tests for character creation.
//!
//! Questionnaire answers, class choice and starting kit selection feeding
//! the builder, then the first write to the store.
//! Run with: `cargo test -p lumion-core --test creation_flow`

use lumion_core::class_data::ClassLibrary;
use lumion_core::creation::CreationResult;
use lumion_core::inventory::{InventorySelections, SelectionRejected};
use lumion_core::store::{CharacterStore, MemoryStore};
use lumion_core::testing::{
    assert_vitals, guardian_class, locksmith_class, sample_classes, sample_creation,
    sample_questions,
};
use lumion_core::{BuilderError, CharacterBuilder, CharacterId, EngineConfig, OwnerId};
use std::collections::HashMap;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// TEST 1: Questionnaire to finished character
// =============================================================================

#[test]
fn test_questionnaire_to_character() {
    init_tracing();

    let creation = sample_creation();
    assert!(creation.recommends("locksmith"));

    let character = CharacterBuilder::new()
        .name("Mira")
        .class(locksmith_class())
        .creation(creation)
        .starting_kit(["Lockpicks", "Lantern", "Crowbar"])
        .build()
        .expect("Should build");

    // Stealth: -90 + 5 + 2
    assert_eq!(character.abilities.get("Stealth"), -83);
    assert_eq!(character.abilities.get("Lockpicking"), 10);
    assert_eq!(character.abilities.get("Charisma"), -10);
    assert_vitals(&character, 12, 12);
    assert_eq!(character.armor, 1);
    assert_eq!(character.inventory.len(), 3);
    assert_eq!(character.history, "past: I stole. home: On the road");
}

#[test]
fn test_unanswered_questions_are_skipped() {
    let chosen: HashMap<String, String> = [
        ("home".to_string(), "town".to_string()),
        ("past".to_string(), "pirate".to_string()),
    ]
    .into_iter()
    .collect();

    let creation = CreationResult::from_answers(&sample_questions(), &chosen);
    assert_eq!(creation.answers.len(), 1);
    assert_eq!(creation.answers[0].question_id, "home");
    assert!(creation.abilities.is_empty());
}

// =============================================================================
// TEST 2: Class visibility and kit selection
// =============================================================================

#[test]
fn test_hidden_class_needs_recommendation() {
    let classes = sample_classes();
    let creation = sample_creation();

    let visible: Vec<&str> = classes
        .visible_classes(&creation.classes)
        .into_iter()
        .map(|c| c.id.as_str())
        .collect();
    assert!(visible.contains(&"wanderer"));

    let visible: Vec<&str> = classes
        .visible_classes(&[])
        .into_iter()
        .map(|c| c.id.as_str())
        .collect();
    assert!(!visible.contains(&"wanderer"));
    assert!(visible.contains(&"guardian"));
}

#[test]
fn test_switching_class_keeps_each_selection() {
    let config = EngineConfig::default();
    let guardian = guardian_class();
    let locksmith = locksmith_class();
    let mut selections = InventorySelections::new();

    selections
        .toggle(&guardian, "Shield", config.default_inventory_limit)
        .expect("Should add");
    selections
        .toggle(&guardian, "Spear", config.default_inventory_limit)
        .expect("Should add");
    assert_eq!(
        selections.toggle(&guardian, "Horn", config.default_inventory_limit),
        Err(SelectionRejected::LimitReached { limit: 2 })
    );

    // The locksmith declares a limit of 3 and has its own budget.
    for item in ["Lockpicks", "Lantern", "Crowbar"] {
        selections
            .toggle(&locksmith, item, config.default_inventory_limit)
            .expect("Should add");
    }

    let character = CharacterBuilder::new()
        .name("Thorin")
        .starting_kit_from(&selections)
        .class(guardian)
        .build()
        .expect("Should build");
    assert_eq!(character.inventory, vec!["Shield", "Spear"]);
}

#[test]
fn test_builder_rejects_oversized_kit() {
    let result = CharacterBuilder::new()
        .name("Thorin")
        .class(guardian_class())
        .starting_kit(["Shield", "Spear", "Horn"])
        .build();
    assert_eq!(
        result,
        Err(BuilderError::StartingKitTooLarge { limit: 2, got: 3 })
    );
}

// =============================================================================
// TEST 3: First write
// =============================================================================

#[tokio::test]
async fn test_created_character_gets_next_id() {
    init_tracing();

    let store = MemoryStore::new();
    let owner = OwnerId::new("777");
    for name in ["Mira", "Thorin"] {
        let character = CharacterBuilder::new()
            .name(name)
            .class(guardian_class())
            .build()
            .expect("Should build");
        store.create(&owner, character).await.expect("Should store");
    }

    let listed = store.list(&owner).await.expect("Should list");
    let ids: Vec<Option<CharacterId>> = listed.iter().map(|c| c.id.clone()).collect();
    assert_eq!(
        ids,
        vec![Some(CharacterId::new("1")), Some(CharacterId::new("2"))]
    );
}

#[tokio::test]
async fn test_classes_loaded_from_content_folder() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();
    tokio::fs::create_dir_all(dir.join("classes"))
        .await
        .expect("Should create dir");
    tokio::fs::write(dir.join("classes.json"), r#"{"classes": ["guardian.json"]}"#)
        .await
        .expect("Should write manifest");
    tokio::fs::write(
        dir.join("classes").join("guardian.json"),
        r#"{
            "id": "guardian",
            "name": "Guardian",
            "hp": 20,
            "defence": 2,
            "abilities": [{"Constitution": 10}, {"Constitution": 5}],
            "inventory": [["Shield", "Spear"], "Horn"],
            "skills": [{"actions": [{"name": "Shield Bash"}], "Passive": []}]
        }"#,
    )
    .await
    .expect("Should write class");

    let classes = ClassLibrary::load(dir).await.expect("Should load");
    let guardian = classes.get("guardian").expect("Should have guardian").clone();
    assert_eq!(guardian.flat_inventory(), vec!["Shield", "Spear", "Horn"]);

    let character = CharacterBuilder::new()
        .name("Thorin")
        .class(guardian)
        .build()
        .expect("Should build");
    assert_vitals(&character, 35, 35);
    assert_eq!(character.computed_defense(), 2);
}
