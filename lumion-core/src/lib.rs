//! Character build engine for the Lumion tabletop companion.
//!
//! This crate provides:
//! - Character creation from questionnaire answers and a chosen class
//! - Derived stats (max HP, defense) and their recomputation on edits
//! - Edit operations that produce minimal patches
//! - Class and ability catalogs loaded from JSON content
//! - Character persistence with optimistic local edits
//!
//! # Quick Start
//!
//! ```ignore
//! use lumion_core::{CharacterBuilder, CharacterSession, ClassLibrary, EngineConfig, MemoryStore, OwnerId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let classes = ClassLibrary::load("content/classes").await?;
//!     let guardian = classes.get("guardian").cloned();
//!
//!     let character = CharacterBuilder::new()
//!         .name("Thorin")
//!         .class(guardian.clone().ok_or("unknown class")?)
//!         .starting_kit(["Shield", "Spear"])
//!         .build()?;
//!
//!     let store = Arc::new(MemoryStore::new());
//!     let mut session = CharacterSession::create(
//!         store,
//!         &OwnerId::new("777"),
//!         character,
//!         guardian,
//!         EngineConfig::default(),
//!     )
//!     .await?;
//!
//!     session.adjust_ability("Constitution", 1).await?;
//!     println!("HP {}/{}", session.profile().hp, session.profile().hp_max);
//!     Ok(())
//! }
//! ```

pub mod abilities;
pub mod cache;
pub mod character;
pub mod character_builder;
pub mod class_data;
pub mod config;
pub mod creation;
pub mod derive;
pub mod edits;
pub mod history;
pub mod inventory;
pub mod normalize;
pub mod patch;
pub mod pending;
pub mod session;
pub mod skills;
pub mod store;
pub mod testing;

// Re-export for convenience
pub use abilities::{aggregate, AbilityCatalog, AbilityLibrary, AbilityMeta, AbilityScores};
pub use cache::{CharacterCache, DisplayNameCache};
pub use character::{CharacterId, CharacterKey, CharacterProfile, OwnerId, Status};
pub use character_builder::{BuilderError, CharacterBuilder};
pub use class_data::{ClassCatalog, ClassDefinition, ClassLibrary};
pub use config::{EngineConfig, InventoryPolicy};
pub use creation::{Answer, CreationResult};
pub use derive::{derived_stats, DerivedStats};
pub use edits::{EditOutcome, EditRejection};
pub use history::compose_history;
pub use inventory::{InventorySelections, SelectionRejected};
pub use normalize::CharacterRecord;
pub use patch::CharacterPatch;
pub use pending::{LocalCharacter, PendingId};
pub use session::{CharacterSession, SessionError};
pub use skills::{LearnedSkills, SkillCategory, SkillDefinition};
pub use store::{CharacterStore, JsonDirStore, MemoryStore, RosterEntry, StoreError};
