//! CharacterSession - editing one stored character.
//!
//! A session holds the character as the user sees it, runs edit operations
//! against it, shows their result immediately and writes the delta to the
//! store. A refused write rolls the local view back.

use crate::cache::CharacterCache;
use crate::character::{CharacterKey, CharacterProfile, OwnerId};
use crate::class_data::{ClassCatalog, ClassDefinition};
use crate::config::EngineConfig;
use crate::edits::{self, EditOutcome, EditRejection, EditResult};
use crate::patch::CharacterPatch;
use crate::pending::{LocalCharacter, PendingError};
use crate::store::{CharacterStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors from CharacterSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Edit rejected: {0}")]
    Rejected(#[from] EditRejection),

    #[error("Pending edit error: {0}")]
    Pending(#[from] PendingError),

    #[error("Character not found: {0}")]
    NotFound(CharacterKey),

    #[error("Character has no id yet")]
    Unsaved,

    #[error("Class {class_id} has no skill named {skill}")]
    UnknownSkill { class_id: String, skill: String },
}

/// A live editing session for one character.
pub struct CharacterSession<S: CharacterStore> {
    store: Arc<S>,
    key: CharacterKey,
    local: LocalCharacter,
    class: Option<ClassDefinition>,
    config: EngineConfig,
    cache: Option<Arc<Mutex<CharacterCache>>>,
}

impl<S: CharacterStore> CharacterSession<S> {
    /// Open a session on a stored character.
    pub async fn open(
        store: Arc<S>,
        key: CharacterKey,
        classes: &dyn ClassCatalog,
        config: EngineConfig,
    ) -> Result<Self, SessionError> {
        let profile = store
            .get(&key)
            .await?
            .ok_or_else(|| SessionError::NotFound(key.clone()))?;
        let class = classes.class(&profile.class).await;
        Ok(Self::from_profile(store, key, profile, class, config))
    }

    /// Store a freshly built character and open a session on it.
    pub async fn create(
        store: Arc<S>,
        owner: &OwnerId,
        profile: CharacterProfile,
        class: Option<ClassDefinition>,
        config: EngineConfig,
    ) -> Result<Self, SessionError> {
        let stored = store.create(owner, profile).await?;
        let key = stored.key(owner).ok_or(SessionError::Unsaved)?;
        Ok(Self::from_profile(store, key, stored, class, config))
    }

    fn from_profile(
        store: Arc<S>,
        key: CharacterKey,
        profile: CharacterProfile,
        class: Option<ClassDefinition>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            key,
            local: LocalCharacter::new(profile),
            class,
            config,
            cache: None,
        }
    }

    /// Keep `cache` in step with writes made through this session.
    pub fn with_cache(mut self, cache: Arc<Mutex<CharacterCache>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn key(&self) -> &CharacterKey {
        &self.key
    }

    /// The character including edits still on their way to the store.
    pub fn profile(&self) -> &CharacterProfile {
        self.local.profile()
    }

    pub fn class(&self) -> Option<&ClassDefinition> {
        self.class.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reload the character from the store, dropping the cached copy.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        let profile = self
            .store
            .get(&self.key)
            .await?
            .ok_or_else(|| SessionError::NotFound(self.key.clone()))?;
        self.local.refresh(profile);
        self.invalidate_cache().await;
        Ok(())
    }

    /// Run an edit against the current view and persist its patch.
    pub async fn apply<F>(&mut self, edit: F) -> Result<EditOutcome, SessionError>
    where
        F: FnOnce(&CharacterProfile, Option<&ClassDefinition>, &EngineConfig) -> EditResult,
    {
        let outcome = edit(self.local.profile(), self.class.as_ref(), &self.config)?;
        if let EditOutcome::Applied(patch) = &outcome {
            self.submit(patch.clone()).await?;
        }
        Ok(outcome)
    }

    /// Show `patch` locally, write it, then confirm or roll back.
    pub async fn submit(&mut self, patch: CharacterPatch) -> Result<(), SessionError> {
        if patch.is_empty() {
            return Ok(());
        }
        let pending = self.local.apply_locally(patch.clone());
        match self.store.update(&self.key, &patch).await {
            Ok(stored) => {
                self.local.confirm(pending)?;
                self.local.refresh(stored);
                self.invalidate_cache().await;
                Ok(())
            }
            Err(e) => {
                self.local.reject(pending, &e.to_string())?;
                Err(e.into())
            }
        }
    }

    /// Delete the character. The session should be dropped afterwards.
    pub async fn delete(self) -> Result<bool, SessionError> {
        let removed = self.store.delete(&self.key).await?;
        if let Some(cache) = &self.cache {
            cache.lock().await.invalidate(&self.key);
        }
        Ok(removed)
    }

    async fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().await.invalidate(&self.key);
        }
    }

    // ========================================================================
    // Common edits
    // ========================================================================

    pub async fn adjust_ability(
        &mut self,
        ability: &str,
        delta: i32,
    ) -> Result<EditOutcome, SessionError> {
        self.apply(|profile, class, config| {
            edits::adjust_ability(profile, ability, delta, class, config)
        })
        .await
    }

    /// Learn a skill of the character's class by name.
    pub async fn learn_skill(&mut self, name: &str) -> Result<EditOutcome, SessionError> {
        let (category, skill) = self
            .class
            .as_ref()
            .and_then(|class| class.find_skill(name))
            .map(|(category, skill)| (category, skill.clone()))
            .ok_or_else(|| SessionError::UnknownSkill {
                class_id: self.local.profile().class.clone(),
                skill: name.to_string(),
            })?;
        self.apply(|profile, _, _| edits::learn_skill(profile, category, &skill))
            .await
    }

    pub async fn add_item(&mut self, item: &str) -> Result<EditOutcome, SessionError> {
        self.apply(|profile, class, config| edits::add_item(profile, item, class, config))
            .await
    }

    pub async fn remove_item(&mut self, index: usize) -> Result<EditOutcome, SessionError> {
        self.apply(|profile, _, _| edits::remove_item(profile, index))
            .await
    }

    pub async fn change_hp(&mut self, delta: i32) -> Result<EditOutcome, SessionError> {
        self.apply(|profile, _, _| edits::change_hp(profile, delta))
            .await
    }

    pub async fn set_note(&mut self, note: &str) -> Result<EditOutcome, SessionError> {
        self.apply(|profile, _, _| edits::set_note(profile, note))
            .await
    }
}

/// Load a character, preferring the cached copy.
pub async fn load_cached<S: CharacterStore>(
    store: &S,
    cache: &Mutex<CharacterCache>,
    key: &CharacterKey,
) -> Result<Option<CharacterProfile>, StoreError> {
    if let Some(profile) = cache.lock().await.get(key) {
        return Ok(Some(profile.clone()));
    }
    let loaded = store.get(key).await?;
    if let Some(profile) = &loaded {
        cache.lock().await.insert(key.clone(), profile.clone());
    }
    Ok(loaded)
}
