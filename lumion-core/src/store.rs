//! Character persistence.
//!
//! [`CharacterStore`] is the seam to whatever holds characters. Two
//! implementations ship with the crate: [`MemoryStore`] for tests and
//! single-process tools, and [`JsonDirStore`], which keeps one pretty-printed
//! JSON file per character under `<root>/<owner>/<id>.json`.

use crate::character::{CharacterId, CharacterKey, CharacterProfile, OwnerId};
use crate::patch::CharacterPatch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Character not found: {0}")]
    NotFound(CharacterKey),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Picture shown in rosters for characters that never chose one.
pub const ROSTER_DEFAULT_PICTURE: &str = "profile_picture_00.jpg";

/// One line of the cross-owner character list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub owner_id: OwnerId,
    pub char_id: CharacterId,
    pub name: String,
    pub picture: String,
}

impl RosterEntry {
    fn from_profile(owner: &OwnerId, id: &CharacterId, profile: &CharacterProfile) -> Self {
        let name = if profile.name.trim().is_empty() {
            format!("char_{id}")
        } else {
            profile.name.clone()
        };
        let picture = if profile.picture.is_empty() {
            ROSTER_DEFAULT_PICTURE.to_string()
        } else {
            profile.picture.clone()
        };
        Self {
            owner_id: owner.clone(),
            char_id: id.clone(),
            name,
            picture,
        }
    }
}

/// Where characters live.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Store a new character for `owner`, assigning the next numeric id.
    /// Returns the stored profile with its id set.
    async fn create(
        &self,
        owner: &OwnerId,
        profile: CharacterProfile,
    ) -> Result<CharacterProfile, StoreError>;

    async fn get(&self, key: &CharacterKey) -> Result<Option<CharacterProfile>, StoreError>;

    /// Every character of `owner`, ordered by id.
    async fn list(&self, owner: &OwnerId) -> Result<Vec<CharacterProfile>, StoreError>;

    /// Merge `patch` into the stored character and return the result.
    async fn update(
        &self,
        key: &CharacterKey,
        patch: &CharacterPatch,
    ) -> Result<CharacterProfile, StoreError>;

    /// Remove a character. Returns whether it existed.
    async fn delete(&self, key: &CharacterKey) -> Result<bool, StoreError>;

    /// Every character of every owner, for the game master.
    async fn roster(&self) -> Result<Vec<RosterEntry>, StoreError>;
}

/// Next id for a collection: one past the largest numeric id, or 1.
pub fn next_character_id<'a>(existing: impl IntoIterator<Item = &'a CharacterId>) -> CharacterId {
    let max = existing
        .into_iter()
        .filter_map(CharacterId::numeric)
        .max()
        .unwrap_or(0);
    CharacterId::new(max.saturating_add(1).to_string())
}

/// Order ids numerically where possible, then lexically.
fn id_order(a: &CharacterId, b: &CharacterId) -> std::cmp::Ordering {
    match (a.numeric(), b.numeric()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store backed by a map behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    owners: RwLock<BTreeMap<OwnerId, BTreeMap<CharacterId, CharacterProfile>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn create(
        &self,
        owner: &OwnerId,
        mut profile: CharacterProfile,
    ) -> Result<CharacterProfile, StoreError> {
        let mut owners = self.owners.write().await;
        let characters = owners.entry(owner.clone()).or_default();
        let id = next_character_id(characters.keys());
        profile.id = Some(id.clone());
        characters.insert(id.clone(), profile.clone());
        tracing::info!(owner = %owner, character_id = %id, "Created character");
        Ok(profile)
    }

    async fn get(&self, key: &CharacterKey) -> Result<Option<CharacterProfile>, StoreError> {
        let owners = self.owners.read().await;
        Ok(owners
            .get(&key.owner)
            .and_then(|characters| characters.get(&key.character))
            .cloned())
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<CharacterProfile>, StoreError> {
        let owners = self.owners.read().await;
        let mut entries: Vec<(&CharacterId, &CharacterProfile)> = owners
            .get(owner)
            .map(|characters| characters.iter().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| id_order(a.0, b.0));
        Ok(entries.into_iter().map(|(_, p)| p.clone()).collect())
    }

    async fn update(
        &self,
        key: &CharacterKey,
        patch: &CharacterPatch,
    ) -> Result<CharacterProfile, StoreError> {
        let mut owners = self.owners.write().await;
        let profile = owners
            .get_mut(&key.owner)
            .and_then(|characters| characters.get_mut(&key.character))
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        patch.apply_to(profile);
        tracing::debug!(character = %key, fields = ?patch.fields(), "Updated character");
        Ok(profile.clone())
    }

    async fn delete(&self, key: &CharacterKey) -> Result<bool, StoreError> {
        let mut owners = self.owners.write().await;
        let removed = owners
            .get_mut(&key.owner)
            .and_then(|characters| characters.remove(&key.character))
            .is_some();
        if removed {
            tracing::info!(character = %key, "Deleted character");
        }
        Ok(removed)
    }

    async fn roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        let owners = self.owners.read().await;
        Ok(owners
            .iter()
            .flat_map(|(owner, characters)| {
                characters
                    .iter()
                    .map(move |(id, profile)| RosterEntry::from_profile(owner, id, profile))
            })
            .collect())
    }
}

// ============================================================================
// JSON directory store
// ============================================================================

/// Current file format version.
const STORE_VERSION: u32 = 1;

/// On-disk envelope for one character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCharacter {
    /// File format version.
    pub version: u32,

    /// When the file was last written.
    pub saved_at: DateTime<Utc>,

    /// Owner as given, since directory names are sanitized.
    pub owner: OwnerId,

    pub character: CharacterProfile,
}

impl SavedCharacter {
    pub fn new(owner: OwnerId, character: CharacterProfile) -> Self {
        Self {
            version: STORE_VERSION,
            saved_at: Utc::now(),
            owner,
            character,
        }
    }

    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != STORE_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: STORE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }
}

/// Store keeping one JSON file per character.
#[derive(Debug)]
pub struct JsonDirStore {
    root: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_dir(&self, owner: &OwnerId) -> PathBuf {
        self.root.join(sanitize(owner.as_str()))
    }

    fn character_path(&self, key: &CharacterKey) -> PathBuf {
        self.owner_dir(&key.owner)
            .join(format!("{}.json", sanitize(key.character.as_str())))
    }

    async fn load(&self, key: &CharacterKey) -> Result<Option<SavedCharacter>, StoreError> {
        let path = self.character_path(key);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        SavedCharacter::load_json(&path).await.map(Some)
    }

    /// Ids taken in one owner directory, read from the `<id>.json` file
    /// names. Files that fail to parse still hold their id.
    async fn stored_ids(&self, dir: &Path) -> Result<Vec<CharacterId>, StoreError> {
        let mut ids = Vec::new();
        if !fs::try_exists(dir).await? {
            return Ok(ids);
        }
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(CharacterId::new(stem));
                }
            }
        }
        Ok(ids)
    }

    /// Every saved character in one owner directory.
    async fn load_dir(&self, dir: &Path) -> Result<Vec<SavedCharacter>, StoreError> {
        let mut saved = Vec::new();
        if !fs::try_exists(dir).await? {
            return Ok(saved);
        }
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match SavedCharacter::load_json(&path).await {
                    Ok(character) => saved.push(character),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable character file");
                    }
                }
            }
        }
        Ok(saved)
    }
}

#[async_trait]
impl CharacterStore for JsonDirStore {
    async fn create(
        &self,
        owner: &OwnerId,
        mut profile: CharacterProfile,
    ) -> Result<CharacterProfile, StoreError> {
        let _guard = self.write_lock.lock().await;
        let dir = self.owner_dir(owner);
        fs::create_dir_all(&dir).await?;

        let taken = self.stored_ids(&dir).await?;
        let id = next_character_id(&taken);
        profile.id = Some(id.clone());

        let key = CharacterKey {
            owner: owner.clone(),
            character: id.clone(),
        };
        SavedCharacter::new(owner.clone(), profile.clone())
            .save_json(self.character_path(&key))
            .await?;
        tracing::info!(owner = %owner, character_id = %id, "Created character");
        Ok(profile)
    }

    async fn get(&self, key: &CharacterKey) -> Result<Option<CharacterProfile>, StoreError> {
        Ok(self.load(key).await?.map(|saved| saved.character))
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<CharacterProfile>, StoreError> {
        let mut characters: Vec<CharacterProfile> = self
            .load_dir(&self.owner_dir(owner))
            .await?
            .into_iter()
            .map(|saved| saved.character)
            .collect();
        characters.sort_by(|a, b| match (&a.id, &b.id) {
            (Some(x), Some(y)) => id_order(x, y),
            _ => a.name.cmp(&b.name),
        });
        Ok(characters)
    }

    async fn update(
        &self,
        key: &CharacterKey,
        patch: &CharacterPatch,
    ) -> Result<CharacterProfile, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut saved = self
            .load(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        patch.apply_to(&mut saved.character);
        saved.saved_at = Utc::now();
        saved.save_json(self.character_path(key)).await?;
        tracing::debug!(character = %key, fields = ?patch.fields(), "Updated character");
        Ok(saved.character)
    }

    async fn delete(&self, key: &CharacterKey) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.character_path(key);
        if !fs::try_exists(&path).await? {
            return Ok(false);
        }
        fs::remove_file(&path).await?;
        tracing::info!(character = %key, "Deleted character");
        Ok(true)
    }

    async fn roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        let mut roster = Vec::new();
        if !fs::try_exists(&self.root).await? {
            return Ok(roster);
        }
        let mut owners = fs::read_dir(&self.root).await?;
        while let Some(entry) = owners.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            for saved in self.load_dir(&entry.path()).await? {
                if let Some(id) = &saved.character.id {
                    roster.push(RosterEntry::from_profile(&saved.owner, id, &saved.character));
                }
            }
        }
        roster.sort_by(|a, b| {
            a.owner_id
                .cmp(&b.owner_id)
                .then_with(|| id_order(&a.char_id, &b.char_id))
        });
        Ok(roster)
    }
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn hero(name: &str) -> CharacterProfile {
        let mut profile = CharacterProfile::new(name, "guardian");
        profile.hp = 30;
        profile.hp_max = 30;
        profile
    }

    #[test]
    fn test_next_character_id() {
        let ids = [
            CharacterId::new("1"),
            CharacterId::new("7"),
            CharacterId::new("draft"),
        ];
        assert_eq!(next_character_id(&ids), CharacterId::new("8"));
        assert_eq!(next_character_id(std::iter::empty()), CharacterId::new("1"));
    }

    #[tokio::test]
    async fn test_memory_store_assigns_ids_per_owner() {
        let store = MemoryStore::new();
        let anya = OwnerId::new("777");
        let boris = OwnerId::new("888");

        let first = store.create(&anya, hero("Mira")).await.expect("Should create");
        let second = store.create(&anya, hero("Thorin")).await.expect("Should create");
        let other = store.create(&boris, hero("Ilse")).await.expect("Should create");

        assert_eq!(first.id, Some(CharacterId::new("1")));
        assert_eq!(second.id, Some(CharacterId::new("2")));
        assert_eq!(other.id, Some(CharacterId::new("1")));

        let key = CharacterKey::new("777", "1");
        assert!(store.delete(&key).await.expect("Should delete"));
        let third = store.create(&anya, hero("Brann")).await.expect("Should create");
        assert_eq!(third.id, Some(CharacterId::new("3")));
    }

    #[tokio::test]
    async fn test_memory_store_update_merges_patch() {
        let store = MemoryStore::new();
        let owner = OwnerId::new("777");
        let created = store.create(&owner, hero("Mira")).await.expect("Should create");
        let key = created.key(&owner).expect("Should have key");

        let patch = CharacterPatch {
            hp: Some(12),
            ..Default::default()
        };
        let updated = store.update(&key, &patch).await.expect("Should update");
        assert_eq!(updated.hp, 12);
        assert_eq!(updated.name, "Mira");

        let missing = CharacterKey::new("777", "99");
        let result = store.update(&missing, &patch).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_roster_defaults() {
        let store = MemoryStore::new();
        let mut nameless = hero("");
        nameless.picture = String::new();
        store
            .create(&OwnerId::new("777"), nameless)
            .await
            .expect("Should create");

        let roster = store.roster().await.expect("Should list");
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "char_1");
        assert_eq!(roster[0].picture, ROSTER_DEFAULT_PICTURE);
    }

    #[tokio::test]
    async fn test_json_store_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonDirStore::new(temp_dir.path());
        let owner = OwnerId::new("777");

        let created = store.create(&owner, hero("Mira")).await.expect("Should create");
        let key = created.key(&owner).expect("Should have key");
        assert!(temp_dir.path().join("777").join("1.json").exists());

        let mut patch = CharacterPatch::new();
        patch.set_ability("Stealth", 4);
        store.update(&key, &patch).await.expect("Should update");

        let loaded = store
            .get(&key)
            .await
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(loaded.abilities.get("Stealth"), 4);
        assert_eq!(loaded.created_at, created.created_at);

        store.create(&owner, hero("Thorin")).await.expect("Should create");
        let listed = store.list(&owner).await.expect("Should list");
        let names: Vec<&str> = listed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Mira", "Thorin"]);
    }

    #[tokio::test]
    async fn test_json_store_version_mismatch() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("old.json");

        let mut saved = SavedCharacter::new(OwnerId::new("777"), hero("Mira"));
        saved.version = 99;
        saved.save_json(&path).await.expect("Should save");

        let result = SavedCharacter::load_json(&path).await;
        assert!(matches!(
            result,
            Err(StoreError::VersionMismatch { expected: 1, found: 99 })
        ));
    }

    #[tokio::test]
    async fn test_json_store_never_reuses_unreadable_ids() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonDirStore::new(temp_dir.path());
        let owner = OwnerId::new("777");

        store.create(&owner, hero("Mira")).await.expect("Should create");
        store.create(&owner, hero("Thorin")).await.expect("Should create");

        // A file written by a newer release and a truncated one.
        let newer = temp_dir.path().join("777").join("2.json");
        let mut saved = SavedCharacter::load_json(&newer).await.expect("Should load");
        saved.version = STORE_VERSION + 1;
        saved.save_json(&newer).await.expect("Should save");
        std::fs::write(temp_dir.path().join("777").join("5.json"), "{ not json")
            .expect("Write should succeed");

        let listed = store.list(&owner).await.expect("Should list");
        assert_eq!(listed.len(), 1);

        let third = store.create(&owner, hero("Brann")).await.expect("Should create");
        assert_eq!(third.id, Some(CharacterId::new("6")));

        let untouched = SavedCharacter::load_json(&newer).await;
        assert!(matches!(
            untouched,
            Err(StoreError::VersionMismatch { expected: 1, found: 2 })
        ));
        let corrupt = std::fs::read_to_string(temp_dir.path().join("777").join("5.json"))
            .expect("Should read");
        assert_eq!(corrupt, "{ not json");
    }

    #[tokio::test]
    async fn test_json_store_missing_entries() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonDirStore::new(temp_dir.path().join("characters"));
        let key = CharacterKey::new("777", "1");

        assert!(store.get(&key).await.expect("Should query").is_none());
        assert!(!store.delete(&key).await.expect("Should query"));
        assert!(store.list(&key.owner).await.expect("Should list").is_empty());
        assert!(store.roster().await.expect("Should list").is_empty());
    }
}
