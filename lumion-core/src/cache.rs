//! Caller-owned caches.
//!
//! Nothing is cached globally. Whoever writes a character through the store
//! is expected to invalidate the same key here.

use crate::character::{CharacterKey, CharacterProfile, OwnerId};
use std::collections::HashMap;

/// Loaded character profiles keyed by owner and id.
#[derive(Debug, Default)]
pub struct CharacterCache {
    entries: HashMap<CharacterKey, CharacterProfile>,
}

impl CharacterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CharacterKey) -> Option<&CharacterProfile> {
        let hit = self.entries.get(key);
        if hit.is_some() {
            tracing::debug!(character = %key, "Character cache hit");
        }
        hit
    }

    pub fn insert(&mut self, key: CharacterKey, profile: CharacterProfile) {
        self.entries.insert(key, profile);
    }

    /// Drop the cached copy of `key`. Returns whether one was held.
    pub fn invalidate(&mut self, key: &CharacterKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every cached character of `owner`.
    pub fn invalidate_owner(&mut self, owner: &OwnerId) {
        self.entries.retain(|key, _| &key.owner != owner);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Display names of players, e.g. for master-room rosters.
#[derive(Debug, Default)]
pub struct DisplayNameCache {
    names: HashMap<OwnerId, String>,
}

impl DisplayNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &OwnerId) -> Option<&str> {
        self.names.get(owner).map(String::as_str)
    }

    pub fn insert(&mut self, owner: OwnerId, name: impl Into<String>) {
        self.names.insert(owner, name.into());
    }

    /// Name for `owner`, falling back to the raw id.
    pub fn label<'a>(&'a self, owner: &'a OwnerId) -> &'a str {
        self.get(owner).unwrap_or_else(|| owner.as_str())
    }

    pub fn invalidate(&mut self, owner: &OwnerId) -> bool {
        self.names.remove(owner).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_single_key() {
        let mut cache = CharacterCache::new();
        let first = CharacterKey::new("777", "1");
        let second = CharacterKey::new("777", "2");
        cache.insert(first.clone(), CharacterProfile::new("Mira", "locksmith"));
        cache.insert(second.clone(), CharacterProfile::new("Thorin", "guardian"));

        assert!(cache.invalidate(&first));
        assert!(!cache.invalidate(&first));
        assert!(cache.get(&first).is_none());
        assert_eq!(cache.get(&second).map(|p| p.name.as_str()), Some("Thorin"));
    }

    #[test]
    fn test_invalidate_owner() {
        let mut cache = CharacterCache::new();
        cache.insert(CharacterKey::new("777", "1"), CharacterProfile::new("A", "x"));
        cache.insert(CharacterKey::new("777", "2"), CharacterProfile::new("B", "x"));
        cache.insert(CharacterKey::new("888", "1"), CharacterProfile::new("C", "x"));

        cache.invalidate_owner(&OwnerId::new("777"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_display_name_label() {
        let mut names = DisplayNameCache::new();
        let owner = OwnerId::new("777");
        assert_eq!(names.label(&owner), "777");

        names.insert(owner.clone(), "Anya");
        assert_eq!(names.label(&owner), "Anya");
        assert!(names.invalidate(&owner));
        assert_eq!(names.get(&owner), None);
    }
}
