//! Optimistic local edits.
//!
//! An edit is shown immediately, then confirmed or rolled back once the store
//! answers. The local view is always the last confirmed profile with every
//! still-pending patch applied in order, so rolling back one edit never
//! disturbs a later edit to a different field.

use crate::character::CharacterProfile;
use crate::patch::CharacterPatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Handle for an edit that has not been confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingId(Uuid);

impl PendingId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PendingError {
    #[error("No pending edit with id {0}")]
    UnknownPending(PendingId),
}

/// A character as the local user currently sees it.
#[derive(Debug, Clone)]
pub struct LocalCharacter {
    confirmed: CharacterProfile,
    view: CharacterProfile,
    pending: Vec<(PendingId, CharacterPatch)>,
}

impl LocalCharacter {
    pub fn new(profile: CharacterProfile) -> Self {
        Self {
            view: profile.clone(),
            confirmed: profile,
            pending: Vec::new(),
        }
    }

    /// The profile including unconfirmed edits.
    pub fn profile(&self) -> &CharacterProfile {
        &self.view
    }

    /// The profile as last acknowledged by the store.
    pub fn confirmed(&self) -> &CharacterProfile {
        &self.confirmed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Show `patch` right away and remember it until the store answers.
    pub fn apply_locally(&mut self, patch: CharacterPatch) -> PendingId {
        let id = PendingId::new();
        patch.apply_to(&mut self.view);
        tracing::debug!(pending = %id, fields = ?patch.fields(), "Applied edit locally");
        self.pending.push((id, patch));
        id
    }

    /// The store accepted the edit.
    pub fn confirm(&mut self, id: PendingId) -> Result<(), PendingError> {
        let patch = self.take(id)?;
        patch.apply_to(&mut self.confirmed);
        Ok(())
    }

    /// The store refused the edit. Fields it touched go back to what the
    /// store holds, with any later pending edits reapplied on top.
    pub fn reject(&mut self, id: PendingId, reason: &str) -> Result<(), PendingError> {
        let patch = self.take(id)?;
        tracing::warn!(pending = %id, fields = ?patch.fields(), reason, "Rolled back local edit");
        self.rebuild_view();
        Ok(())
    }

    /// Replace the confirmed profile with a fresh copy from the store.
    pub fn refresh(&mut self, profile: CharacterProfile) {
        self.confirmed = profile;
        self.rebuild_view();
    }

    fn take(&mut self, id: PendingId) -> Result<CharacterPatch, PendingError> {
        let pos = self
            .pending
            .iter()
            .position(|(pending, _)| *pending == id)
            .ok_or(PendingError::UnknownPending(id))?;
        Ok(self.pending.remove(pos).1)
    }

    fn rebuild_view(&mut self) {
        let mut view = self.confirmed.clone();
        for (_, patch) in &self.pending {
            patch.apply_to(&mut view);
        }
        self.view = view;
    }
}
