//! Starting kit selection during class choice.
//!
//! Each class candidate keeps its own selection, so picking items under one
//! class never uses up another class's budget.

use crate::class_data::ClassDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why an item could not be added to a selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionRejected {
    #[error("At most {limit} item(s) can be taken for this class")]
    LimitReached { limit: usize },
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added,
    Removed,
}

/// Chosen starting items, per class id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventorySelections {
    by_class: BTreeMap<String, Vec<String>>,
}

impl InventorySelections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `item` for `class`.
    ///
    /// A chosen item is removed. An unchosen item is added unless the
    /// selection already holds the class's limit (or `default_limit` when
    /// the class declares none), in which case nothing changes.
    pub fn toggle(
        &mut self,
        class: &ClassDefinition,
        item: &str,
        default_limit: usize,
    ) -> Result<SelectionChange, SelectionRejected> {
        let limit = class.inventory_limit_or(default_limit);
        self.toggle_with_limit(&class.id, item, limit)
    }

    /// Toggle `item` for `class_id` against an explicit limit.
    pub fn toggle_with_limit(
        &mut self,
        class_id: &str,
        item: &str,
        limit: usize,
    ) -> Result<SelectionChange, SelectionRejected> {
        if let Some(chosen) = self.by_class.get_mut(class_id) {
            if let Some(pos) = chosen.iter().position(|i| i == item) {
                chosen.remove(pos);
                return Ok(SelectionChange::Removed);
            }
        }
        if self.selected(class_id).len() >= limit {
            return Err(SelectionRejected::LimitReached { limit });
        }
        self.by_class
            .entry(class_id.to_string())
            .or_default()
            .push(item.to_string());
        Ok(SelectionChange::Added)
    }

    /// Items chosen for `class_id`, in the order they were picked.
    pub fn selected(&self, class_id: &str) -> &[String] {
        self.by_class
            .get(class_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_selected(&self, class_id: &str, item: &str) -> bool {
        self.selected(class_id).iter().any(|i| i == item)
    }

    /// Drop every selection, e.g. once the character has been created.
    pub fn clear(&mut self) {
        self.by_class.clear();
    }
}
