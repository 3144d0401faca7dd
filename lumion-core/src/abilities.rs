//! Ability scores and ability display metadata.
//!
//! Abilities are open-ended: any string key is a valid ability, and a key
//! that is absent reads as 0. Class bonuses arrive as a list of single-key
//! fragments which are summed into the creation accumulator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Key of the ability that feeds maximum hit points.
pub const CONSTITUTION: &str = "Constitution";

/// Key of the ability that feeds computed defense.
pub const DEXTERITY: &str = "Dexterity";

/// Bound applied when a person adjusts an ability by hand.
pub const MANUAL_ABILITY_BOUND: i32 = 999;

/// Display order used by the character sheet and the master room.
pub const STANDARD_ABILITY_ORDER: [&str; 19] = [
    "Strength",
    "Dexterity",
    "Constitution",
    "Intelligence",
    "Wisdom",
    "Charisma",
    "Perception",
    "Willpower",
    "Engineering",
    "Medicine",
    "Lockpicking",
    "Stealth",
    "Lumion",
    "Nature",
    "Survival",
    "Crafting",
    "Athletics",
    "Acrobatics",
    "History",
];

/// Named integer modifiers attached to a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityScores(BTreeMap<String, i32>);

impl AbilityScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, 0 when absent.
    pub fn get(&self, key: &str) -> i32 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: impl Into<String>, value: i32) {
        self.0.insert(key.into(), value);
    }

    /// Add `value` to `key`, treating an absent key as 0. Saturates at the
    /// `i32` range.
    pub fn add(&mut self, key: &str, value: i32) {
        let slot = self.0.entry(key.to_string()).or_insert(0);
        *slot = slot.saturating_add(value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Insert every key of [`STANDARD_ABILITY_ORDER`] that is missing, as 0.
    pub fn with_standard_keys(mut self) -> Self {
        for key in STANDARD_ABILITY_ORDER {
            self.0.entry(key.to_string()).or_insert(0);
        }
        self
    }

    /// Keys in display order: the standard ones first, then the rest alphabetically.
    pub fn display_order(&self) -> Vec<(&str, i32)> {
        let mut out: Vec<(&str, i32)> = STANDARD_ABILITY_ORDER
            .iter()
            .filter_map(|key| self.0.get_key_value(*key))
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        out.extend(
            self.iter()
                .filter(|(k, _)| !STANDARD_ABILITY_ORDER.contains(k)),
        );
        out
    }
}

impl<K: Into<String>> FromIterator<(K, i32)> for AbilityScores {
    fn from_iter<I: IntoIterator<Item = (K, i32)>>(iter: I) -> Self {
        let mut scores = AbilityScores::new();
        for (key, value) in iter {
            let key = key.into();
            scores.add(&key, value);
        }
        scores
    }
}

/// Whether a modifier is large enough to be highlighted on the sheet.
pub fn is_notable(value: i32) -> bool {
    value.abs() >= 10
}

/// Sum a list of bonus fragments. Keys repeated across fragments accumulate.
pub fn sum_fragments<'a>(fragments: impl IntoIterator<Item = &'a AbilityScores>) -> AbilityScores {
    let mut total = AbilityScores::new();
    for fragment in fragments {
        for (key, value) in fragment.iter() {
            total.add(key, value);
        }
    }
    total
}

/// Merge the creation accumulator with a class's bonus fragments.
///
/// Every key present in either input appears in the result. Negative values
/// are kept as they are; nothing is clamped here.
pub fn aggregate<'a>(
    accumulated: &AbilityScores,
    class_bonuses: impl IntoIterator<Item = &'a AbilityScores>,
) -> AbilityScores {
    let mut merged = accumulated.clone();
    for (key, value) in sum_fragments(class_bonuses).iter() {
        merged.add(key, value);
    }
    merged
}

/// Clamp a hand-adjusted value to `[-MANUAL_ABILITY_BOUND, MANUAL_ABILITY_BOUND]`.
pub fn clamp_manual(value: i32) -> i32 {
    value.clamp(-MANUAL_ABILITY_BOUND, MANUAL_ABILITY_BOUND)
}

// ============================================================================
// Ability metadata
// ============================================================================

/// Display metadata for a single ability. Never affects numeric results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "abbr")]
    pub abbreviation: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Errors from loading catalog documents.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of ability display metadata.
#[async_trait]
pub trait AbilityCatalog: Send + Sync {
    /// Metadata for every known ability, keyed by ability key.
    async fn abilities(&self) -> HashMap<String, AbilityMeta>;
}

/// Ability metadata loaded from an `abilities.json` document.
#[derive(Debug, Clone, Default)]
pub struct AbilityLibrary {
    entries: HashMap<String, AbilityMeta>,
}

impl AbilityLibrary {
    pub fn new(entries: HashMap<String, AbilityMeta>) -> Self {
        Self { entries }
    }

    /// Parse an `abilities.json` document (an object keyed by ability).
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let entries: HashMap<String, AbilityMeta> = serde_json::from_str(content)?;
        Ok(Self { entries })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub fn get(&self, key: &str) -> Option<&AbilityMeta> {
        self.entries.get(key)
    }

    /// Display label for `key`, falling back to the key itself.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        match self.entries.get(key) {
            Some(meta) if !meta.name.is_empty() => &meta.name,
            _ => key,
        }
    }
}

#[async_trait]
impl AbilityCatalog for AbilityLibrary {
    async fn abilities(&self) -> HashMap<String, AbilityMeta> {
        self.entries.clone()
    }
}

impl fmt::Display for AbilityScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .display_order()
            .into_iter()
            .map(|(k, v)| format!("{k} {v:+}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, i32)]) -> AbilityScores {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_absent_key_reads_zero() {
        let s = scores(&[("Strength", 4)]);
        assert_eq!(s.get("Strength"), 4);
        assert_eq!(s.get("Constitution"), 0);
    }

    #[test]
    fn test_aggregate_sums_repeated_keys() {
        let accumulated = scores(&[("Stealth", -90), ("Lockpicking", 10)]);
        let bonuses = vec![
            scores(&[("Stealth", 5)]),
            scores(&[("Charisma", -10)]),
            scores(&[("Stealth", 2)]),
        ];

        let merged = aggregate(&accumulated, &bonuses);

        assert_eq!(merged.get("Stealth"), -83);
        assert_eq!(merged.get("Lockpicking"), 10);
        assert_eq!(merged.get("Charisma"), -10);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let accumulated = scores(&[("Stealth", -90), ("Lockpicking", 10)]);
        let a = scores(&[("Stealth", 5)]);
        let b = scores(&[("Charisma", -10)]);
        let c = scores(&[("Stealth", 2), ("Medicine", 3)]);

        let orders = [
            vec![&a, &b, &c],
            vec![&a, &c, &b],
            vec![&b, &a, &c],
            vec![&b, &c, &a],
            vec![&c, &a, &b],
            vec![&c, &b, &a],
        ];
        let expected = aggregate(&accumulated, orders[0].iter().copied());
        for order in &orders[1..] {
            assert_eq!(aggregate(&accumulated, order.iter().copied()), expected);
        }
        assert_eq!(expected.get("Medicine"), 3);
    }

    #[test]
    fn test_aggregate_does_not_clamp() {
        let accumulated = scores(&[("Willpower", -990)]);
        let bonuses = vec![scores(&[("Willpower", -50)])];
        assert_eq!(aggregate(&accumulated, &bonuses).get("Willpower"), -1040);
    }

    #[test]
    fn test_aggregate_saturates_at_extremes() {
        let accumulated = scores(&[("Stealth", i32::MAX), ("Charisma", i32::MIN)]);
        let bonuses = vec![
            scores(&[("Stealth", 1)]),
            scores(&[("Charisma", -1), ("Stealth", 5)]),
        ];
        let merged = aggregate(&accumulated, &bonuses);
        assert_eq!(merged.get("Stealth"), i32::MAX);
        assert_eq!(merged.get("Charisma"), i32::MIN);
    }

    #[test]
    fn test_clamp_manual() {
        assert_eq!(clamp_manual(1200), 999);
        assert_eq!(clamp_manual(-1200), -999);
        assert_eq!(clamp_manual(12), 12);
    }

    #[test]
    fn test_is_notable() {
        assert!(is_notable(10));
        assert!(is_notable(-12));
        assert!(!is_notable(9));
    }

    #[test]
    fn test_display_order_puts_standard_keys_first() {
        let s = scores(&[("Zeal", 1), ("Charisma", 2), ("Strength", 3)]);
        let keys: Vec<&str> = s.display_order().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Strength", "Charisma", "Zeal"]);
    }

    #[test]
    fn test_with_standard_keys_fills_zeroes() {
        let s = scores(&[("Strength", 3)]).with_standard_keys();
        assert_eq!(s.len(), STANDARD_ABILITY_ORDER.len());
        assert_eq!(s.get("Strength"), 3);
        assert!(s.contains("History"));
    }

    #[test]
    fn test_serde_transparent() {
        let s: AbilityScores = serde_json::from_str(r#"{"Stealth": -3, "Medicine": 4}"#)
            .expect("Should parse");
        assert_eq!(s.get("Stealth"), -3);
        let json = serde_json::to_value(&s).expect("Should serialize");
        assert_eq!(json["Medicine"], 4);
    }

    #[test]
    fn test_ability_library_label() {
        let library = AbilityLibrary::from_json(
            r#"{"Strength": {"name": "Сила", "abbreviation": "STR", "color": "", "icon": "💪"}}"#,
        )
        .expect("Should parse");
        assert_eq!(library.label("Strength"), "Сила");
        assert_eq!(library.label("Lumion"), "Lumion");
        assert_eq!(library.get("Strength").map(|m| m.abbreviation.as_str()), Some("STR"));
    }
}
