//! Derived stats: maximum hit points and computed defense.
//!
//! These never fail. Missing class metadata contributes 0 and the result is
//! marked degraded.

use crate::abilities::{AbilityScores, CONSTITUTION, DEXTERITY};
use crate::character::CharacterProfile;
use crate::class_data::ClassDefinition;

/// Maximum hit points: class base (0 when unknown) plus Constitution.
pub fn max_hit_points(class_base: Option<i32>, abilities: &AbilityScores) -> i32 {
    class_base.unwrap_or(0).saturating_add(abilities.get(CONSTITUTION))
}

/// Current hit points after the maximum moved from `previous_max` to `new_max`.
///
/// A character at full health stays at full health. Otherwise the current
/// value is kept, clamped down when it exceeds the new maximum.
pub fn recompute_hit_points(current: i32, previous_max: i32, new_max: i32) -> i32 {
    if current == previous_max {
        new_max
    } else {
        current.min(new_max)
    }
}

/// Dexterity contribution to defense: `floor(Dexterity / 10)`.
pub fn dexterity_bonus(abilities: &AbilityScores) -> i32 {
    abilities.get(DEXTERITY).div_euclid(10)
}

/// Defense shown on the sheet. Only `base` is ever stored.
pub fn computed_defense(base: i32, abilities: &AbilityScores) -> i32 {
    base.saturating_add(dexterity_bonus(abilities))
}

/// Derived values for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedStats {
    pub hp_max: i32,
    pub defense: i32,
    /// Class metadata was unavailable and zero was used in its place.
    pub degraded: bool,
}

/// Derived stats for `profile` given its class, if known.
pub fn derived_stats(profile: &CharacterProfile, class: Option<&ClassDefinition>) -> DerivedStats {
    let base_hp = class.and_then(|c| c.hp);
    if base_hp.is_none() {
        tracing::warn!(class_id = %profile.class, "Class base HP unavailable, using 0");
    }
    DerivedStats {
        hp_max: max_hit_points(base_hp, &profile.abilities),
        defense: profile.computed_defense(),
        degraded: base_hp.is_none(),
    }
}

/// Fill vitals a record never stored.
///
/// A missing `hpMax` is derived from the class; a missing `hp` starts at
/// max; `hp` above max is clamped down. Returns whether anything changed.
pub fn fill_missing_vitals(
    hp: &mut Option<i32>,
    hp_max: &mut Option<i32>,
    abilities: &AbilityScores,
    class: Option<&ClassDefinition>,
) -> bool {
    let mut changed = false;
    if hp_max.is_none() {
        if let Some(class) = class {
            let max = max_hit_points(class.hp, abilities);
            *hp_max = Some(max);
            if hp.is_none() {
                *hp = Some(max);
            }
            changed = true;
        }
    }
    if let (Some(current), Some(max)) = (*hp, *hp_max) {
        if current > max {
            *hp = Some(max);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abilities(pairs: &[(&str, i32)]) -> AbilityScores {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_max_hit_points() {
        assert_eq!(max_hit_points(Some(20), &abilities(&[("Constitution", 15)])), 35);
        assert_eq!(max_hit_points(Some(20), &abilities(&[])), 20);
        assert_eq!(max_hit_points(None, &abilities(&[("Constitution", 7)])), 7);
    }

    #[test]
    fn test_extreme_values_saturate() {
        let huge = abilities(&[("Constitution", i32::MAX), ("Dexterity", i32::MAX)]);
        assert_eq!(max_hit_points(Some(20), &huge), i32::MAX);
        assert_eq!(computed_defense(i32::MAX, &huge), i32::MAX);

        let tiny = abilities(&[("Constitution", i32::MIN), ("Dexterity", i32::MIN)]);
        assert_eq!(max_hit_points(Some(-1), &tiny), i32::MIN);
        assert_eq!(computed_defense(i32::MIN, &tiny), i32::MIN);
    }

    #[test]
    fn test_full_stays_full() {
        assert_eq!(recompute_hit_points(30, 30, 35), 35);
    }

    #[test]
    fn test_damage_is_kept() {
        assert_eq!(recompute_hit_points(10, 30, 35), 10);
    }

    #[test]
    fn test_clamp_to_lower_max() {
        assert_eq!(recompute_hit_points(28, 30, 20), 20);
    }

    #[test]
    fn test_defense_floor_division() {
        assert_eq!(computed_defense(1, &abilities(&[("Dexterity", 23)])), 3);
        assert_eq!(computed_defense(1, &abilities(&[("Dexterity", 35)])), 4);
        assert_eq!(computed_defense(1, &abilities(&[("Dexterity", -5)])), 0);
        assert_eq!(computed_defense(2, &abilities(&[])), 2);
    }

    #[test]
    fn test_derived_stats_degrade_without_class() {
        let mut profile = CharacterProfile::new("Mira", "unknown");
        profile.abilities.set("Constitution", 4);
        profile.armor = 2;

        let stats = derived_stats(&profile, None);
        assert_eq!(stats.hp_max, 4);
        assert_eq!(stats.defense, 2);
        assert!(stats.degraded);

        let class = ClassDefinition::new("guardian", "Guardian").with_hp(25);
        let stats = derived_stats(&profile, Some(&class));
        assert_eq!(stats.hp_max, 29);
        assert!(!stats.degraded);
    }

    #[test]
    fn test_fill_missing_vitals() {
        let class = ClassDefinition::new("guardian", "Guardian").with_hp(25);
        let scores = abilities(&[("Constitution", 5)]);

        let (mut hp, mut hp_max) = (None, None);
        assert!(fill_missing_vitals(&mut hp, &mut hp_max, &scores, Some(&class)));
        assert_eq!((hp, hp_max), (Some(30), Some(30)));

        let (mut hp, mut hp_max) = (Some(50), Some(30));
        assert!(fill_missing_vitals(&mut hp, &mut hp_max, &scores, None));
        assert_eq!(hp, Some(30));

        let (mut hp, mut hp_max) = (None, None);
        assert!(!fill_missing_vitals(&mut hp, &mut hp_max, &scores, None));
        assert_eq!(hp_max, None);
    }
}
