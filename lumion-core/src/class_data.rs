//! Class definitions and the class metadata provider.
//!
//! Class documents are authored by hand, so the reader accepts the shapes
//! that exist in the content folder: grouped or flat inventories, skill
//! categories wrapped in a one-element array, and the older field spellings.

use crate::abilities::{sum_fragments, AbilityScores, CatalogError};
use crate::skills::{LearnedSkills, SkillCategory, SkillDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Inventory limit used when a class does not declare one.
pub const DEFAULT_INVENTORY_LIMIT: usize = 2;

/// A character archetype: base stats, ability bonuses, starting kit, skills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDefinition {
    #[serde(alias = "class")]
    pub id: String,
    #[serde(default, alias = "text")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Base hit points before Constitution.
    #[serde(default, alias = "baseHp")]
    pub hp: Option<i32>,
    /// Base defense before the Dexterity bonus.
    #[serde(default, alias = "defence", alias = "armor")]
    pub defense: Option<i32>,
    /// Single-key bonus fragments; a key may repeat across fragments.
    #[serde(default)]
    pub abilities: Vec<AbilityScores>,
    #[serde(default)]
    pub inventory: Vec<InventoryEntry>,
    #[serde(default)]
    pub inventory_limit: Option<usize>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_skills")]
    pub skills: ClassSkills,
}

/// An inventory entry in a class document: a single item or a group of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InventoryEntry {
    Item(String),
    Group(Vec<String>),
}

impl ClassDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = Some(hp);
        self
    }

    pub fn with_defense(mut self, defense: i32) -> Self {
        self.defense = Some(defense);
        self
    }

    pub fn with_bonus(mut self, key: impl Into<String>, value: i32) -> Self {
        let mut fragment = AbilityScores::new();
        fragment.set(key, value);
        self.abilities.push(fragment);
        self
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inventory
            .extend(items.into_iter().map(|i| InventoryEntry::Item(i.into())));
        self
    }

    pub fn with_inventory_limit(mut self, limit: usize) -> Self {
        self.inventory_limit = Some(limit);
        self
    }

    pub fn with_skill(mut self, category: SkillCategory, skill: SkillDefinition) -> Self {
        self.skills.get_mut(category).push(skill);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// All class ability bonuses summed into one map.
    pub fn total_bonuses(&self) -> AbilityScores {
        sum_fragments(&self.abilities)
    }

    /// Starting kit options, groups flattened in document order.
    pub fn flat_inventory(&self) -> Vec<String> {
        self.inventory
            .iter()
            .flat_map(|entry| match entry {
                InventoryEntry::Item(item) => vec![item.clone()],
                InventoryEntry::Group(group) => group.clone(),
            })
            .collect()
    }

    /// Declared starting kit limit, or `fallback` when the class has none.
    pub fn inventory_limit_or(&self, fallback: usize) -> usize {
        self.inventory_limit.unwrap_or(fallback)
    }

    /// Look up a skill by name across every category.
    pub fn find_skill(&self, name: &str) -> Option<(SkillCategory, &SkillDefinition)> {
        SkillCategory::all().into_iter().find_map(|category| {
            self.skills
                .get(category)
                .iter()
                .find(|s| s.name == name)
                .map(|s| (category, s))
        })
    }
}

/// A class's learnable skills, partitioned by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassSkills {
    #[serde(default)]
    pub actions: Vec<SkillDefinition>,
    #[serde(
        default,
        rename = "ShortRest",
        alias = "short_rest",
        alias = "Short_Rest",
        alias = "short-rest"
    )]
    pub short_rest: Vec<SkillDefinition>,
    #[serde(
        default,
        rename = "LongRest",
        alias = "long_rest",
        alias = "Long_Rest",
        alias = "long-rest"
    )]
    pub long_rest: Vec<SkillDefinition>,
    #[serde(default, rename = "Passive", alias = "passive")]
    pub passive: Vec<SkillDefinition>,
}

impl ClassSkills {
    pub fn get(&self, category: SkillCategory) -> &[SkillDefinition] {
        match category {
            SkillCategory::Actions => &self.actions,
            SkillCategory::ShortRest => &self.short_rest,
            SkillCategory::LongRest => &self.long_rest,
            SkillCategory::Passive => &self.passive,
        }
    }

    pub fn get_mut(&mut self, category: SkillCategory) -> &mut Vec<SkillDefinition> {
        match category {
            SkillCategory::Actions => &mut self.actions,
            SkillCategory::ShortRest => &mut self.short_rest,
            SkillCategory::LongRest => &mut self.long_rest,
            SkillCategory::Passive => &mut self.passive,
        }
    }

    pub fn is_empty(&self) -> bool {
        SkillCategory::all()
            .into_iter()
            .all(|category| self.get(category).is_empty())
    }

    /// Convert into the per-category map stored on characters, dropping
    /// empty categories.
    pub fn into_learned(mut self) -> LearnedSkills {
        SkillCategory::all()
            .into_iter()
            .filter_map(|category| {
                let list = std::mem::take(self.get_mut(category));
                (!list.is_empty()).then_some((category, list))
            })
            .collect()
    }
}

/// Skill categories are sometimes wrapped in a one-element array.
pub(crate) fn deserialize_skills<'de, D>(deserializer: D) -> Result<ClassSkills, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Wrapped(Vec<ClassSkills>),
        Plain(ClassSkills),
    }

    Ok(match Shape::deserialize(deserializer)? {
        Shape::Wrapped(list) => list.into_iter().next().unwrap_or_default(),
        Shape::Plain(skills) => skills,
    })
}

// ============================================================================
// Class metadata provider
// ============================================================================

/// Source of class definitions.
#[async_trait]
pub trait ClassCatalog: Send + Sync {
    /// The class with `id`, or `None` when it is unknown.
    async fn class(&self, id: &str) -> Option<ClassDefinition>;

    /// Every known class, in catalog order.
    async fn classes(&self) -> Vec<ClassDefinition>;
}

/// Class definitions loaded from a content directory.
///
/// The directory holds a `classes.json` manifest listing per-class files
/// (either `{"classes": ["a.json", ...]}` or a bare array) and a `classes/`
/// folder with one JSON document per class.
#[derive(Debug, Clone, Default)]
pub struct ClassLibrary {
    order: Vec<String>,
    classes: BTreeMap<String, ClassDefinition>,
}

impl ClassLibrary {
    pub fn new(classes: impl IntoIterator<Item = ClassDefinition>) -> Self {
        let mut library = Self::default();
        for class in classes {
            library.insert(class);
        }
        library
    }

    pub fn insert(&mut self, class: ClassDefinition) {
        if !self.classes.contains_key(&class.id) {
            self.order.push(class.id.clone());
        }
        self.classes.insert(class.id.clone(), class);
    }

    /// Load the manifest and every class file it lists.
    ///
    /// A listed file that cannot be read or parsed is skipped.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let manifest = fs::read_to_string(dir.join("classes.json")).await?;
        let files = parse_manifest(&manifest)?;

        let mut library = Self::default();
        for file in files {
            let path = class_file_path(dir, &file);
            match load_class_file(&path).await {
                Ok(class) => library.insert(class),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping class file");
                }
            }
        }

        tracing::debug!(count = library.order.len(), "Loaded class library");
        Ok(library)
    }

    pub fn get(&self, id: &str) -> Option<&ClassDefinition> {
        self.classes.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Classes offered on the class picker.
    ///
    /// Hidden classes only appear when the questionnaire recommended them.
    pub fn visible_classes(&self, recommended: &[String]) -> Vec<&ClassDefinition> {
        self.order
            .iter()
            .filter_map(|id| self.classes.get(id))
            .filter(|class| !class.hidden || recommended.iter().any(|r| r == &class.id))
            .collect()
    }
}

#[async_trait]
impl ClassCatalog for ClassLibrary {
    async fn class(&self, id: &str) -> Option<ClassDefinition> {
        self.get(id).cloned()
    }

    async fn classes(&self) -> Vec<ClassDefinition> {
        self.order
            .iter()
            .filter_map(|id| self.classes.get(id))
            .cloned()
            .collect()
    }
}

fn parse_manifest(content: &str) -> Result<Vec<String>, CatalogError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Manifest {
        Listed { classes: Vec<String> },
        Bare(Vec<String>),
    }

    Ok(match serde_json::from_str(content)? {
        Manifest::Listed { classes } => classes,
        Manifest::Bare(files) => files,
    })
}

fn class_file_path(dir: &Path, file: &str) -> PathBuf {
    let file = if file.ends_with(".json") {
        file.to_string()
    } else {
        format!("{file}.json")
    };
    dir.join("classes").join(file)
}

async fn load_class_file(path: &Path) -> Result<ClassDefinition, CatalogError> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LOCKSMITH: &str = r#"{
        "id": "locksmith",
        "name": "Взломщик",
        "description": "Opens what should stay closed.",
        "hp": 20,
        "defence": 1,
        "abilities": [{"Lockpicking": 15}, {"Stealth": 5}, {"Stealth": 2}],
        "inventory": [["Lockpicks", "Crowbar"], ["Lantern"]],
        "inventoryLimit": 1,
        "skills": [{
            "actions": [{"id": "pick", "name": "Quick Pick", "level": 1, "effect": "Open a lock"}],
            "short_rest": [{"id": "vanish", "name": "Vanish", "level": 2, "description": "Hide", "needs": ["pick"]}],
            "Passive": []
        }]
    }"#;

    #[test]
    fn test_parse_class_document() {
        let class: ClassDefinition = serde_json::from_str(LOCKSMITH).expect("Should parse");

        assert_eq!(class.id, "locksmith");
        assert_eq!(class.hp, Some(20));
        assert_eq!(class.defense, Some(1));
        assert_eq!(class.inventory_limit, Some(1));
        assert_eq!(class.flat_inventory(), vec!["Lockpicks", "Crowbar", "Lantern"]);
        assert_eq!(class.total_bonuses().get("Stealth"), 7);
        assert_eq!(class.skills.actions.len(), 1);
        assert_eq!(class.skills.short_rest[0].effect, "Hide");
        assert_eq!(class.skills.short_rest[0].needs, vec!["pick"]);
    }

    #[test]
    fn test_parse_plain_skills_and_flat_inventory() {
        let class: ClassDefinition = serde_json::from_str(
            r#"{"id": "medic", "baseHp": 14, "inventory": ["Bandage", "Scalpel"],
                "skills": {"LongRest": [{"name": "Revive", "level": 3}]}}"#,
        )
        .expect("Should parse");

        assert_eq!(class.hp, Some(14));
        assert_eq!(class.flat_inventory(), vec!["Bandage", "Scalpel"]);
        assert_eq!(class.inventory_limit_or(DEFAULT_INVENTORY_LIMIT), 2);
        assert_eq!(class.skills.long_rest[0].level, 3);
    }

    #[test]
    fn test_find_skill() {
        let class: ClassDefinition = serde_json::from_str(LOCKSMITH).expect("Should parse");
        let (category, skill) = class.find_skill("Vanish").expect("Should find skill");
        assert_eq!(category, SkillCategory::ShortRest);
        assert_eq!(skill.level, 2);
        assert!(class.find_skill("Fireball").is_none());
    }

    #[test]
    fn test_visible_classes_hides_unrecommended() {
        let library = ClassLibrary::new(vec![
            ClassDefinition::new("guardian", "Guardian"),
            ClassDefinition::new("regalif", "Regalif").hidden(),
        ]);

        let ids: Vec<&str> = library
            .visible_classes(&[])
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["guardian"]);

        let ids: Vec<&str> = library
            .visible_classes(&["regalif".to_string()])
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["guardian", "regalif"]);
    }

    #[tokio::test]
    async fn test_load_library_skips_broken_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let classes_dir = temp_dir.path().join("classes");
        std::fs::create_dir_all(&classes_dir).expect("Create dir should succeed");

        std::fs::write(
            temp_dir.path().join("classes.json"),
            r#"{"classes": ["locksmith.json", "broken.json", "missing"]}"#,
        )
        .expect("Write should succeed");
        std::fs::write(classes_dir.join("locksmith.json"), LOCKSMITH).expect("Write should succeed");
        std::fs::write(classes_dir.join("broken.json"), "{ not json").expect("Write should succeed");

        let library = ClassLibrary::load(temp_dir.path())
            .await
            .expect("Load should succeed");

        assert_eq!(library.len(), 1);
        assert!(library.class("locksmith").await.is_some());
        assert!(library.class("broken").await.is_none());
    }

    #[tokio::test]
    async fn test_load_bare_manifest() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let classes_dir = temp_dir.path().join("classes");
        std::fs::create_dir_all(&classes_dir).expect("Create dir should succeed");

        std::fs::write(temp_dir.path().join("classes.json"), r#"["locksmith"]"#)
            .expect("Write should succeed");
        std::fs::write(classes_dir.join("locksmith.json"), LOCKSMITH).expect("Write should succeed");

        let library = ClassLibrary::load(temp_dir.path())
            .await
            .expect("Load should succeed");
        assert_eq!(library.classes().await.len(), 1);
    }
}
