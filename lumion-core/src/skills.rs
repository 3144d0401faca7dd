//! Skill definitions, skill categories and skill trees.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Named partition of a class's skill list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    /// At-will actions.
    #[serde(rename = "actions")]
    Actions,
    #[serde(alias = "short_rest", alias = "Short_Rest", alias = "short-rest")]
    ShortRest,
    #[serde(alias = "long_rest", alias = "Long_Rest", alias = "long-rest")]
    LongRest,
    #[serde(alias = "passive")]
    Passive,
}

impl SkillCategory {
    pub fn all() -> [SkillCategory; 4] {
        [
            SkillCategory::Actions,
            SkillCategory::ShortRest,
            SkillCategory::LongRest,
            SkillCategory::Passive,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SkillCategory::Actions => "Actions",
            SkillCategory::ShortRest => "Short Rest",
            SkillCategory::LongRest => "Long Rest",
            SkillCategory::Passive => "Passive",
        }
    }

    /// Parse any of the spellings used in class and character documents.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "actions" | "Actions" => Some(SkillCategory::Actions),
            "ShortRest" | "short_rest" | "Short_Rest" | "short-rest" => {
                Some(SkillCategory::ShortRest)
            }
            "LongRest" | "long_rest" | "Long_Rest" | "long-rest" => Some(SkillCategory::LongRest),
            "Passive" | "passive" => Some(SkillCategory::Passive),
            _ => None,
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A learnable skill as declared by a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDefinition {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Minimum character level required to learn the skill.
    #[serde(default = "default_skill_level")]
    pub level: u32,
    #[serde(default, alias = "description")]
    pub effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dice: Option<String>,
    /// Ids of prerequisite skills.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
}

fn default_skill_level() -> u32 {
    1
}

impl SkillDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            effect: String::new(),
            dice: None,
            needs: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.effect = effect.into();
        self
    }

    pub fn with_needs<I, S>(mut self, needs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needs = needs.into_iter().map(Into::into).collect();
        self
    }

    /// Key used to resolve `needs` references: the id, or the name when the id is empty.
    pub fn key(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }
}

/// Skills a character has learned, per category.
pub type LearnedSkills = BTreeMap<SkillCategory, Vec<SkillDefinition>>;

/// Whether `name` is already learned in `category`.
pub fn is_learned(learned: &LearnedSkills, category: SkillCategory, name: &str) -> bool {
    learned
        .get(&category)
        .is_some_and(|skills| skills.iter().any(|s| s.name == name))
}

/// Names of every learned skill regardless of category.
pub fn learned_names(learned: &LearnedSkills) -> HashSet<&str> {
    learned
        .values()
        .flat_map(|skills| skills.iter().map(|s| s.name.as_str()))
        .collect()
}

/// Prerequisites of `skill` that are not learned in any category.
///
/// Informational only; learning never checks prerequisites.
pub fn missing_prerequisites<'a>(
    skill: &'a SkillDefinition,
    learned: &LearnedSkills,
) -> Vec<&'a str> {
    let known: HashSet<&str> = learned
        .values()
        .flat_map(|skills| skills.iter().map(|s| s.key()))
        .collect();
    skill
        .needs
        .iter()
        .map(String::as_str)
        .filter(|need| !known.contains(*need))
        .collect()
}

/// A skill with the skills that list it as a prerequisite.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillNode<'a> {
    pub skill: &'a SkillDefinition,
    pub children: Vec<SkillNode<'a>>,
}

/// Arrange one category's skills into trees by their `needs` links.
///
/// Skills without prerequisites are roots. A skill whose prerequisites are
/// all unknown is also treated as a root so it never disappears. A skill
/// with several known prerequisites appears under each of them.
pub fn build_skill_tree(skills: &[SkillDefinition]) -> Vec<SkillNode<'_>> {
    let known: HashSet<&str> = skills.iter().map(|s| s.key()).collect();
    let mut children: HashMap<&str, Vec<&SkillDefinition>> = HashMap::new();
    let mut roots = Vec::new();

    for skill in skills {
        let parents: Vec<&str> = skill
            .needs
            .iter()
            .map(String::as_str)
            .filter(|need| known.contains(*need) && *need != skill.key())
            .collect();
        if parents.is_empty() {
            roots.push(skill);
        } else {
            for parent in parents {
                children.entry(parent).or_default().push(skill);
            }
        }
    }

    let mut visiting = HashSet::new();
    roots
        .into_iter()
        .map(|skill| grow(skill, &children, &mut visiting))
        .collect()
}

fn grow<'a>(
    skill: &'a SkillDefinition,
    children: &HashMap<&str, Vec<&'a SkillDefinition>>,
    visiting: &mut HashSet<&'a str>,
) -> SkillNode<'a> {
    // Cycles in hand-written content are cut at the repeated skill.
    if !visiting.insert(skill.key()) {
        return SkillNode {
            skill,
            children: Vec::new(),
        };
    }
    let grown: Vec<SkillNode<'a>> = children
        .get(skill.key())
        .map(|list| {
            list.iter()
                .map(|child| grow(*child, children, visiting))
                .collect()
        })
        .unwrap_or_default();
    visiting.remove(skill.key());
    SkillNode {
        skill,
        children: grown,
    }
}
