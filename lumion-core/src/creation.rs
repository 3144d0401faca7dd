//! Results of the origin questionnaire.
//!
//! The questionnaire itself (which question is shown when) lives outside this
//! crate. What arrives here is the chosen option per question; each option
//! carries effects that are folded into a [`CreationResult`].

use crate::abilities::AbilityScores;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub option_id: String,
    pub text: String,
}

impl Answer {
    pub fn new(
        question_id: impl Into<String>,
        option_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            option_id: option_id.into(),
            text: text.into(),
        }
    }
}

/// Effects attached to a questionnaire option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionEffects {
    #[serde(default, alias = "lucoins")]
    pub currency: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub abilities: AbilityScores,
    /// Recommended class ids.
    #[serde(default)]
    pub classes: Vec<String>,
}

/// A selectable option of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub effects: OptionEffects,
}

/// A questionnaire question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

/// Accumulated output of the questionnaire.
///
/// Tags and recommended classes have set semantics but keep the order in
/// which they were first added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreationResult {
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default, alias = "lucoins")]
    pub currency: i64,
}

impl CreationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `questions` in order and fold in the chosen option of each.
    ///
    /// `chosen` maps question id to option id. Unanswered questions and
    /// option ids the question does not offer are skipped.
    pub fn from_answers(questions: &[Question], chosen: &HashMap<String, String>) -> Self {
        let mut result = Self::new();
        for question in questions {
            let Some(option_id) = chosen.get(&question.id) else {
                continue;
            };
            let Some(option) = question.options.iter().find(|o| &o.id == option_id) else {
                continue;
            };
            result.record(&question.id, option);
        }
        result
    }

    /// Record the answer for `question_id` and apply the option's effects.
    pub fn record(&mut self, question_id: &str, option: &QuestionOption) {
        self.answers
            .push(Answer::new(question_id, &option.id, &option.text));
        self.apply_effects(&option.effects);
    }

    /// Fold one option's effects into the accumulator.
    pub fn apply_effects(&mut self, effects: &OptionEffects) {
        self.currency = self.currency.saturating_add(effects.currency);
        for tag in &effects.tags {
            push_unique(&mut self.tags, tag);
        }
        for (key, value) in effects.abilities.iter() {
            self.abilities.add(key, value);
        }
        for class in &effects.classes {
            push_unique(&mut self.classes, class);
        }
    }

    pub fn recommends(&self, class_id: &str) -> bool {
        self.classes.iter().any(|c| c == class_id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
