//! Narrative history composed from questionnaire answers.

use crate::creation::Answer;

/// Separator between answer lines.
pub const HISTORY_SEPARATOR: &str = ". ";

/// Compose the history text: `"{questionId}: {text}"` per answer, joined by
/// [`HISTORY_SEPARATOR`], in answer order.
///
/// The output is deterministic for a given input, so it can seed generated
/// flavor text reproducibly.
pub fn compose_history(answers: &[Answer]) -> String {
    answers
        .iter()
        .map(|answer| format!("{}: {}", answer.question_id, answer.text))
        .collect::<Vec<_>>()
        .join(HISTORY_SEPARATOR)
}
