//! Answer normalisation shared by single- and multiple-choice questions.
//!
//! The "no answer" policy is deliberately narrow: NULL, blank, and the exact
//! token `NA` are dropped. Other null-like spellings (`N/A`, `na`, `None`) are
//! kept as real answers.

use crate::question::QuestionType;

/// Separator between selected options in a multiple-choice cell.
pub const MC_DELIMITER: char = ';';

/// Sentinel the survey export uses for a missing answer.
pub const NA_TOKEN: &str = "NA";

/// Whether a raw cell counts as "no answer".
pub fn is_no_answer(raw: Option<&str>) -> bool {
  match raw.map(str::trim) {
    None => true,
    Some(v) => v.is_empty() || v == NA_TOKEN,
  }
}

/// Split a multiple-choice cell into its selected options.
///
/// Pieces are trimmed; empty and `NA` pieces are dropped. Duplicates within
/// one cell are kept, each becomes its own fact.
pub fn split_selections(raw: &str) -> impl Iterator<Item = &str> {
  raw
    .split(MC_DELIMITER)
    .map(str::trim)
    .filter(|piece| !piece.is_empty() && *piece != NA_TOKEN)
}

/// The answers a respondent gave to one question, in cell order.
///
/// Single-choice cells yield the raw value unchanged; other question types
/// yield nothing.
pub fn answers_for<'a>(question_type: &QuestionType, raw: Option<&'a str>) -> Vec<&'a str> {
  if is_no_answer(raw) {
    return Vec::new();
  }
  let Some(raw) = raw else { return Vec::new() };

  match question_type {
    QuestionType::SingleChoice => vec![raw],
    QuestionType::MultipleChoice => split_selections(raw).collect(),
    QuestionType::Other(_) => Vec::new(),
  }
}
