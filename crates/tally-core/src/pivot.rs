//! The wide-to-long pivot that produces `fact_responses`.
//!
//! Fact construction runs in two phases because answer-option ids can only be
//! assigned once every realised answer is known:
//!
//! 1. [`pivot_responses`] turns wide respondent rows into provisional
//!    `(respondent, question, answer)` triples.
//! 2. [`assign_answer_options`] derives `dim_answer_options` from the distinct
//!    `(question, answer)` pairs and attaches the option id to every triple.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  answer::answers_for,
  question::Question,
  respondent::RawRespondentRow,
};

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A fact before its answer option id is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionalResponse {
  pub respondent_id: i64,
  pub question_id:   i64,
  pub answer_value:  String,
}

/// A row of `dim_answer_options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
  pub answer_option_id: i64,
  pub question_id:      i64,
  pub answer_value:     String,
}

/// A row of `fact_responses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
  pub respondent_id:    i64,
  pub question_id:      i64,
  pub answer_option_id: i64,
  pub answer_value:     String,
}

/// Output of the second phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarFacts {
  pub answer_options: Vec<AnswerOption>,
  pub responses:      Vec<Response>,
}

// ─── Phase 1 ─────────────────────────────────────────────────────────────────

/// Pivot wide respondent rows into provisional facts.
///
/// Only `questions` whose type is SC or MC contribute. Callers pass just the
/// questions whose column exists in the raw table; a column missing from an
/// individual row reads as NULL.
pub fn pivot_responses(
  questions: &[Question],
  rows:      &[RawRespondentRow],
) -> Vec<ProvisionalResponse> {
  let choice_questions: Vec<&Question> = questions
    .iter()
    .filter(|q| q.question_type.is_choice())
    .collect();

  let mut out = Vec::new();
  for question in &choice_questions {
    for row in rows {
      let raw = row.value(&question.column_name);
      out.extend(answers_for(&question.question_type, raw).into_iter().map(
        |answer| ProvisionalResponse {
          respondent_id: row.respondent_id,
          question_id:   question.question_id,
          answer_value:  answer.to_owned(),
        },
      ));
    }
  }
  out
}

// ─── Phase 2 ─────────────────────────────────────────────────────────────────

/// Derive the answer-option dimension and finalise the fact rows.
///
/// Option ids are 1-based and follow `(question_id, answer_value)` order, so
/// rebuilding from the same inputs yields the same ids.
pub fn assign_answer_options(provisional: Vec<ProvisionalResponse>) -> StarFacts {
  let mut option_ids: BTreeMap<(i64, String), i64> = BTreeMap::new();
  for p in &provisional {
    option_ids
      .entry((p.question_id, p.answer_value.clone()))
      .or_insert(0);
  }

  let mut answer_options = Vec::with_capacity(option_ids.len());
  for (next_id, ((question_id, answer_value), id)) in
    (1..).zip(option_ids.iter_mut())
  {
    *id = next_id;
    answer_options.push(AnswerOption {
      answer_option_id: next_id,
      question_id:      *question_id,
      answer_value:     answer_value.clone(),
    });
  }

  let responses = provisional
    .into_iter()
    .map(|p| {
      let answer_option_id = option_ids[&(p.question_id, p.answer_value.clone())];
      Response {
        respondent_id: p.respondent_id,
        question_id: p.question_id,
        answer_option_id,
        answer_value: p.answer_value,
      }
    })
    .collect();

  StarFacts { answer_options, responses }
}
