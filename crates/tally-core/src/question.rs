//! Questions — the `dim_questions` dimension and its raw schema source.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Question type ───────────────────────────────────────────────────────────

/// How a question's answers are encoded in the wide respondent table.
///
/// Anything other than `SC` / `MC` is carried through as [`Other`] so that
/// free-text and numeric questions still get a `dim_questions` row; they never
/// produce facts.
///
/// [`Other`]: QuestionType::Other
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
  /// `SC`: the cell holds at most one answer.
  SingleChoice,
  /// `MC`: the cell holds zero or more `;`-joined answers.
  MultipleChoice,
  Other(String),
}

impl QuestionType {
  pub fn parse(raw: &str) -> Self {
    match raw {
      "SC" => Self::SingleChoice,
      "MC" => Self::MultipleChoice,
      other => Self::Other(other.to_owned()),
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::SingleChoice => "SC",
      Self::MultipleChoice => "MC",
      Self::Other(raw) => raw,
    }
  }

  /// Whether answers of this type can be pivoted into facts.
  pub fn is_choice(&self) -> bool {
    matches!(self, Self::SingleChoice | Self::MultipleChoice)
  }
}

impl From<String> for QuestionType {
  fn from(raw: String) -> Self { Self::parse(&raw) }
}

impl From<QuestionType> for String {
  fn from(t: QuestionType) -> Self { t.as_str().to_owned() }
}

impl fmt::Display for QuestionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Raw schema ──────────────────────────────────────────────────────────────

/// One row of the schema source (`column,question_text,type`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSchemaRow {
  pub column_name:   String,
  pub question_text: String,
  pub question_type: String,
}

/// Positions of the three schema fields within a schema CSV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaHeader {
  pub column:        usize,
  pub question_text: usize,
  pub question_type: usize,
}

impl SchemaHeader {
  pub const TABLE: &'static str = "schema source";

  /// Locate the required fields in `headers`. Extra columns are ignored.
  pub fn resolve<'a, I>(headers: I) -> Result<Self>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let headers: Vec<&str> = headers.into_iter().map(str::trim).collect();
    if headers.iter().all(|h| h.is_empty()) {
      return Err(Error::EmptyHeader(Self::TABLE));
    }

    let find = |column: &'static str| {
      headers
        .iter()
        .position(|h| *h == column)
        .ok_or(Error::MissingColumn { table: Self::TABLE, column })
    };

    Ok(Self {
      column:        find("column")?,
      question_text: find("question_text")?,
      question_type: find("type")?,
    })
  }
}

// ─── Dimension row ───────────────────────────────────────────────────────────

/// A row of `dim_questions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub question_id:   i64,
  pub column_name:   String,
  pub question_text: String,
  #[serde(rename = "type")]
  pub question_type: QuestionType,
}

/// A question annotated with the number of distinct answers observed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
  #[serde(flatten)]
  pub question:           Question,
  pub num_answer_options: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_types_parse() {
    assert_eq!(QuestionType::parse("SC"), QuestionType::SingleChoice);
    assert_eq!(QuestionType::parse("MC"), QuestionType::MultipleChoice);
  }

  #[test]
  fn unknown_type_round_trips_its_text() {
    let t = QuestionType::parse("TE");
    assert_eq!(t, QuestionType::Other("TE".into()));
    assert_eq!(t.as_str(), "TE");
    assert!(!t.is_choice());
  }

  #[test]
  fn type_parsing_is_case_sensitive() {
    assert_eq!(QuestionType::parse("sc"), QuestionType::Other("sc".into()));
  }

  #[test]
  fn schema_header_in_any_order() {
    let h = SchemaHeader::resolve(["type", "extra", "question_text", "column"])
      .unwrap();
    assert_eq!(h, SchemaHeader { column: 3, question_text: 2, question_type: 0 });
  }

  #[test]
  fn schema_header_missing_type() {
    let err = SchemaHeader::resolve(["column", "question_text"]).unwrap_err();
    assert!(matches!(err, Error::MissingColumn { column: "type", .. }));
  }

  #[test]
  fn schema_header_empty() {
    let err = SchemaHeader::resolve([""]).unwrap_err();
    assert!(matches!(err, Error::EmptyHeader(_)));
  }
}
