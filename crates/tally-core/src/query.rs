//! Result rows returned by the analytical queries.

use serde::{Deserialize, Serialize};

use crate::question::QuestionType;

/// One row of a keyword search: a matching question, paired with one of its
/// answer options (or `None` when the question has no observed answers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
  pub question_id:   i64,
  pub column_name:   String,
  pub question_text: String,
  #[serde(rename = "type")]
  pub question_type: QuestionType,
  pub answer_value:  Option<String>,
}

/// One answer's share of a question's responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRow {
  pub answer_value:   String,
  pub response_count: u64,
  #[serde(rename = "type")]
  pub question_type:  QuestionType,
  /// Share of the question's denominator, rounded to two decimals.
  ///
  /// For SC questions the denominator is the number of respondents who
  /// answered; for MC questions it is the number of selections, so the
  /// percentages sum to 100 over selections rather than respondents.
  pub percentage:     f64,
}

/// A declared column of a session table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
  pub column_name: String,
  pub column_type: String,
}

/// Rows read back from a session table, every cell rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRows {
  pub columns: Vec<String>,
  pub rows:    Vec<Vec<Option<String>>>,
}

impl TableRows {
  /// Cell at `row` under the column named `column`.
  pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
    let i = self.columns.iter().position(|c| c == column)?;
    self.rows.get(row)?.get(i)?.as_deref()
  }
}

/// Round a percentage to two decimals.
pub fn round_percentage(count: u64, denominator: u64) -> f64 {
  if denominator == 0 {
    return 0.0;
  }
  let raw = 100.0 * count as f64 / denominator as f64;
  (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn halves() {
    assert_eq!(round_percentage(1, 2), 50.0);
  }

  #[test]
  fn thirds_round_to_two_places() {
    assert_eq!(round_percentage(1, 3), 33.33);
    assert_eq!(round_percentage(2, 3), 66.67);
  }

  #[test]
  fn cell_by_column_name() {
    let t = TableRows {
      columns: vec!["column".into(), "type".into()],
      rows:    vec![vec![Some("Age".into()), None]],
    };
    assert_eq!(t.cell(0, "column"), Some("Age"));
    assert_eq!(t.cell(0, "type"), None);
    assert_eq!(t.cell(0, "missing"), None);
    assert_eq!(t.cell(1, "column"), None);
  }

  #[test]
  fn zero_denominator() {
    assert_eq!(round_percentage(0, 0), 0.0);
  }
}
