//! The `SurveyStore` trait: read-only queries over a built star schema.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! The CLI depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  query::{ColumnInfo, DistributionRow, SearchHit, TableRows},
  question::{Question, QuestionSummary},
  respondent::Respondent,
};

/// Query interface over `dim_questions`, `dim_respondents`,
/// `dim_answer_options` and `fact_responses`.
///
/// None of these methods mutate the session. An unknown column name or an
/// unsupported question type is not an error: the result is simply empty.
/// Using a store after it has been closed is an error.
pub trait SurveyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Analytical queries ────────────────────────────────────────────────

  /// Every question ordered by `question_id`, with its count of distinct
  /// observed answers.
  fn survey_structure(
    &self,
  ) -> impl Future<Output = Result<Vec<QuestionSummary>, Self::Error>> + Send + '_;

  /// Case-insensitive substring search over question text, column names and
  /// answer values. Ordered by `question_id`, then `answer_value`.
  fn search_questions<'a>(
    &'a self,
    term: &'a str,
  ) -> impl Future<Output = Result<Vec<SearchHit>, Self::Error>> + Send + 'a;

  /// Respondents whose answer to `column_name` is exactly `answer_value`
  /// (case-sensitive), ordered by `respondent_id`.
  fn respondent_subset<'a>(
    &'a self,
    column_name: &'a str,
    answer_value: &'a str,
  ) -> impl Future<Output = Result<Vec<Respondent>, Self::Error>> + Send + 'a;

  /// Answer counts and percentages for one SC or MC question, ordered by
  /// descending count.
  fn answer_distribution<'a>(
    &'a self,
    column_name: &'a str,
  ) -> impl Future<Output = Result<Vec<DistributionRow>, Self::Error>> + Send + 'a;

  // ── Inspection ────────────────────────────────────────────────────────

  /// Resolve a single question by column name.
  fn question<'a>(
    &'a self,
    column_name: &'a str,
  ) -> impl Future<Output = Result<Option<Question>, Self::Error>> + Send + 'a;

  /// Names of every table in the session, sorted.
  fn list_tables(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Declared columns of `table`; empty if the table does not exist.
  fn table_info<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Vec<ColumnInfo>, Self::Error>> + Send + 'a;

  /// Number of rows in `table`.
  fn row_count<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// The rows of `table` in insertion order, at most `limit` of them.
  /// Works for the raw source tables as well as the star tables.
  fn table_rows<'a>(
    &'a self,
    table: &'a str,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<TableRows, Self::Error>> + Send + 'a;
}
