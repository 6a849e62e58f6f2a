//! Star-schema construction from the raw `so_schema` / `so_data` tables.
//!
//! Runs once per session inside a single transaction, so either all four star
//! tables exist afterwards or none do.

use std::collections::HashSet;

use rusqlite::Transaction;
use tally_core::{
  pivot::{StarFacts, assign_answer_options, pivot_responses},
  question::{Question, QuestionType},
  respondent::{DEFAULT_DEMOGRAPHICS, RawRespondentRow},
};

use crate::{
  Error, Result,
  schema::{RESPONDENT_KEY_COLUMNS, STAR_SCHEMA, dim_respondents, quote_ident},
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Knobs for [`crate::SqliteStore::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
  /// Raw columns carried into `dim_respondents`, in order. Respondent ids
  /// follow this column order, then raw row order.
  pub demographic_columns: Vec<String>,
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self {
      demographic_columns: DEFAULT_DEMOGRAPHICS
        .iter()
        .map(|c| (*c).to_owned())
        .collect(),
    }
  }
}

impl BuildOptions {
  /// Reject repeated demographics and names that clash with key columns.
  pub fn validate(&self) -> Result<()> {
    let mut seen = HashSet::new();
    for column in &self.demographic_columns {
      if RESPONDENT_KEY_COLUMNS.contains(&column.as_str()) {
        return Err(Error::ReservedColumn(column.clone()));
      }
      if !seen.insert(column) {
        return Err(Error::DuplicateColumn {
          table:  "dim_respondents".into(),
          column: column.clone(),
        });
      }
    }
    Ok(())
  }
}

/// Row counts of a finished build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
  pub questions:       usize,
  /// Questions with no matching column in `so_data`.
  pub shell_questions: usize,
  pub respondents:     usize,
  pub answer_options:  usize,
  pub responses:       usize,
}

// ─── Build ───────────────────────────────────────────────────────────────────

/// Create and fill `dim_questions`, `dim_respondents`, `dim_answer_options`
/// and `fact_responses`.
pub fn build_star_schema(
  tx:           &Transaction<'_>,
  demographics: &[String],
) -> rusqlite::Result<BuildReport> {
  let data_columns = table_columns(tx, "so_data")?;

  tx.execute_batch(&dim_respondents(demographics))?;
  tx.execute_batch(STAR_SCHEMA)?;

  let questions = build_questions(tx)?;
  let question_count = questions.len();
  let respondents = build_respondents(tx, demographics, &data_columns)?;

  let (present, shells): (Vec<Question>, Vec<Question>) = questions
    .into_iter()
    .partition(|q| data_columns.contains(&q.column_name));
  for q in &shells {
    tracing::debug!(column = %q.column_name, "question has no data column; keeping shell row");
  }

  // Phase 1: provisional (respondent, question, answer) triples.
  let choice: Vec<Question> = present
    .into_iter()
    .filter(|q| q.question_type.is_choice())
    .collect();
  let rows = read_raw_rows(tx, &choice)?;
  let provisional = pivot_responses(&choice, &rows);

  // Phase 2: derive option ids from realised answers and attach them.
  let star = assign_answer_options(provisional);
  insert_star_facts(tx, &star)?;

  Ok(BuildReport {
    questions: question_count,
    shell_questions: shells.len(),
    respondents,
    answer_options: star.answer_options.len(),
    responses: star.responses.len(),
  })
}

/// `question_id` follows `column_name` order.
fn build_questions(tx: &Transaction<'_>) -> rusqlite::Result<Vec<Question>> {
  tx.execute(
    "INSERT INTO dim_questions (question_id, column_name, question_text, type)
     SELECT ROW_NUMBER() OVER (ORDER BY \"column\"),
            \"column\",
            COALESCE(question_text, ''),
            COALESCE(type, '')
     FROM so_schema
     WHERE \"column\" IS NOT NULL",
    [],
  )?;

  let mut stmt = tx.prepare(
    "SELECT question_id, column_name, question_text, type
     FROM dim_questions
     ORDER BY question_id",
  )?;
  let questions = stmt
    .query_map([], |row| {
      Ok(Question {
        question_id:   row.get(0)?,
        column_name:   row.get(1)?,
        question_text: row.get(2)?,
        question_type: QuestionType::parse(&row.get::<_, String>(3)?),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(questions)
}

/// `respondent_id` follows the demographic columns in order, then raw row
/// order, which makes the ordering total.
fn build_respondents(
  tx:           &Transaction<'_>,
  demographics: &[String],
  data_columns: &HashSet<String>,
) -> rusqlite::Result<usize> {
  let mut targets = vec!["respondent_id".to_owned(), "raw_row".to_owned()];
  let mut values = Vec::new();
  let mut order = Vec::new();

  for column in demographics {
    targets.push(quote_ident(column));
    if data_columns.contains(column) {
      let source = format!("d.{}", quote_ident(column));
      order.push(source.clone());
      values.push(source);
    } else {
      tracing::warn!(%column, "demographic column not in data; carrying NULL");
      values.push("NULL".to_owned());
    }
  }
  order.push("d.rowid".to_owned());

  let mut select = vec![
    format!("ROW_NUMBER() OVER (ORDER BY {})", order.join(", ")),
    "d.rowid".to_owned(),
  ];
  select.extend(values);

  let sql = format!(
    "INSERT INTO dim_respondents ({}) SELECT {} FROM so_data d",
    targets.join(", "),
    select.join(", "),
  );
  tx.execute(&sql, [])
}

/// Read each respondent's raw cells for the given questions, keyed by column.
fn read_raw_rows(
  tx:        &Transaction<'_>,
  questions: &[Question],
) -> rusqlite::Result<Vec<RawRespondentRow>> {
  if questions.is_empty() {
    return Ok(Vec::new());
  }

  let columns: Vec<&str> = questions.iter().map(|q| q.column_name.as_str()).collect();
  let projection: Vec<String> = columns
    .iter()
    .map(|c| format!("d.{}", quote_ident(c)))
    .collect();
  let sql = format!(
    "SELECT r.respondent_id, {}
     FROM so_data d
     JOIN dim_respondents r ON r.raw_row = d.rowid
     ORDER BY r.respondent_id",
    projection.join(", "),
  );

  let mut stmt = tx.prepare(&sql)?;
  let rows = stmt
    .query_map([], |row| {
      let mut raw = RawRespondentRow::new(row.get(0)?);
      for (i, column) in columns.iter().enumerate() {
        raw.values.insert((*column).to_owned(), row.get(i + 1)?);
      }
      Ok(raw)
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn insert_star_facts(tx: &Transaction<'_>, star: &StarFacts) -> rusqlite::Result<()> {
  let mut insert_option = tx.prepare(
    "INSERT INTO dim_answer_options (answer_option_id, question_id, answer_value)
     VALUES (?1, ?2, ?3)",
  )?;
  for o in &star.answer_options {
    insert_option.execute(rusqlite::params![
      o.answer_option_id,
      o.question_id,
      o.answer_value,
    ])?;
  }

  let mut insert_response = tx.prepare(
    "INSERT INTO fact_responses (respondent_id, question_id, answer_option_id, answer_value)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for r in &star.responses {
    insert_response.execute(rusqlite::params![
      r.respondent_id,
      r.question_id,
      r.answer_option_id,
      r.answer_value,
    ])?;
  }
  Ok(())
}

/// Column names of `table` as declared.
fn table_columns(
  conn:  &rusqlite::Connection,
  table: &str,
) -> rusqlite::Result<HashSet<String>> {
  let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
  let names = stmt
    .query_map([table], |row| row.get(0))?
    .collect::<rusqlite::Result<HashSet<String>>>()?;
  Ok(names)
}
