//! [`SqliteStore`] — the SQLite implementation of [`SurveyStore`].

use std::{
  path::Path,
  sync::{Arc, OnceLock},
};

use rusqlite::{OptionalExtension as _, functions::FunctionFlags, types::ValueRef};
use tally_core::{
  query::{ColumnInfo, DistributionRow, SearchHit, TableRows, round_percentage},
  question::{Question, QuestionSummary, QuestionType},
  respondent::{Attribute, Respondent},
  store::SurveyStore,
};

use crate::{
  BuildOptions, Error, RawTable, Result,
  builder::{BuildReport, build_star_schema},
  schema::{SO_SCHEMA, quote_ident, raw_table},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An in-memory survey session.
///
/// Cloning is cheap; all clones share one connection. Once any clone calls
/// [`SqliteStore::close`], every remaining clone fails with
/// [`Error::Closed`].
#[derive(Clone)]
pub struct SqliteStore {
  conn:         tokio_rusqlite::Connection,
  /// Demographic columns of `dim_respondents`; set once the star schema is
  /// built.
  demographics: Arc<OnceLock<Vec<String>>>,
}

impl SqliteStore {
  /// Open an empty in-memory session.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, demographics: Arc::new(OnceLock::new()) };
    store.init_functions().await?;
    Ok(store)
  }

  /// Open a session, load both source files, and build the star schema.
  pub async fn from_csv(
    data_file:   &Path,
    schema_file: &Path,
    options:     &BuildOptions,
  ) -> Result<Self> {
    let schema = RawTable::read_csv(schema_file).await?;
    let data = RawTable::read_csv(data_file).await?;

    let store = Self::open_in_memory().await?;
    store.load_schema(&schema).await?;
    store.load_data(data).await?;
    store.build(options).await?;
    Ok(store)
  }

  /// Release the session. Other clones become unusable.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    tracing::debug!("survey session closed");
    Ok(())
  }

  /// `fold_case(text)`: Unicode lower-casing, used for case-insensitive
  /// search. SQLite's own `lower()` only folds ASCII.
  async fn init_functions(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.create_scalar_function(
          "fold_case",
          1,
          FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
          |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
          },
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Loading ───────────────────────────────────────────────────────────────

  /// Create `so_schema` from the schema source.
  pub async fn load_schema(&self, table: &RawTable) -> Result<()> {
    let rows = table.schema_rows()?;
    let count = rows.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(SO_SCHEMA)?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO so_schema (\"column\", question_text, type) VALUES (?1, ?2, ?3)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.column_name,
              row.question_text,
              row.question_type,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(questions = count, "loaded schema source");
    Ok(())
  }

  /// Create the wide `so_data` table, one text column per source column.
  pub async fn load_data(&self, table: RawTable) -> Result<()> {
    if table.columns.is_empty() {
      return Err(tally_core::Error::EmptyHeader("data source").into());
    }
    let count = table.rows.len();
    let ddl = raw_table("so_data", &table.columns);
    let placeholders: Vec<String> =
      (1..=table.columns.len()).map(|i| format!("?{i}")).collect();
    let insert = format!("INSERT INTO so_data VALUES ({})", placeholders.join(", "));

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(&ddl)?;
        {
          let mut stmt = tx.prepare(&insert)?;
          for row in &table.rows {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(respondents = count, "loaded data source");
    Ok(())
  }

  // ── Building ──────────────────────────────────────────────────────────────

  /// Derive the star schema from the loaded raw tables. Runs at most once
  /// per session.
  pub async fn build(&self, options: &BuildOptions) -> Result<BuildReport> {
    options.validate()?;
    if self.demographics.get().is_some() {
      return Err(Error::AlreadyBuilt);
    }

    let demographics = options.demographic_columns.clone();
    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let report = build_star_schema(&tx, &demographics)?;
        tx.commit()?;
        Ok(report)
      })
      .await?;

    self
      .demographics
      .set(options.demographic_columns.clone())
      .map_err(|_| Error::AlreadyBuilt)?;

    tracing::info!(
      questions = report.questions,
      shell_questions = report.shell_questions,
      respondents = report.respondents,
      answer_options = report.answer_options,
      responses = report.responses,
      "built star schema"
    );
    Ok(report)
  }

  fn ensure_built(&self) -> Result<()> {
    self.demographics.get().map(|_| ()).ok_or(Error::NotBuilt)
  }

  fn built_demographics(&self) -> Result<Vec<String>> {
    self.demographics.get().cloned().ok_or(Error::NotBuilt)
  }
}

// ─── SurveyStore impl ────────────────────────────────────────────────────────

impl SurveyStore for SqliteStore {
  type Error = Error;

  // ── Analytical queries ────────────────────────────────────────────────────

  async fn survey_structure(&self) -> Result<Vec<QuestionSummary>> {
    self.ensure_built()?;

    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT q.question_id, q.column_name, q.question_text, q.type,
                  COUNT(DISTINCT f.answer_value) AS num_answer_options
           FROM dim_questions q
           LEFT JOIN fact_responses f ON f.question_id = q.question_id
           GROUP BY q.question_id, q.column_name, q.question_text, q.type
           ORDER BY q.question_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(QuestionSummary {
              question:           Question {
                question_id:   row.get(0)?,
                column_name:   row.get(1)?,
                question_text: row.get(2)?,
                question_type: QuestionType::parse(&row.get::<_, String>(3)?),
              },
              num_answer_options: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn search_questions(&self, term: &str) -> Result<Vec<SearchHit>> {
    self.ensure_built()?;
    let needle = term.to_lowercase();

    let rows = self
      .conn
      .call(move |conn| {
        // instr() matches literally, so `%` and `_` in the term are not
        // wildcards.
        let mut stmt = conn.prepare(
          "SELECT q.question_id, q.column_name, q.question_text, q.type, o.answer_value
           FROM dim_questions q
           LEFT JOIN dim_answer_options o ON o.question_id = q.question_id
           WHERE instr(fold_case(q.question_text), ?1) > 0
              OR instr(fold_case(q.column_name),   ?1) > 0
              OR instr(fold_case(o.answer_value),  ?1) > 0
           ORDER BY q.question_id, o.answer_value",
        )?;
        let rows = stmt
          .query_map([needle], |row| {
            Ok(SearchHit {
              question_id:   row.get(0)?,
              column_name:   row.get(1)?,
              question_text: row.get(2)?,
              question_type: QuestionType::parse(&row.get::<_, String>(3)?),
              answer_value:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn respondent_subset(
    &self,
    column_name:  &str,
    answer_value: &str,
  ) -> Result<Vec<Respondent>> {
    let demographics = self.built_demographics()?;
    let column_name = column_name.to_owned();
    let answer_value = answer_value.to_owned();

    let projection: String = demographics
      .iter()
      .map(|d| format!(", r.{}", quote_ident(d)))
      .collect();
    let sql = format!(
      "SELECT DISTINCT r.respondent_id{projection}
       FROM fact_responses f
       JOIN dim_questions   q ON q.question_id   = f.question_id
       JOIN dim_respondents r ON r.respondent_id = f.respondent_id
       WHERE q.column_name = ?1
         AND f.answer_value = ?2
       ORDER BY r.respondent_id"
    );

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![column_name, answer_value], |row| {
            let mut attributes = Vec::with_capacity(demographics.len());
            for (i, name) in demographics.iter().enumerate() {
              attributes.push(Attribute { name: name.clone(), value: row.get(i + 1)? });
            }
            Ok(Respondent { respondent_id: row.get(0)?, attributes })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn answer_distribution(&self, column_name: &str) -> Result<Vec<DistributionRow>> {
    let Some(question) = self.question(column_name).await? else {
      return Ok(Vec::new());
    };
    if !question.question_type.is_choice() {
      return Ok(Vec::new());
    }

    let question_id = question.question_id;
    let (counts, respondents): (Vec<(String, u64)>, u64) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT answer_value, COUNT(*) AS response_count
           FROM fact_responses
           WHERE question_id = ?1
           GROUP BY answer_value
           ORDER BY response_count DESC, answer_value",
        )?;
        let counts: Vec<(String, u64)> = stmt
          .query_map([question_id], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<_>>()?;

        let respondents: u64 = conn.query_row(
          "SELECT COUNT(DISTINCT respondent_id) FROM fact_responses WHERE question_id = ?1",
          [question_id],
          |row| row.get(0),
        )?;
        Ok((counts, respondents))
      })
      .await?;

    // SC: share of respondents who answered. MC: share of all selections.
    let denominator = match question.question_type {
      QuestionType::SingleChoice => respondents,
      _ => counts.iter().map(|(_, n)| n).sum(),
    };

    Ok(
      counts
        .into_iter()
        .map(|(answer_value, response_count)| DistributionRow {
          answer_value,
          response_count,
          question_type: question.question_type.clone(),
          percentage: round_percentage(response_count, denominator),
        })
        .collect(),
    )
  }

  // ── Inspection ────────────────────────────────────────────────────────────

  async fn question(&self, column_name: &str) -> Result<Option<Question>> {
    self.ensure_built()?;
    let column_name = column_name.to_owned();

    let question = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT question_id, column_name, question_text, type
               FROM dim_questions
               WHERE column_name = ?1",
              [column_name],
              |row| {
                Ok(Question {
                  question_id:   row.get(0)?,
                  column_name:   row.get(1)?,
                  question_text: row.get(2)?,
                  question_type: QuestionType::parse(&row.get::<_, String>(3)?),
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(question)
  }

  async fn list_tables(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn table_info(&self, table: &str) -> Result<Vec<ColumnInfo>> {
    let table = table.to_owned();

    let columns = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
          .query_map([table], |row| {
            Ok(ColumnInfo { column_name: row.get(0)?, column_type: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
      })
      .await?;
    Ok(columns)
  }

  async fn row_count(&self, table: &str) -> Result<u64> {
    let name = table.to_owned();

    let count: Option<u64> = self
      .conn
      .call(move |conn| {
        if !table_exists(conn, &name)? {
          return Ok(None);
        }

        let count = conn.query_row(
          &format!("SELECT COUNT(*) FROM {}", quote_ident(&name)),
          [],
          |row| row.get(0),
        )?;
        Ok(Some(count))
      })
      .await?;

    count.ok_or_else(|| Error::UnknownTable(table.to_owned()))
  }

  async fn table_rows(&self, table: &str, limit: Option<usize>) -> Result<TableRows> {
    let name = table.to_owned();
    // SQLite reads a negative LIMIT as "no limit".
    let limit = limit.and_then(|n| i64::try_from(n).ok()).unwrap_or(-1);

    let rows = self
      .conn
      .call(move |conn| {
        if !table_exists(conn, &name)? {
          return Ok(None);
        }

        let mut stmt = conn.prepare(&format!(
          "SELECT * FROM {} ORDER BY rowid LIMIT ?1",
          quote_ident(&name)
        ))?;
        let columns: Vec<String> =
          stmt.column_names().into_iter().map(str::to_owned).collect();
        let width = columns.len();
        let rows = stmt
          .query_map([limit], |row| {
            (0..width)
              .map(|i| row.get_ref(i).map(cell_text))
              .collect::<rusqlite::Result<Vec<_>>>()
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(TableRows { columns, rows }))
      })
      .await?;

    rows.ok_or_else(|| Error::UnknownTable(table.to_owned()))
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn table_exists(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Render one SQLite value as text; NULL stays `None`.
fn cell_text(value: ValueRef<'_>) -> Option<String> {
  match value {
    ValueRef::Null => None,
    ValueRef::Integer(i) => Some(i.to_string()),
    ValueRef::Real(f) => Some(f.to_string()),
    ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => Some(format!("<{} bytes>", b.len())),
  }
}
