//! SQL schema for the Tally SQLite session.
//!
//! The raw tables mirror the source files; the star tables are created once
//! by the builder. `dim_respondents` has one column per configured
//! demographic, so its DDL is generated at build time.

/// Raw schema source: one row per question.
pub const SO_SCHEMA: &str = "
CREATE TABLE so_schema (
    \"column\"      TEXT,
    question_text TEXT,
    type          TEXT
);
";

/// Fixed star-schema tables.
pub const STAR_SCHEMA: &str = "
CREATE TABLE dim_questions (
    question_id   INTEGER PRIMARY KEY,
    column_name   TEXT NOT NULL UNIQUE,
    question_text TEXT NOT NULL,
    type          TEXT NOT NULL    -- 'SC' | 'MC' | anything else, passed through
);

-- Only realised answers; never enumerated from the schema.
CREATE TABLE dim_answer_options (
    answer_option_id INTEGER PRIMARY KEY,
    question_id      INTEGER NOT NULL REFERENCES dim_questions(question_id),
    answer_value     TEXT NOT NULL,
    UNIQUE (question_id, answer_value)
);

-- One row per (respondent, question, selected value).
CREATE TABLE fact_responses (
    respondent_id    INTEGER NOT NULL REFERENCES dim_respondents(respondent_id),
    question_id      INTEGER NOT NULL REFERENCES dim_questions(question_id),
    answer_option_id INTEGER NOT NULL REFERENCES dim_answer_options(answer_option_id),
    answer_value     TEXT NOT NULL
);

CREATE INDEX fact_responses_question_idx   ON fact_responses(question_id, answer_value);
CREATE INDEX fact_responses_respondent_idx ON fact_responses(respondent_id);
";

/// Columns of `dim_respondents` that are not demographics.
pub const RESPONDENT_KEY_COLUMNS: &[&str] = &["respondent_id", "raw_row"];

/// DDL for `dim_respondents` with the given demographic columns.
///
/// `raw_row` holds the `so_data` rowid the respondent was derived from.
pub fn dim_respondents(demographics: &[String]) -> String {
  let mut columns = vec![
    "respondent_id INTEGER PRIMARY KEY".to_owned(),
    "raw_row INTEGER NOT NULL UNIQUE".to_owned(),
  ];
  columns.extend(demographics.iter().map(|d| format!("{} TEXT", quote_ident(d))));
  format!("CREATE TABLE dim_respondents (\n    {}\n);", columns.join(",\n    "))
}

/// DDL for a raw table whose columns are all nullable text.
pub fn raw_table(name: &str, columns: &[String]) -> String {
  let columns: Vec<String> = columns
    .iter()
    .map(|c| format!("{} TEXT", quote_ident(c)))
    .collect();
  format!("CREATE TABLE {} ({});", quote_ident(name), columns.join(", "))
}

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}
