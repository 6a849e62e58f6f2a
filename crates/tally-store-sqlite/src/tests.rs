//! Integration tests for `SqliteStore` against in-memory sessions.

use std::io::Write as _;

use tally_core::{question::QuestionType, store::SurveyStore};

use crate::{BuildOptions, Error, RawTable, SqliteStore};

const SCHEMA_CSV: &str = "\
column,question_text,type
RemoteWork,Do you work remotely?,SC
LanguageHaveWorkedWith,Which programming languages have you worked with?,MC
Age,What is your age?,SC
Comments,Any other comments?,TE
Ghost,A question with no data column,SC
";

const DATA_CSV: &str = "\
MainBranch,Age,Country,RemoteWork,LanguageHaveWorkedWith,Comments
I am a developer by profession,25-34 years old,Germany,Remote,Python;Go;NA,
I am a developer by profession,35-44 years old,Canada,Hybrid,Go; Rust,Great survey
I am learning to code,18-24 years old,Germany,,NA,
";

fn demographics() -> BuildOptions {
  BuildOptions {
    demographic_columns: vec!["MainBranch".into(), "Age".into(), "Country".into()],
  }
}

async fn store_with(schema: &str, data: &str, options: &BuildOptions) -> SqliteStore {
  let s = SqliteStore::open_in_memory().await.expect("in-memory store");
  s.load_schema(&RawTable::from_reader(schema.as_bytes()).unwrap())
    .await
    .unwrap();
  s.load_data(RawTable::from_reader(data.as_bytes()).unwrap())
    .await
    .unwrap();
  s.build(options).await.unwrap();
  s
}

async fn store() -> SqliteStore { store_with(SCHEMA_CSV, DATA_CSV, &demographics()).await }

// ─── Build ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn build_reports_row_counts() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  s.load_schema(&RawTable::from_reader(SCHEMA_CSV.as_bytes()).unwrap())
    .await
    .unwrap();
  s.load_data(RawTable::from_reader(DATA_CSV.as_bytes()).unwrap())
    .await
    .unwrap();

  let report = s.build(&demographics()).await.unwrap();
  assert_eq!(report.questions, 5);
  assert_eq!(report.shell_questions, 1);
  assert_eq!(report.respondents, 3);
  // Age 3 + Language 3 + RemoteWork 2
  assert_eq!(report.answer_options, 8);
  // Age 3 + Language 4 + RemoteWork 2
  assert_eq!(report.responses, 9);

  assert_eq!(s.row_count("dim_questions").await.unwrap(), 5);
  assert_eq!(s.row_count("dim_respondents").await.unwrap(), 3);
  assert_eq!(s.row_count("dim_answer_options").await.unwrap(), 8);
  assert_eq!(s.row_count("fact_responses").await.unwrap(), 9);
}

#[tokio::test]
async fn build_twice_is_rejected() {
  let s = store().await;
  let err = s.build(&demographics()).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyBuilt));
}

#[tokio::test]
async fn queries_before_build_are_rejected() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  let err = s.survey_structure().await.unwrap_err();
  assert!(matches!(err, Error::NotBuilt));
}

#[tokio::test]
async fn failed_build_leaves_no_star_tables() {
  let schema = "column,question_text,type\nAge,first,SC\nAge,second,SC\n";
  let s = SqliteStore::open_in_memory().await.unwrap();
  s.load_schema(&RawTable::from_reader(schema.as_bytes()).unwrap())
    .await
    .unwrap();
  s.load_data(RawTable::from_reader(DATA_CSV.as_bytes()).unwrap())
    .await
    .unwrap();

  let err = s.build(&demographics()).await.unwrap_err();
  assert!(matches!(err, Error::Database(_)));

  let tables = s.list_tables().await.unwrap();
  assert_eq!(tables, ["so_data", "so_schema"]);
}

#[tokio::test]
async fn reserved_demographic_name_is_rejected() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  for name in ["respondent_id", "raw_row"] {
    let options = BuildOptions { demographic_columns: vec![name.into()] };
    let err = s.build(&options).await.unwrap_err();
    assert!(matches!(err, Error::ReservedColumn(ref c) if c == name));
  }
}

#[tokio::test]
async fn repeated_demographic_name_is_rejected() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  let options = BuildOptions { demographic_columns: vec!["Age".into(), "Age".into()] };
  let err = s.build(&options).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateColumn { .. }));
}

#[tokio::test]
async fn respondent_ids_follow_demographic_order() {
  let s = store().await;
  let all: Vec<_> = s
    .respondent_subset("RemoteWork", "Remote")
    .await
    .unwrap()
    .into_iter()
    .chain(s.respondent_subset("RemoteWork", "Hybrid").await.unwrap())
    .collect();

  assert_eq!(all[0].respondent_id, 1);
  assert_eq!(all[0].get("Age"), Some("25-34 years old"));
  assert_eq!(all[1].respondent_id, 2);
  assert_eq!(all[1].get("Age"), Some("35-44 years old"));
}

// ─── Structure ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn structure_counts_distinct_answers() {
  let s = store().await;
  let structure = s.survey_structure().await.unwrap();

  let summary: Vec<_> = structure
    .iter()
    .map(|q| {
      (q.question.question_id, q.question.column_name.as_str(), q.num_answer_options)
    })
    .collect();
  assert_eq!(
    summary,
    [
      (1, "Age", 3),
      (2, "Comments", 0),
      (3, "Ghost", 0),
      (4, "LanguageHaveWorkedWith", 3),
      (5, "RemoteWork", 2),
    ]
  );

  let comments = &structure[1].question;
  assert_eq!(comments.question_type, QuestionType::Other("TE".into()));
}

#[tokio::test]
async fn question_lookup() {
  let s = store().await;
  let q = s.question("RemoteWork").await.unwrap().unwrap();
  assert_eq!(q.question_text, "Do you work remotely?");
  assert_eq!(q.question_type, QuestionType::SingleChoice);

  assert!(s.question("remotework").await.unwrap().is_none());
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_matches_column_and_text() {
  let s = store().await;
  let hits = s.search_questions("remote").await.unwrap();

  let got: Vec<_> = hits
    .iter()
    .map(|h| (h.column_name.as_str(), h.answer_value.as_deref()))
    .collect();
  assert_eq!(got, [("RemoteWork", Some("Hybrid")), ("RemoteWork", Some("Remote"))]);
}

#[tokio::test]
async fn search_matches_answer_values_case_insensitively() {
  let s = store().await;
  let hits = s.search_questions("RUST").await.unwrap();

  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].column_name, "LanguageHaveWorkedWith");
  assert_eq!(hits[0].answer_value.as_deref(), Some("Rust"));
}

#[tokio::test]
async fn search_question_without_answers_has_null_answer() {
  let s = store().await;
  let hits = s.search_questions("ghost").await.unwrap();

  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].question_id, 3);
  assert_eq!(hits[0].answer_value, None);
}

#[tokio::test]
async fn search_with_no_match_is_empty() {
  let s = store().await;
  assert!(s.search_questions("nonexistent_term_xyz").await.unwrap().is_empty());
  assert!(s.search_questions("%").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_with_empty_term_returns_everything() {
  let s = store().await;
  let hits = s.search_questions("").await.unwrap();

  // 3 + 1 + 1 + 3 + 2: every option, plus one row per question without any.
  assert_eq!(hits.len(), 10);
  let ids: Vec<_> = hits.iter().map(|h| h.question_id).collect();
  let mut sorted = ids.clone();
  sorted.sort();
  assert_eq!(ids, sorted);
}

// ─── Subset ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn subset_exact_match() {
  let s = store().await;
  let subset = s.respondent_subset("RemoteWork", "Remote").await.unwrap();

  assert_eq!(subset.len(), 1);
  assert_eq!(subset[0].respondent_id, 1);
  assert_eq!(subset[0].get("Country"), Some("Germany"));
  assert_eq!(subset[0].attributes.len(), 3);
}

#[tokio::test]
async fn subset_is_case_sensitive() {
  let s = store().await;
  assert!(s.respondent_subset("RemoteWork", "remote").await.unwrap().is_empty());
  assert!(s.respondent_subset("RemoteWork", "Rem").await.unwrap().is_empty());
}

#[tokio::test]
async fn subset_unknown_column_is_empty() {
  let s = store().await;
  assert!(s.respondent_subset("Nope", "Remote").await.unwrap().is_empty());
  assert!(s.respondent_subset("Comments", "Great survey").await.unwrap().is_empty());
}

#[tokio::test]
async fn subset_on_multiple_choice_option() {
  let s = store().await;
  let ids: Vec<_> = s
    .respondent_subset("LanguageHaveWorkedWith", "Go")
    .await
    .unwrap()
    .iter()
    .map(|r| r.respondent_id)
    .collect();
  assert_eq!(ids, [1, 2]);

  // Pieces are trimmed: " Rust" was stored as "Rust".
  let rust = s
    .respondent_subset("LanguageHaveWorkedWith", "Rust")
    .await
    .unwrap();
  assert_eq!(rust.len(), 1);
}

#[tokio::test]
async fn subset_deduplicates_repeated_selection() {
  let schema = "column,question_text,type\nLang,Languages?,MC\n";
  let data = "Age,Lang\n30,Go;Go\n";
  let options = BuildOptions { demographic_columns: vec!["Age".into()] };
  let s = store_with(schema, data, &options).await;

  assert_eq!(s.row_count("fact_responses").await.unwrap(), 2);
  assert_eq!(s.row_count("dim_answer_options").await.unwrap(), 1);
  assert_eq!(s.respondent_subset("Lang", "Go").await.unwrap().len(), 1);
}

// ─── Distribution ────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_choice_distribution() {
  let s = store().await;
  let dist = s.answer_distribution("RemoteWork").await.unwrap();

  assert_eq!(dist.len(), 2);
  assert!(dist.iter().all(|d| d.percentage == 50.0));
  assert!(dist.iter().all(|d| d.response_count == 1));
  assert!(dist.iter().all(|d| d.question_type == QuestionType::SingleChoice));
}

#[tokio::test]
async fn single_choice_percentages_sum_to_hundred() {
  let s = store().await;
  let dist = s.answer_distribution("Age").await.unwrap();

  let total: u64 = dist.iter().map(|d| d.response_count).sum();
  assert_eq!(total, 3);

  let sum: f64 = dist.iter().map(|d| d.percentage).sum();
  assert!((sum - 100.0).abs() <= 1.0, "sum was {sum}");
}

#[tokio::test]
async fn multiple_choice_distribution_uses_selections() {
  let s = store().await;
  let dist = s.answer_distribution("LanguageHaveWorkedWith").await.unwrap();

  let got: Vec<_> = dist
    .iter()
    .map(|d| (d.answer_value.as_str(), d.response_count, d.percentage))
    .collect();
  assert_eq!(got, [("Go", 2, 50.0), ("Python", 1, 25.0), ("Rust", 1, 25.0)]);
}

#[tokio::test]
async fn multiple_choice_percentages_can_exceed_respondent_share() {
  let schema = "column,question_text,type\nLang,Languages?,MC\n";
  let data = "Age,Lang\n30,Go;Rust\n40,Go\n";
  let options = BuildOptions { demographic_columns: vec!["Age".into()] };
  let s = store_with(schema, data, &options).await;

  let dist = s.answer_distribution("Lang").await.unwrap();
  // Go was picked by every respondent but is 2 of 3 selections.
  assert_eq!(dist[0].answer_value, "Go");
  assert_eq!(dist[0].percentage, 66.67);
}

#[tokio::test]
async fn distribution_of_unsupported_or_unknown_is_empty() {
  let s = store().await;
  assert!(s.answer_distribution("Comments").await.unwrap().is_empty());
  assert!(s.answer_distribution("Ghost").await.unwrap().is_empty());
  assert!(s.answer_distribution("Nope").await.unwrap().is_empty());
}

// ─── Inspection ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn lists_raw_and_star_tables() {
  let s = store().await;
  let tables = s.list_tables().await.unwrap();
  assert_eq!(
    tables,
    [
      "dim_answer_options",
      "dim_questions",
      "dim_respondents",
      "fact_responses",
      "so_data",
      "so_schema",
    ]
  );
}

#[tokio::test]
async fn table_info_describes_columns() {
  let s = store().await;

  let info = s.table_info("so_schema").await.unwrap();
  let names: Vec<_> = info.iter().map(|c| c.column_name.as_str()).collect();
  assert_eq!(names, ["column", "question_text", "type"]);
  assert!(info.iter().all(|c| c.column_type == "TEXT"));

  assert!(s.table_info("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn schema_table_reads_back_as_loaded() {
  let s = store().await;
  let t = s.table_rows("so_schema", None).await.unwrap();

  assert_eq!(t.columns, ["column", "question_text", "type"]);
  assert_eq!(t.rows.len(), 5);
  assert_eq!(t.cell(0, "column"), Some("RemoteWork"));
  assert_eq!(t.cell(0, "question_text"), Some("Do you work remotely?"));
  assert_eq!(t.cell(0, "type"), Some("SC"));
  assert_eq!(t.cell(4, "column"), Some("Ghost"));
}

#[tokio::test]
async fn data_table_keeps_raw_cells() {
  let s = store().await;
  let t = s.table_rows("so_data", Some(2)).await.unwrap();

  assert_eq!(t.columns.len(), 6);
  assert_eq!(t.rows.len(), 2);
  assert_eq!(t.cell(0, "LanguageHaveWorkedWith"), Some("Python;Go;NA"));
  // Empty CSV cells were loaded as NULL.
  assert_eq!(t.cell(0, "Comments"), None);
  assert_eq!(t.cell(1, "Comments"), Some("Great survey"));
}

#[tokio::test]
async fn star_table_values_render_as_text() {
  let s = store().await;
  let t = s.table_rows("dim_questions", Some(1)).await.unwrap();
  assert_eq!(t.cell(0, "question_id"), Some("1"));
  assert_eq!(t.cell(0, "column_name"), Some("Age"));
}

#[tokio::test]
async fn rows_of_unknown_table() {
  let s = store().await;
  let err = s.table_rows("missing", None).await.unwrap_err();
  assert!(matches!(err, Error::UnknownTable(ref t) if t == "missing"));
}

#[tokio::test]
async fn row_count_of_unknown_table() {
  let s = store().await;
  let err = s.row_count("missing").await.unwrap_err();
  assert!(matches!(err, Error::UnknownTable(t) if t == "missing"));
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn use_after_close_fails() {
  let s = store().await;
  let other = s.clone();
  s.close().await.unwrap();

  let err = other.survey_structure().await.unwrap_err();
  assert!(matches!(err, Error::Closed));
}

#[tokio::test]
async fn from_csv_files() {
  let mut schema = tempfile::NamedTempFile::new().unwrap();
  schema.write_all(SCHEMA_CSV.as_bytes()).unwrap();
  let mut data = tempfile::NamedTempFile::new().unwrap();
  data.write_all(DATA_CSV.as_bytes()).unwrap();

  let s = SqliteStore::from_csv(data.path(), schema.path(), &BuildOptions::default())
    .await
    .unwrap();

  let subset = s.respondent_subset("RemoteWork", "Remote").await.unwrap();
  assert_eq!(subset.len(), 1);
  // Configured but absent from the data: carried as NULL.
  assert_eq!(subset[0].get("Employment"), None);
  assert_eq!(subset[0].get("RemoteWork"), Some("Remote"));
  s.close().await.unwrap();
}

#[tokio::test]
async fn from_csv_missing_file() {
  let schema = tempfile::NamedTempFile::new().unwrap();
  let dir = tempfile::tempdir().unwrap();
  let missing = dir.path().join("nope.csv");

  let Err(err) =
    SqliteStore::from_csv(&missing, schema.path(), &BuildOptions::default()).await
  else {
    panic!("expected missing data file to fail");
  };
  assert!(matches!(err, Error::Io { ref path, .. } if *path == missing));
}
