//! Interactive menu loop.

use std::io::{BufRead, Write};

use anyhow::Context as _;
use tally_core::store::SurveyStore;

use crate::{commands, render::Format};

const CHOICES: &str = "\
Available Commands:
1. Display survey structure
2. Search questions/options
3. Get respondent subset
4. Show answer distribution
5. Exit";

/// Prompt for commands until the user exits or input runs out.
pub async fn run<S, R, W>(store: &S, format: Format, input: &mut R, out: &mut W) -> anyhow::Result<()>
where
  S: SurveyStore,
  R: BufRead,
  W: Write,
{
  loop {
    writeln!(out, "\n{CHOICES}")?;
    let Some(choice) = prompt(input, out, "Enter your choice (1-5)")? else {
      break;
    };

    match choice.trim() {
      "1" => commands::structure(store, format, out).await?,
      "2" => {
        let Some(term) = prompt(input, out, "Enter search term")? else { break };
        commands::search(store, format, &term, out).await?;
      }
      "3" => {
        let Some(column) = prompt(input, out, "Enter question column name")? else { break };
        let Some(answer) = prompt(input, out, "Enter answer option")? else { break };
        commands::subset(store, format, &column, &answer, None, out).await?;
      }
      "4" => {
        let Some(column) = prompt(input, out, "Enter question column name")? else { break };
        commands::distribution(store, format, &column, out).await?;
      }
      "5" => {
        writeln!(out, "Goodbye!")?;
        return Ok(());
      }
      other => writeln!(out, "Invalid choice {other:?}; enter a number from 1 to 5")?,
    }
  }
  Ok(())
}

/// Print `label`, read one line, and return it without the line ending.
/// Other whitespace is kept; answer matching is exact.
/// Returns `None` at end of input.
fn prompt<R: BufRead, W: Write>(
  input: &mut R,
  out:   &mut W,
  label: &str,
) -> anyhow::Result<Option<String>> {
  write!(out, "{label}: ")?;
  out.flush().ok();

  let mut line = String::new();
  let read = input.read_line(&mut line).context("reading from stdin")?;
  if read == 0 {
    return Ok(None);
  }
  Ok(Some(line.trim_end_matches(['\n', '\r']).to_owned()))
}

#[cfg(test)]
mod tests {
  use tally_store_sqlite::{BuildOptions, RawTable, SqliteStore};

  use super::*;

  async fn store() -> SqliteStore {
    let schema = "column,question_text,type\nRemoteWork,Do you work remotely?,SC\n";
    let data = "Age,RemoteWork\n25-34 years old,Remote\n35-44 years old,Hybrid\n";

    let s = SqliteStore::open_in_memory().await.unwrap();
    s.load_schema(&RawTable::from_reader(schema.as_bytes()).unwrap())
      .await
      .unwrap();
    s.load_data(RawTable::from_reader(data.as_bytes()).unwrap())
      .await
      .unwrap();
    s.build(&BuildOptions { demographic_columns: vec!["Age".into()] })
      .await
      .unwrap();
    s
  }

  async fn session(input: &str) -> String {
    let s = store().await;
    let mut out = Vec::new();
    run(&s, Format::Table, &mut input.as_bytes(), &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
  }

  #[tokio::test]
  async fn exit_immediately() {
    let out = session("5\n").await;
    assert!(out.contains("1. Display survey structure"));
    assert!(out.ends_with("Goodbye!\n"));
  }

  #[tokio::test]
  async fn end_of_input_exits() {
    let out = session("").await;
    assert!(!out.contains("Goodbye!"));
  }

  #[tokio::test]
  async fn structure_then_exit() {
    let out = session("1\n5\n").await;
    assert!(out.contains("Survey Structure"));
    assert!(out.contains("RemoteWork"));
  }

  #[tokio::test]
  async fn search_with_and_without_results() {
    let out = session("2\nremote\n2\nnonexistent_term_xyz\n5\n").await;
    assert!(out.contains("Search Results for 'remote'"));
    assert!(out.contains("No results found for 'nonexistent_term_xyz'"));
  }

  #[tokio::test]
  async fn subset_prompts_for_column_and_answer() {
    let out = session("3\nRemoteWork\nRemote\n5\n").await;
    assert!(out.contains("Respondents who answered 'Remote' for RemoteWork"));
    assert!(out.contains("Total: 1 respondents"));
    assert!(out.contains("25-34 years old"));
  }

  #[tokio::test]
  async fn distribution_of_unknown_column() {
    let out = session("4\nAge\n5\n").await;
    assert!(out.contains("No distribution data found for 'Age'"));
  }

  #[tokio::test]
  async fn invalid_choice_reprompts() {
    let out = session("9\n5\n").await;
    assert!(out.contains("Invalid choice \"9\""));
    assert!(out.contains("Goodbye!"));
  }
}
