//! One function per user-facing command, shared by the subcommands and the
//! interactive menu.

use std::io::Write;

use tally_core::store::SurveyStore;

use crate::render::{self, Format};

pub async fn structure<S: SurveyStore, W: Write>(
  store:  &S,
  format: Format,
  out:    &mut W,
) -> anyhow::Result<()> {
  let rows = store.survey_structure().await?;
  match format {
    Format::Table => render::structure(out, &rows)?,
    Format::Json => render::json(out, &rows)?,
  }
  Ok(())
}

pub async fn search<S: SurveyStore, W: Write>(
  store:  &S,
  format: Format,
  term:   &str,
  out:    &mut W,
) -> anyhow::Result<()> {
  let hits = store.search_questions(term).await?;
  tracing::debug!(term, hits = hits.len(), "search");
  match format {
    Format::Table => render::search(out, term, &hits)?,
    Format::Json => render::json(out, &hits)?,
  }
  Ok(())
}

/// `limit` caps the JSON rows and the table preview alike. The table still
/// reports the full total.
pub async fn subset<S: SurveyStore, W: Write>(
  store:        &S,
  format:       Format,
  column_name:  &str,
  answer_value: &str,
  limit:        Option<usize>,
  out:          &mut W,
) -> anyhow::Result<()> {
  let mut respondents = store.respondent_subset(column_name, answer_value).await?;
  tracing::debug!(column_name, answer_value, respondents = respondents.len(), "subset");
  match format {
    Format::Table => {
      let preview = limit.unwrap_or(render::SUBSET_PREVIEW);
      render::subset(out, column_name, answer_value, &respondents, preview)?
    }
    Format::Json => {
      if let Some(limit) = limit {
        respondents.truncate(limit);
      }
      render::json(out, &respondents)?
    }
  }
  Ok(())
}

pub async fn distribution<S: SurveyStore, W: Write>(
  store:       &S,
  format:      Format,
  column_name: &str,
  out:         &mut W,
) -> anyhow::Result<()> {
  let rows = store.answer_distribution(column_name).await?;
  match format {
    Format::Table => render::distribution(out, column_name, &rows)?,
    Format::Json => render::json(out, &rows)?,
  }
  Ok(())
}

pub async fn tables<S: SurveyStore, W: Write>(
  store:  &S,
  format: Format,
  out:    &mut W,
) -> anyhow::Result<()> {
  let mut counts = Vec::new();
  for name in store.list_tables().await? {
    let rows = store.row_count(&name).await?;
    counts.push((name, rows));
  }
  match format {
    Format::Table => render::tables(out, &counts)?,
    Format::Json => render::json(out, &counts)?,
  }
  Ok(())
}

pub async fn info<S: SurveyStore, W: Write>(
  store:  &S,
  format: Format,
  table:  &str,
  out:    &mut W,
) -> anyhow::Result<()> {
  let columns = store.table_info(table).await?;
  match format {
    Format::Table => render::table_info(out, table, &columns)?,
    Format::Json => render::json(out, &columns)?,
  }
  Ok(())
}

pub async fn peek<S: SurveyStore, W: Write>(
  store:  &S,
  format: Format,
  table:  &str,
  limit:  Option<usize>,
  out:    &mut W,
) -> anyhow::Result<()> {
  let rows = store
    .table_rows(table, Some(limit.unwrap_or(render::PEEK_ROWS)))
    .await?;
  match format {
    Format::Table => render::table_rows(out, table, &rows)?,
    Format::Json => render::json(out, &rows)?,
  }
  Ok(())
}
