//! Plain-text and JSON rendering of query results.
//!
//! Every renderer writes to an `impl Write` so output can be captured in
//! tests. Empty results print a one-line notice instead of an empty table.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;
use tally_core::{
  query::{ColumnInfo, DistributionRow, SearchHit, TableRows},
  question::QuestionSummary,
  respondent::Respondent,
};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
  #[default]
  Table,
  Json,
}

/// Respondents shown before the subset table is cut off, unless the caller
/// asks for a different number.
pub const SUBSET_PREVIEW: usize = 20;

/// Rows shown by `peek` when no limit is given.
pub const PEEK_ROWS: usize = 10;

const PEEK_WIDTH: usize = 20;

const BAR_WIDTH: usize = 25;

// ─── Layout helpers ──────────────────────────────────────────────────────────

/// Truncate `text` to at most `width` characters, marking the cut with `...`.
pub fn fit(text: &str, width: usize) -> String {
  if text.chars().count() <= width {
    return text.to_owned();
  }
  let keep = width.saturating_sub(3);
  let mut out: String = text.chars().take(keep).collect();
  out.push_str("...");
  out
}

/// A `count / max` bar of [`BAR_WIDTH`] cells.
pub fn bar(count: u64, max: u64) -> String {
  let filled = if max == 0 {
    0
  } else {
    ((count as f64 / max as f64) * BAR_WIDTH as f64) as usize
  }
  .min(BAR_WIDTH);
  format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

struct Table {
  widths: Vec<usize>,
}

impl Table {
  fn new(widths: &[usize]) -> Self { Self { widths: widths.to_vec() } }

  fn row<W: Write>(&self, out: &mut W, cells: &[&str]) -> io::Result<()> {
    let line: Vec<String> = cells
      .iter()
      .zip(&self.widths)
      .map(|(cell, width)| format!("{:<width$}", fit(cell, *width), width = *width))
      .collect();
    writeln!(out, "{}", line.join("  ").trim_end())
  }

  fn rule<W: Write>(&self, out: &mut W) -> io::Result<()> {
    let line: Vec<String> = self.widths.iter().map(|w| "─".repeat(*w)).collect();
    writeln!(out, "{}", line.join("  "))
  }

  fn header<W: Write>(&self, out: &mut W, cells: &[&str]) -> io::Result<()> {
    self.row(out, cells)?;
    self.rule(out)
  }
}

// ─── Renderers ───────────────────────────────────────────────────────────────

pub fn json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
  serde_json::to_writer_pretty(&mut *out, value)?;
  writeln!(out)
}

pub fn structure<W: Write>(out: &mut W, rows: &[QuestionSummary]) -> io::Result<()> {
  writeln!(out, "Survey Structure")?;
  let table = Table::new(&[4, 25, 4, 9, 80]);
  table.header(out, &["ID", "Column", "Type", "# Options", "Question Text"])?;
  for row in rows {
    let q = &row.question;
    table.row(out, &[
      &q.question_id.to_string(),
      &q.column_name,
      q.question_type.as_str(),
      &row.num_answer_options.to_string(),
      &q.question_text,
    ])?;
  }
  Ok(())
}

pub fn search<W: Write>(out: &mut W, term: &str, hits: &[SearchHit]) -> io::Result<()> {
  if hits.is_empty() {
    return writeln!(out, "No results found for '{term}'");
  }

  writeln!(out, "Search Results for '{term}'")?;
  let table = Table::new(&[4, 25, 4, 30, 60]);
  table.header(out, &["Q ID", "Column", "Type", "Answer Option", "Question Text"])?;
  for hit in hits {
    table.row(out, &[
      &hit.question_id.to_string(),
      &hit.column_name,
      hit.question_type.as_str(),
      hit.answer_value.as_deref().unwrap_or(""),
      &hit.question_text,
    ])?;
  }
  Ok(())
}

pub fn subset<W: Write>(
  out:          &mut W,
  column_name:  &str,
  answer_value: &str,
  respondents:  &[Respondent],
  preview:      usize,
) -> io::Result<()> {
  let Some(first) = respondents.first() else {
    return writeln!(out, "No respondents found for {column_name} = '{answer_value}'");
  };

  writeln!(out, "Respondents who answered '{answer_value}' for {column_name}")?;
  writeln!(out, "Total: {} respondents", respondents.len())?;

  let mut widths = vec![6];
  widths.extend(first.attributes.iter().map(|_| 20));
  let table = Table::new(&widths);

  let mut header = vec!["ID"];
  header.extend(first.attributes.iter().map(|a| a.name.as_str()));
  table.header(out, &header)?;

  for r in respondents.iter().take(preview) {
    let id = r.respondent_id.to_string();
    let mut cells = vec![id.as_str()];
    cells.extend(r.attributes.iter().map(|a| a.value.as_deref().unwrap_or("N/A")));
    table.row(out, &cells)?;
  }

  if respondents.len() > preview {
    writeln!(out, "... and {} more respondents", respondents.len() - preview)?;
  }
  Ok(())
}

pub fn distribution<W: Write>(
  out:         &mut W,
  column_name: &str,
  rows:        &[DistributionRow],
) -> io::Result<()> {
  let Some(first) = rows.first() else {
    return writeln!(out, "No distribution data found for '{column_name}'");
  };

  writeln!(out, "Answer Distribution for {column_name} ({})", first.question_type)?;
  let table = Table::new(&[40, 8, 10, BAR_WIDTH]);
  table.header(out, &["Answer", "Count", "Percentage", "Bar"])?;

  let max = rows.iter().map(|r| r.response_count).max().unwrap_or(0);
  for row in rows {
    table.row(out, &[
      &row.answer_value,
      &row.response_count.to_string(),
      &format!("{:.1}%", row.percentage),
      &bar(row.response_count, max),
    ])?;
  }
  Ok(())
}

pub fn tables<W: Write>(out: &mut W, tables: &[(String, u64)]) -> io::Result<()> {
  let table = Table::new(&[24, 10]);
  table.header(out, &["Table", "Rows"])?;
  for (name, rows) in tables {
    table.row(out, &[name, &rows.to_string()])?;
  }
  Ok(())
}

/// Raw rows of one table, every column at a fixed width.
pub fn table_rows<W: Write>(out: &mut W, name: &str, rows: &TableRows) -> io::Result<()> {
  if rows.rows.is_empty() {
    return writeln!(out, "No rows in '{name}'");
  }

  let table = Table::new(&vec![PEEK_WIDTH; rows.columns.len()]);
  let header: Vec<&str> = rows.columns.iter().map(String::as_str).collect();
  table.header(out, &header)?;
  for row in &rows.rows {
    let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("NULL")).collect();
    table.row(out, &cells)?;
  }
  Ok(())
}

pub fn table_info<W: Write>(out: &mut W, name: &str, columns: &[ColumnInfo]) -> io::Result<()> {
  if columns.is_empty() {
    return writeln!(out, "No such table '{name}'");
  }
  let table = Table::new(&[30, 10]);
  table.header(out, &["Column", "Type"])?;
  for c in columns {
    table.row(out, &[&c.column_name, &c.column_type])?;
  }
  Ok(())
}
