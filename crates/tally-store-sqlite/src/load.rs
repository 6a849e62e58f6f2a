//! Raw table ingestion: CSV source files → in-memory tables.
//!
//! Every cell is kept as text. Empty cells become NULL, so the builder sees
//! the same "missing" value whether the export left a cell blank or not.

use std::{collections::HashSet, io::Read, path::Path};

use tally_core::question::{RawSchemaRow, SchemaHeader};

use crate::{Error, Result};

/// A fully materialised CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
  pub columns: Vec<String>,
  pub rows:    Vec<Vec<Option<String>>>,
}

impl RawTable {
  /// Read a CSV file from disk.
  pub async fn read_csv(path: &Path) -> Result<Self> {
    let bytes = tokio::fs::read(path).await.map_err(|source| Error::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_reader(bytes.as_slice())
  }

  /// Parse CSV from any reader. The first record is the header.
  ///
  /// Rows must have as many fields as the header; a ragged or otherwise
  /// malformed file is rejected rather than partially loaded.
  pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
    let mut reader = csv::ReaderBuilder::new()
      .has_headers(true)
      .flexible(false)
      .from_reader(reader);

    let columns: Vec<String> = reader
      .headers()?
      .iter()
      .enumerate()
      .map(|(i, h)| {
        let h = h.trim();
        if h.is_empty() { format!("column{i}") } else { h.to_owned() }
      })
      .collect();

    let mut seen = HashSet::new();
    for c in &columns {
      if !seen.insert(c.as_str()) {
        return Err(Error::DuplicateColumn {
          table:  "csv header".into(),
          column: c.clone(),
        });
      }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
      let record = record?;
      rows.push(
        record
          .iter()
          .map(|field| (!field.is_empty()).then(|| field.to_owned()))
          .collect(),
      );
    }

    Ok(Self { columns, rows })
  }

  /// Interpret this table as the schema source.
  pub fn schema_rows(&self) -> Result<Vec<RawSchemaRow>> {
    let header = SchemaHeader::resolve(self.columns.iter().map(String::as_str))?;
    let cell = |row: &[Option<String>], i: usize| {
      row.get(i).cloned().flatten().unwrap_or_default()
    };

    Ok(
      self
        .rows
        .iter()
        .map(|row| RawSchemaRow {
          column_name:   cell(row, header.column).trim().to_owned(),
          question_text: cell(row, header.question_text),
          question_type: cell(row, header.question_type).trim().to_owned(),
        })
        .filter(|r| !r.column_name.is_empty())
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_cells_are_null() {
    let t = RawTable::from_reader("a,b\n1,\n,x\n".as_bytes()).unwrap();
    assert_eq!(t.columns, ["a", "b"]);
    assert_eq!(t.rows, vec![
      vec![Some("1".to_owned()), None],
      vec![None, Some("x".to_owned())],
    ]);
  }

  #[test]
  fn quoted_fields_keep_delimiters() {
    let t =
      RawTable::from_reader("Lang\n\"Python;Go, and more\"\n".as_bytes()).unwrap();
    assert_eq!(t.rows[0][0].as_deref(), Some("Python;Go, and more"));
  }

  #[test]
  fn ragged_rows_are_rejected() {
    let err = RawTable::from_reader("a,b\n1,2,3\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Csv(_)));
  }

  #[test]
  fn duplicate_headers_are_rejected() {
    let err = RawTable::from_reader("a,a\n1,2\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::DuplicateColumn { .. }));
  }

  #[test]
  fn schema_rows_skip_blank_column_names() {
    let t = RawTable::from_reader(
      "column,question_text,type\nAge,How old are you?,SC\n,orphan,SC\n".as_bytes(),
    )
    .unwrap();
    let rows = t.schema_rows().unwrap();
    assert_eq!(rows, vec![RawSchemaRow {
      column_name:   "Age".into(),
      question_text: "How old are you?".into(),
      question_type: "SC".into(),
    }]);
  }

  #[test]
  fn schema_rows_need_type_column() {
    let t = RawTable::from_reader("column,question_text\nAge,x\n".as_bytes()).unwrap();
    assert!(matches!(t.schema_rows(), Err(Error::Core(_))));
  }
}
