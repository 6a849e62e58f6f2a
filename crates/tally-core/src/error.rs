//! Error types for `tally-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required column is missing from a raw table header.
  #[error("{table} is missing required column {column:?}")]
  MissingColumn { table: &'static str, column: &'static str },

  #[error("{0} has an empty header row")]
  EmptyHeader(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
