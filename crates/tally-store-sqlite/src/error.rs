//! Error type for `tally-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("failed to read {}: {source}", .path.display())]
  Io {
    path:   std::path::PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The session was closed; the store must not be used any more.
  #[error("survey session is closed")]
  Closed,

  #[error("star schema has already been built for this session")]
  AlreadyBuilt,

  #[error("star schema has not been built yet")]
  NotBuilt,

  #[error("unknown table: {0}")]
  UnknownTable(String),

  /// A demographic column name clashes with a key column of
  /// `dim_respondents`.
  #[error("{0:?} is reserved in dim_respondents")]
  ReservedColumn(String),

  #[error("duplicate column {column:?} in {table}")]
  DuplicateColumn { table: String, column: String },
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::ConnectionClosed => Error::Closed,
      other => Error::Database(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
