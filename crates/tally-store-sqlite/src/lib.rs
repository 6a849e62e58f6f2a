//! SQLite backend for the Tally survey explorer.
//!
//! Loads the raw schema and respondent tables into an in-memory SQLite
//! session, derives the star schema from them, and answers the analytical
//! queries of [`tally_core::store::SurveyStore`]. All database access goes
//! through [`tokio_rusqlite`], which runs it on a dedicated thread.

mod builder;
mod load;
mod schema;
mod store;

pub mod error;

pub use builder::{BuildOptions, BuildReport};
pub use error::{Error, Result};
pub use load::RawTable;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
