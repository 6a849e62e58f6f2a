//! Core types and trait definitions for the Tally survey explorer.
//!
//! This crate is deliberately free of database and CLI dependencies. It owns
//! the star-schema model, the answer normalisation rules, and the two-phase
//! wide-to-long pivot. Storage backends implement [`store::SurveyStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod answer;
pub mod error;
pub mod pivot;
pub mod query;
pub mod question;
pub mod respondent;
pub mod store;

pub use error::{Error, Result};
