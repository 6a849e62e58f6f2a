//! `tally` — explore a survey through its star schema.
//!
//! Loads the schema and respondent CSV files into an in-memory session,
//! builds the star schema, then either runs one command or opens the
//! interactive menu.
//!
//! # Usage
//!
//! ```
//! tally --data so_data/so_2024_sample.csv --schema so_data/so_2024_raw_schema.csv
//! tally distribution RemoteWork
//! tally --format json subset RemoteWork Remote
//! tally peek so_schema --limit 5
//! ```

mod commands;
mod menu;
mod render;
mod settings;

use std::{io, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use render::Format;
use settings::TallyConfig;
use tally_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tally", version, about = "Explore survey answers through a star schema")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,

  /// Respondent data CSV (overrides config and TALLY_DATA_FILE).
  #[arg(long, value_name = "FILE")]
  data: Option<PathBuf>,

  /// Question schema CSV (overrides config and TALLY_SCHEMA_FILE).
  #[arg(long, value_name = "FILE")]
  schema: Option<PathBuf>,

  /// Output format for query results.
  #[arg(long, value_enum, default_value_t = Format::Table)]
  format: Format,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Interactive menu (the default).
  Menu,
  /// List every question with its number of observed answers.
  Structure,
  /// Search question text, column names and answers.
  Search { term: String },
  /// Respondents who gave an exact answer to a question.
  Subset {
    column: String,
    answer: String,
    /// Maximum respondents listed (table preview defaults to 20).
    #[arg(long)]
    limit:  Option<usize>,
  },
  /// Answer counts and percentages for a question.
  Distribution { column: String },
  /// Tables in the session with their row counts.
  Tables,
  /// Columns of one table.
  Info { table: String },
  /// First rows of one table, raw sources included.
  Peek {
    table: String,
    /// Rows to show (default 10).
    #[arg(long)]
    limit: Option<usize>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so JSON output on stdout stays clean.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = TallyConfig::load(&cli.config, cli.data.clone(), cli.schema.clone())?;

  let store = SqliteStore::from_csv(&cfg.data_file, &cfg.schema_file, &cfg.build_options())
    .await
    .with_context(|| {
      format!(
        "failed to load survey from {:?} and {:?}",
        cfg.data_file, cfg.schema_file
      )
    })?;

  // Close the session whether or not the command succeeded.
  let result = run(&store, &cli).await;
  store.close().await.context("failed to close survey session")?;
  result
}

async fn run(store: &SqliteStore, cli: &Cli) -> anyhow::Result<()> {
  let mut out = io::stdout().lock();
  let format = cli.format;

  match &cli.command {
    None | Some(Command::Menu) => {
      let mut input = io::stdin().lock();
      menu::run(store, format, &mut input, &mut out).await
    }
    Some(Command::Structure) => commands::structure(store, format, &mut out).await,
    Some(Command::Search { term }) => commands::search(store, format, term, &mut out).await,
    Some(Command::Subset { column, answer, limit }) => {
      commands::subset(store, format, column, answer, *limit, &mut out).await
    }
    Some(Command::Distribution { column }) => {
      commands::distribution(store, format, column, &mut out).await
    }
    Some(Command::Tables) => commands::tables(store, format, &mut out).await,
    Some(Command::Info { table }) => commands::info(store, format, table, &mut out).await,
    Some(Command::Peek { table, limit }) => {
      commands::peek(store, format, table, *limit, &mut out).await
    }
  }
}
