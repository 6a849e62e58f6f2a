//! Layered configuration: defaults, optional TOML file, `TALLY_*` environment
//! variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use tally_core::respondent::DEFAULT_DEMOGRAPHICS;
use tally_store_sqlite::BuildOptions;

/// Runtime configuration, deserialised from `tally.toml` and the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TallyConfig {
  #[serde(default = "default_data_file")]
  pub data_file:           PathBuf,
  #[serde(default = "default_schema_file")]
  pub schema_file:         PathBuf,
  #[serde(default = "default_demographics")]
  pub demographic_columns: Vec<String>,
}

fn default_data_file() -> PathBuf { PathBuf::from("so_data/so_2024_sample.csv") }

fn default_schema_file() -> PathBuf { PathBuf::from("so_data/so_2024_raw_schema.csv") }

fn default_demographics() -> Vec<String> {
  DEFAULT_DEMOGRAPHICS.iter().map(|c| (*c).to_owned()).collect()
}

impl TallyConfig {
  /// Read `file` (if it exists) and `TALLY_*` variables, then apply
  /// flag overrides.
  pub fn load(
    file:        &Path,
    data_file:   Option<PathBuf>,
    schema_file: Option<PathBuf>,
  ) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("TALLY")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("demographic_columns"),
      )
      .build()
      .context("failed to read config file")?;

    let mut cfg: TallyConfig = settings
      .try_deserialize()
      .context("failed to deserialise TallyConfig")?;

    if let Some(path) = data_file {
      cfg.data_file = path;
    }
    if let Some(path) = schema_file {
      cfg.schema_file = path;
    }
    cfg.data_file = expand_tilde(&cfg.data_file);
    cfg.schema_file = expand_tilde(&cfg.schema_file);
    Ok(cfg)
  }

  pub fn build_options(&self) -> BuildOptions {
    BuildOptions { demographic_columns: self.demographic_columns.clone() }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
