//! Respondents — the `dim_respondents` dimension and raw respondent rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Demographic columns carried into `dim_respondents` when none are configured.
pub const DEFAULT_DEMOGRAPHICS: &[&str] = &[
  "MainBranch",
  "Age",
  "Employment",
  "RemoteWork",
  "EdLevel",
  "YearsCode",
  "YearsCodePro",
  "DevType",
  "OrgSize",
  "Country",
];

/// One demographic value carried through unchanged from the raw row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
  pub name:  String,
  pub value: Option<String>,
}

/// A row of `dim_respondents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Respondent {
  pub respondent_id: i64,
  /// In the configured demographic column order.
  pub attributes:    Vec<Attribute>,
}

impl Respondent {
  /// Value of the demographic column `name`, if carried and non-null.
  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|a| a.name == name)
      .and_then(|a| a.value.as_deref())
  }
}

/// One respondent's wide row, keyed by column name.
///
/// Columns are looked up by name rather than position so that the pivot is
/// driven entirely by the schema's declared column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRespondentRow {
  pub respondent_id: i64,
  pub values:        HashMap<String, Option<String>>,
}

impl RawRespondentRow {
  pub fn new(respondent_id: i64) -> Self {
    Self { respondent_id, values: HashMap::new() }
  }

  pub fn with(mut self, column: &str, value: Option<&str>) -> Self {
    self.values.insert(column.to_owned(), value.map(str::to_owned));
    self
  }

  /// The raw cell for `column`; `None` both for NULL and for absent columns.
  pub fn value(&self, column: &str) -> Option<&str> {
    self.values.get(column).and_then(|v| v.as_deref())
  }
}
