//! JSON fixtures seeding the dataset.
//!
//! ```json
//! {
//!   "resources": {
//!     "party": {
//!       "fields": { "name": { "type": "char" } },
//!       "defaults": { "name": "Anonymous" },
//!       "rows": [ { "id": 1, "name": "Alice" } ],
//!       "hooks": { "on_write": { "kind": "siblings", "field": "name" } }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use rowset_engine::{remote::row_id, FieldSet, Row, Values};
use serde::{Deserialize, Serialize};

use super::{DatasetError, Result, WriteHook};

/// Top-level fixture document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceFixture>,
}

/// Fixture for one resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceFixture {
    pub fields: FieldSet,
    #[serde(default)]
    pub defaults: Values,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub hooks: BTreeMap<String, WriteHook>,
}

impl Fixtures {
    /// Parse a fixture document.
    pub fn parse(json: &str) -> Result<Self> {
        let fixtures: Self = serde_json::from_str(json)?;
        fixtures.check_rows()?;
        Ok(fixtures)
    }

    /// Read and parse a fixture file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&json)
    }

    fn check_rows(&self) -> Result<()> {
        for (name, resource) in &self.resources {
            if let Some(index) = resource.rows.iter().position(|row| row_id(row).is_none()) {
                return Err(DatasetError::InvalidFixture(format!(
                    "row {index} of '{name}' has no integer id"
                )));
            }
        }
        Ok(())
    }
}
