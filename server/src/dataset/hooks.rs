//! Declarative write hooks.
//!
//! A hook runs after a client saved a record and answers with the ids the
//! client must hold afterwards. Hooks are data, not code, so fixtures can
//! declare them.

use rowset_engine::{RecordId, Values};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DatasetError, Resource, Result};

/// Server-side side effect of saving a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteHook {
    /// Keep one companion row per saved row. The companion carries `values`
    /// and points back through `link_field`. Rows that are companions
    /// themselves get none.
    Companion { link_field: String, values: Values },
    /// Every row sharing the saved row's value of `field`, ascending.
    Siblings { field: String },
}

impl WriteHook {
    /// Run the hook for row `id` of `resource`.
    pub fn run(&self, resource: &mut Resource, id: RecordId) -> Result<Vec<RecordId>> {
        let row = resource
            .row(id)
            .ok_or_else(|| DatasetError::UnknownRecord {
                resource: resource.name().to_string(),
                id,
            })?;

        match self {
            WriteHook::Companion { link_field, values } => {
                if !row.get(link_field).unwrap_or(&Value::Null).is_null() {
                    return Ok(vec![id]);
                }

                let existing = resource
                    .rows()
                    .find(|(_, row)| row.get(link_field) == Some(&Value::from(id)))
                    .map(|(other, _)| *other);
                let companion = match existing {
                    Some(companion) => companion,
                    None => {
                        let mut values = values.clone();
                        values.insert(link_field.clone(), Value::from(id));
                        let companion = resource.create(&values)?;
                        tracing::debug!(resource = %resource.name(), id, companion, "created companion row");
                        companion
                    }
                };
                Ok(vec![id, companion])
            }
            WriteHook::Siblings { field } => {
                let key = row.get(field).cloned().unwrap_or(Value::Null);
                Ok(resource
                    .rows()
                    .filter(|(_, row)| row.get(field).unwrap_or(&Value::Null) == &key)
                    .map(|(id, _)| *id)
                    .collect())
            }
        }
    }
}
