//! The remote service seam.
//!
//! The engine never performs IO itself. Everything it needs from the
//! authority that owns the records goes through [`RemoteService`], invoked
//! per resource name. Calls are synchronous from the engine's point of view;
//! a transport fault is reported as [`Error::Remote`](crate::Error::Remote)
//! and propagated to the caller without retry.

use crate::{error::Result, Context, RecordId};
use serde_json::{Map, Value};

/// Field values keyed by field name.
pub type Values = Map<String, Value>;

/// One row of a batched read: field values plus an `id` key.
pub type Row = Map<String, Value>;

/// Extract the identity of a row.
pub fn row_id(row: &Row) -> Option<RecordId> {
    row.get("id").and_then(Value::as_i64)
}

/// Operations a remote service exposes for each resource.
pub trait RemoteService {
    /// Batched fetch of `fields` for `ids`. An empty result is a valid answer.
    fn read(
        &self,
        resource: &str,
        ids: &[RecordId],
        fields: &[String],
        context: &Context,
    ) -> Result<Vec<Row>>;

    /// Default values for unsaved records. Fields may be omitted.
    fn default_get(&self, resource: &str, fields: &[String], context: &Context) -> Result<Values>;

    /// Persist a new record, returning its identity.
    fn create(&self, resource: &str, values: &Values, context: &Context) -> Result<RecordId>;

    /// Update persisted records.
    fn write(
        &self,
        resource: &str,
        ids: &[RecordId],
        values: &Values,
        context: &Context,
    ) -> Result<()>;

    /// Delete persisted records.
    fn delete(&self, resource: &str, ids: &[RecordId], context: &Context) -> Result<()>;

    /// Invoke a named procedure with one identity; returns the identities
    /// that must be present afterwards.
    fn call(
        &self,
        resource: &str,
        method: &str,
        id: RecordId,
        context: &Context,
    ) -> Result<Vec<RecordId>>;
}
