//! In-memory dataset served by the reference server.
//!
//! A [`Dataset`] holds named resources, each with a field set, defaults,
//! rows and write hooks. It is safe to share across request handlers and
//! also implements [`RemoteService`] directly, so record groups can run
//! against it in-process.

mod fixtures;
mod hooks;
mod table;

pub use fixtures::{Fixtures, ResourceFixture};
pub use hooks::WriteHook;
pub use table::Resource;

use dashmap::DashMap;
use rowset_engine::{
    remote::row_id, Context, FieldFactory, FieldKind, FieldSet, RecordId, RemoteService, Row,
    Values,
};

/// Dataset errors.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    // Lookup errors
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("{resource}: record {id} does not exist")]
    UnknownRecord { resource: String, id: RecordId },

    #[error("{resource}: no write hook named '{method}'")]
    UnknownMethod { resource: String, method: String },

    // Validation errors
    #[error("{resource}: unknown field '{field}'")]
    UnknownField { resource: String, field: String },

    #[error("{resource}: field '{field}' has unknown type '{tag}'")]
    UnknownFieldType {
        resource: String,
        field: String,
        tag: String,
    },

    #[error("{resource}: invalid value for {kind} field '{field}'")]
    InvalidValue {
        resource: String,
        field: String,
        kind: FieldKind,
    },

    // Fixture errors
    #[error("invalid fixtures: {0}")]
    InvalidFixture(String),

    #[error("fixture JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fixture IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Thread-safe collection of resources.
#[derive(Debug, Default)]
pub struct Dataset {
    resources: DashMap<String, Resource>,
    factory: FieldFactory,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from parsed fixtures.
    pub fn from_fixtures(fixtures: Fixtures) -> Result<Self> {
        let dataset = Self::new();
        for (name, fixture) in fixtures.resources {
            let mut resource = Resource::new(name.clone(), fixture.fields, &dataset.factory)?
                .with_defaults(fixture.defaults)?;
            for (method, hook) in fixture.hooks {
                resource = resource.with_hook(method, hook);
            }
            for row in fixture.rows {
                let id = row_id(&row).ok_or_else(|| {
                    DatasetError::InvalidFixture(format!("row of '{name}' has no integer id"))
                })?;
                resource.insert_row(id, row)?;
            }
            tracing::debug!(resource = %name, rows = resource.len(), "loaded fixture resource");
            dataset.insert(resource);
        }
        Ok(dataset)
    }

    /// Add or replace a resource.
    pub fn insert(&self, resource: Resource) {
        self.resources.insert(resource.name().to_string(), resource);
    }

    /// Names of every resource, sorted.
    pub fn resource_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Field set of a resource.
    pub fn fields(&self, resource: &str) -> Result<FieldSet> {
        self.with(resource, |res| Ok(res.fields().clone()))
    }

    pub fn read(&self, resource: &str, ids: &[RecordId], fields: &[String]) -> Result<Vec<Row>> {
        self.with(resource, |res| res.read(ids, fields))
    }

    pub fn default_get(&self, resource: &str, fields: &[String]) -> Result<Values> {
        self.with(resource, |res| res.default_get(fields))
    }

    pub fn create(&self, resource: &str, values: &Values) -> Result<RecordId> {
        let id = self.with_mut(resource, |res| res.create(values))?;
        tracing::debug!(resource, id, "created row");
        Ok(id)
    }

    pub fn write(&self, resource: &str, ids: &[RecordId], values: &Values) -> Result<()> {
        self.with_mut(resource, |res| res.write(ids, values))?;
        tracing::debug!(resource, ?ids, fields = values.len(), "wrote rows");
        Ok(())
    }

    pub fn delete(&self, resource: &str, ids: &[RecordId]) -> Result<()> {
        self.with_mut(resource, |res| res.delete(ids))?;
        tracing::debug!(resource, ?ids, "deleted rows");
        Ok(())
    }

    /// Run write hook `method` for row `id`.
    pub fn call(&self, resource: &str, method: &str, id: RecordId) -> Result<Vec<RecordId>> {
        self.with_mut(resource, |res| {
            let hook = res
                .hook(method)
                .cloned()
                .ok_or_else(|| DatasetError::UnknownMethod {
                    resource: resource.to_string(),
                    method: method.to_string(),
                })?;
            hook.run(res, id)
        })
    }

    fn with<T>(&self, resource: &str, f: impl FnOnce(&Resource) -> Result<T>) -> Result<T> {
        let entry = self
            .resources
            .get(resource)
            .ok_or_else(|| DatasetError::UnknownResource(resource.to_string()))?;
        f(entry.value())
    }

    fn with_mut<T>(&self, resource: &str, f: impl FnOnce(&mut Resource) -> Result<T>) -> Result<T> {
        let mut entry = self
            .resources
            .get_mut(resource)
            .ok_or_else(|| DatasetError::UnknownResource(resource.to_string()))?;
        f(entry.value_mut())
    }
}

fn remote_error(err: DatasetError) -> rowset_engine::Error {
    rowset_engine::Error::Remote(err.to_string())
}

/// In-process remote service. The context is accepted and ignored.
impl RemoteService for Dataset {
    fn read(
        &self,
        resource: &str,
        ids: &[RecordId],
        fields: &[String],
        _context: &Context,
    ) -> rowset_engine::Result<Vec<Row>> {
        Dataset::read(self, resource, ids, fields).map_err(remote_error)
    }

    fn default_get(
        &self,
        resource: &str,
        fields: &[String],
        _context: &Context,
    ) -> rowset_engine::Result<Values> {
        Dataset::default_get(self, resource, fields).map_err(remote_error)
    }

    fn create(
        &self,
        resource: &str,
        values: &Values,
        _context: &Context,
    ) -> rowset_engine::Result<RecordId> {
        Dataset::create(self, resource, values).map_err(remote_error)
    }

    fn write(
        &self,
        resource: &str,
        ids: &[RecordId],
        values: &Values,
        _context: &Context,
    ) -> rowset_engine::Result<()> {
        Dataset::write(self, resource, ids, values).map_err(remote_error)
    }

    fn delete(
        &self,
        resource: &str,
        ids: &[RecordId],
        _context: &Context,
    ) -> rowset_engine::Result<()> {
        Dataset::delete(self, resource, ids).map_err(remote_error)
    }

    fn call(
        &self,
        resource: &str,
        method: &str,
        id: RecordId,
        _context: &Context,
    ) -> rowset_engine::Result<Vec<RecordId>> {
        Dataset::call(self, resource, method, id).map_err(remote_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> Dataset {
        Dataset::from_fixtures(Fixtures::parse(include_str!("../../fixtures/demo.json")).unwrap())
            .unwrap()
    }

    #[test]
    fn fixtures_seed_resources() {
        let data = dataset();
        assert_eq!(data.resource_names(), vec!["party", "sale.line"]);
        let rows = data.read("party", &[1], &["name".to_string()]).unwrap();
        assert_eq!(rows[0]["name"], json!("Alice"));
    }

    #[test]
    fn unknown_resource_and_method() {
        let data = dataset();
        assert!(matches!(
            data.fields("nope"),
            Err(DatasetError::UnknownResource(_))
        ));
        assert!(matches!(
            data.call("party", "explode", 1),
            Err(DatasetError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn remote_service_maps_errors() {
        let data = dataset();
        let err = RemoteService::read(&data, "nope", &[1], &[], &Context::new()).unwrap_err();
        assert!(matches!(err, rowset_engine::Error::Remote(msg) if msg.contains("nope")));
    }

    #[test]
    fn call_runs_configured_hook() {
        let data = dataset();
        let values = json!({"product": "Bolt", "quantity": 2})
            .as_object()
            .cloned()
            .unwrap();
        let id = data.create("sale.line", &values).unwrap();

        let ids = data.call("sale.line", "on_write", id).unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], id);
        let companion = data
            .read("sale.line", &ids[1..], &["origin".to_string()])
            .unwrap();
        assert_eq!(companion[0]["origin"], json!(id));
    }
}
