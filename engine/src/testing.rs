//! Scripted in-memory remote service for unit tests.

use crate::{error::Result, Context, Error, RecordId, RemoteService, Row, Values};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// One recorded remote invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Call {
    pub method: String,
    pub resource: String,
    pub ids: Vec<RecordId>,
    pub fields: Vec<String>,
    pub values: Values,
    pub context: Context,
}

pub(crate) struct FakeRemote {
    tables: RefCell<BTreeMap<String, BTreeMap<RecordId, Row>>>,
    defaults: RefCell<BTreeMap<String, Values>>,
    hooks: RefCell<BTreeMap<(String, String), Vec<RecordId>>>,
    calls: RefCell<Vec<Call>>,
    next_id: Cell<RecordId>,
    failing: Cell<bool>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            tables: RefCell::new(BTreeMap::new()),
            defaults: RefCell::new(BTreeMap::new()),
            hooks: RefCell::new(BTreeMap::new()),
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(1000),
            failing: Cell::new(false),
        }
    }

    pub fn insert_row(&self, resource: &str, row: Value) {
        let row = row.as_object().cloned().unwrap_or_default();
        let id = row.get("id").and_then(Value::as_i64).unwrap_or_default();
        self.tables
            .borrow_mut()
            .entry(resource.to_string())
            .or_default()
            .insert(id, row);
    }

    pub fn row(&self, resource: &str, id: RecordId) -> Option<Row> {
        self.tables.borrow().get(resource)?.get(&id).cloned()
    }

    pub fn set_defaults(&self, resource: &str, defaults: Value) {
        self.defaults.borrow_mut().insert(
            resource.to_string(),
            defaults.as_object().cloned().unwrap_or_default(),
        );
    }

    pub fn set_hook(&self, resource: &str, method: &str, ids: Vec<RecordId>) {
        self.hooks
            .borrow_mut()
            .insert((resource.to_string(), method.to_string()), ids);
    }

    /// Make every following call fail with a transport error.
    pub fn fail(&self) {
        self.failing.set(true);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn calls_named(&self, method: &str) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.borrow_mut().push(call);
        if self.failing.get() {
            return Err(Error::Remote("connection reset".into()));
        }
        Ok(())
    }
}

impl RemoteService for FakeRemote {
    fn read(
        &self,
        resource: &str,
        ids: &[RecordId],
        fields: &[String],
        context: &Context,
    ) -> Result<Vec<Row>> {
        self.record(Call {
            method: "read".into(),
            resource: resource.into(),
            ids: ids.to_vec(),
            fields: fields.to_vec(),
            context: context.clone(),
            ..Call::default()
        })?;

        let tables = self.tables.borrow();
        let Some(table) = tables.get(resource) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| table.get(id))
            .map(|row| {
                let mut out = Row::new();
                out.insert("id".into(), row["id"].clone());
                for field in fields {
                    if let Some(value) = row.get(field) {
                        out.insert(field.clone(), value.clone());
                    }
                }
                out
            })
            .collect())
    }

    fn default_get(&self, resource: &str, fields: &[String], context: &Context) -> Result<Values> {
        self.record(Call {
            method: "default_get".into(),
            resource: resource.into(),
            fields: fields.to_vec(),
            context: context.clone(),
            ..Call::default()
        })?;

        let defaults = self.defaults.borrow();
        Ok(defaults
            .get(resource)
            .map(|d| {
                d.iter()
                    .filter(|(k, _)| fields.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn create(&self, resource: &str, values: &Values, context: &Context) -> Result<RecordId> {
        self.record(Call {
            method: "create".into(),
            resource: resource.into(),
            values: values.clone(),
            context: context.clone(),
            ..Call::default()
        })?;

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let mut row = values.clone();
        row.insert("id".into(), Value::from(id));
        self.tables
            .borrow_mut()
            .entry(resource.to_string())
            .or_default()
            .insert(id, row);
        Ok(id)
    }

    fn write(
        &self,
        resource: &str,
        ids: &[RecordId],
        values: &Values,
        context: &Context,
    ) -> Result<()> {
        self.record(Call {
            method: "write".into(),
            resource: resource.into(),
            ids: ids.to_vec(),
            values: values.clone(),
            context: context.clone(),
            ..Call::default()
        })?;

        let mut tables = self.tables.borrow_mut();
        let table = tables.entry(resource.to_string()).or_default();
        for id in ids {
            if let Some(row) = table.get_mut(id) {
                for (k, v) in values {
                    row.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }

    fn delete(&self, resource: &str, ids: &[RecordId], context: &Context) -> Result<()> {
        self.record(Call {
            method: "delete".into(),
            resource: resource.into(),
            ids: ids.to_vec(),
            context: context.clone(),
            ..Call::default()
        })?;

        if let Some(table) = self.tables.borrow_mut().get_mut(resource) {
            for id in ids {
                table.remove(id);
            }
        }
        Ok(())
    }

    fn call(
        &self,
        resource: &str,
        method: &str,
        id: RecordId,
        context: &Context,
    ) -> Result<Vec<RecordId>> {
        self.record(Call {
            method: method.into(),
            resource: resource.into(),
            ids: vec![id],
            context: context.clone(),
            ..Call::default()
        })?;

        Ok(self
            .hooks
            .borrow()
            .get(&(resource.to_string(), method.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
