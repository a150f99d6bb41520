//! One resource of the dataset: its fields, defaults, rows and hooks.

use std::collections::{BTreeMap, HashMap};

use rowset_engine::{FieldFactory, FieldKind, FieldSet, RecordId, Row, Values};
use serde_json::Value;

use super::{DatasetError, Result, WriteHook};

/// Rows of one resource plus everything needed to validate them.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    fields: FieldSet,
    kinds: HashMap<String, FieldKind>,
    defaults: Values,
    rows: BTreeMap<RecordId, Row>,
    hooks: BTreeMap<String, WriteHook>,
    next_id: RecordId,
}

impl Resource {
    /// Create an empty resource. Every field's type tag must be known to
    /// `factory`.
    pub fn new(name: impl Into<String>, mut fields: FieldSet, factory: &FieldFactory) -> Result<Self> {
        let name = name.into();
        let mut kinds = HashMap::with_capacity(fields.len());
        for (field, descriptor) in fields.iter_mut() {
            descriptor.name.clone_from(field);
            let kind = factory.kind_of(&descriptor.type_tag).ok_or_else(|| {
                DatasetError::UnknownFieldType {
                    resource: name.clone(),
                    field: field.clone(),
                    tag: descriptor.type_tag.clone(),
                }
            })?;
            kinds.insert(field.clone(), kind);
        }

        Ok(Self {
            name,
            fields,
            kinds,
            defaults: Values::new(),
            rows: BTreeMap::new(),
            hooks: BTreeMap::new(),
            next_id: 1,
        })
    }

    /// Builder-style method to set default values.
    pub fn with_defaults(mut self, defaults: Values) -> Result<Self> {
        self.validate(&defaults)?;
        self.defaults = defaults;
        Ok(self)
    }

    /// Builder-style method to register a write hook.
    pub fn with_hook(mut self, method: impl Into<String>, hook: WriteHook) -> Self {
        self.hooks.insert(method.into(), hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn hook(&self, method: &str) -> Option<&WriteHook> {
        self.hooks.get(method)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: RecordId) -> Option<&Row> {
        self.rows.get(&id)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (&RecordId, &Row)> {
        self.rows.iter()
    }

    /// Insert a row with a caller-chosen id, as fixtures do.
    pub fn insert_row(&mut self, id: RecordId, mut values: Values) -> Result<()> {
        values.remove("id");
        self.validate(&values)?;
        values.insert("id".into(), Value::from(id));
        self.rows.insert(id, values);
        self.next_id = self.next_id.max(id + 1);
        Ok(())
    }

    fn check_field(&self, field: &str) -> Result<FieldKind> {
        self.kinds
            .get(field)
            .copied()
            .ok_or_else(|| DatasetError::UnknownField {
                resource: self.name.clone(),
                field: field.to_string(),
            })
    }

    fn validate(&self, values: &Values) -> Result<()> {
        for (field, value) in values {
            let kind = self.check_field(field)?;
            if !kind.accepts(value) {
                return Err(DatasetError::InvalidValue {
                    resource: self.name.clone(),
                    field: field.clone(),
                    kind,
                });
            }
        }
        Ok(())
    }

    /// Rows for `ids` in request order with the requested fields. Unknown
    /// ids are skipped.
    pub fn read(&self, ids: &[RecordId], fields: &[String]) -> Result<Vec<Row>> {
        for field in fields {
            self.check_field(field)?;
        }

        Ok(ids
            .iter()
            .filter_map(|id| self.rows.get(id).map(|row| (id, row)))
            .map(|(id, row)| {
                let mut out = Row::new();
                out.insert("id".into(), Value::from(*id));
                for field in fields {
                    let value = row.get(field).cloned().unwrap_or(Value::Null);
                    out.insert(field.clone(), value);
                }
                out
            })
            .collect())
    }

    /// Configured defaults for `fields`; fields without one are omitted.
    pub fn default_get(&self, fields: &[String]) -> Result<Values> {
        let mut values = Values::new();
        for field in fields {
            self.check_field(field)?;
            if let Some(value) = self.defaults.get(field) {
                values.insert(field.clone(), value.clone());
            }
        }
        Ok(values)
    }

    /// Store a new row: defaults first, then `values`. Returns the new id.
    pub fn create(&mut self, values: &Values) -> Result<RecordId> {
        let mut values = values.clone();
        values.remove("id");
        self.validate(&values)?;

        let id = self.next_id;
        self.next_id += 1;

        let mut row = self.defaults.clone();
        row.extend(values);
        row.insert("id".into(), Value::from(id));
        self.rows.insert(id, row);
        Ok(id)
    }

    /// Update every row in `ids`. All ids must exist; nothing changes
    /// otherwise.
    pub fn write(&mut self, ids: &[RecordId], values: &Values) -> Result<()> {
        let mut values = values.clone();
        values.remove("id");
        self.validate(&values)?;
        self.require(ids)?;

        for id in ids {
            if let Some(row) = self.rows.get_mut(id) {
                row.extend(values.clone());
            }
        }
        Ok(())
    }

    /// Delete every row in `ids`. All ids must exist; nothing changes
    /// otherwise.
    pub fn delete(&mut self, ids: &[RecordId]) -> Result<()> {
        self.require(ids)?;
        for id in ids {
            self.rows.remove(id);
        }
        Ok(())
    }

    fn require(&self, ids: &[RecordId]) -> Result<()> {
        match ids.iter().find(|id| !self.rows.contains_key(id)) {
            Some(id) => Err(DatasetError::UnknownRecord {
                resource: self.name.clone(),
                id: *id,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowset_engine::FieldDescriptor;
    use serde_json::json;

    fn resource() -> Resource {
        let fields: FieldSet = [
            ("name".to_string(), FieldDescriptor::new("name", "char")),
            ("qty".to_string(), FieldDescriptor::new("qty", "integer")),
        ]
        .into_iter()
        .collect();
        Resource::new("line", fields, &FieldFactory::default())
            .unwrap()
            .with_defaults(json!({"qty": 1}).as_object().cloned().unwrap())
            .unwrap()
    }

    fn values(value: Value) -> Values {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_applies_defaults_and_allocates_ids() {
        let mut res = resource();
        let a = res.create(&values(json!({"name": "Bolt"}))).unwrap();
        let b = res.create(&values(json!({"name": "Nut", "qty": 4}))).unwrap();

        assert_eq!((a, b), (1, 2));
        assert_eq!(res.row(1).unwrap()["qty"], json!(1));
        assert_eq!(res.row(2).unwrap()["qty"], json!(4));
    }

    #[test]
    fn fixture_ids_advance_allocator() {
        let mut res = resource();
        res.insert_row(10, values(json!({"name": "Old"}))).unwrap();
        assert_eq!(res.create(&Values::new()).unwrap(), 11);
    }

    #[test]
    fn read_skips_unknown_ids_and_keeps_order() {
        let mut res = resource();
        res.create(&values(json!({"name": "A"}))).unwrap();
        res.create(&values(json!({"name": "B"}))).unwrap();

        let rows = res.read(&[2, 99, 1], &["name".to_string()]).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], json!(2));
        assert_eq!(rows[1]["name"], json!("A"));
        assert!(!rows[0].contains_key("qty"));
    }

    #[test]
    fn read_rejects_unknown_field() {
        let res = resource();
        let err = res.read(&[1], &["color".to_string()]).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownField { .. }));
    }

    #[test]
    fn default_get_omits_unconfigured_fields() {
        let res = resource();
        let defaults = res
            .default_get(&["name".to_string(), "qty".to_string()])
            .unwrap();
        assert_eq!(defaults, values(json!({"qty": 1})));
    }

    #[test]
    fn write_validates_types() {
        let mut res = resource();
        let id = res.create(&Values::new()).unwrap();

        let err = res.write(&[id], &values(json!({"qty": "many"}))).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidValue { .. }));

        res.write(&[id], &values(json!({"qty": 7}))).unwrap();
        assert_eq!(res.row(id).unwrap()["qty"], json!(7));
    }

    #[test]
    fn delete_is_all_or_nothing() {
        let mut res = resource();
        let id = res.create(&Values::new()).unwrap();

        let err = res.delete(&[id, 42]).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownRecord { id: 42, .. }));
        assert_eq!(res.len(), 1);

        res.delete(&[id]).unwrap();
        assert!(res.is_empty());
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let fields: FieldSet = [("x".to_string(), FieldDescriptor::new("x", "hologram"))]
            .into_iter()
            .collect();
        let err = Resource::new("thing", fields, &FieldFactory::default()).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownFieldType { .. }));
    }
}
