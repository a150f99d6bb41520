//! Schema propagation between groups.
//!
//! Groups that exchange records must agree on their field sets. Adding
//! fields to a group initializes them on every record it already holds;
//! [`RecordGroup::add_fields`] additionally fetches real values for
//! persisted records and defaults for new ones. [`RecordGroup::adopt`]
//! unifies the schemas of two groups before moving a record between them.

use crate::{
    context::merge, error::Result, remote::row_id, Context, Error, FieldSet, Record, RecordGroup,
    RecordId, Values,
};
use std::rc::Rc;

impl RecordGroup {
    /// Merge `fields` into the schema and initialize each newly added field
    /// on every existing record. No remote traffic.
    ///
    /// Descriptors for fields already known are merged in place; their
    /// behaviour objects are reused. Returns the names that were added.
    pub fn add_fields_custom(&mut self, fields: &FieldSet) -> Result<Vec<String>> {
        let (schema, added) = self.schema.extend(fields, &self.factory)?;
        self.schema = schema;

        for name in &added {
            let Some(field) = self.schema.field(name).map(Rc::clone) else {
                continue;
            };
            for record in self.records.iter() {
                record.init_field(name, field.create());
            }
        }

        if !added.is_empty() {
            tracing::debug!(group = self.id(), resource = %self.resource(), added = ?added, "extended schema");
        }
        Ok(added)
    }

    /// Like [`add_fields_custom`](Self::add_fields_custom), then populate the
    /// added fields.
    ///
    /// Persisted records get one batched read of only the added fields,
    /// applied without change notifications. New records get one
    /// `default_get` call, with omitted fields set to `false`. Context
    /// layering: `context`, then the session, then the group's own context.
    pub fn add_fields(&mut self, fields: &FieldSet, context: &Context) -> Result<Vec<String>> {
        let added = self.add_fields_custom(fields)?;
        if added.is_empty() || self.records.is_empty() {
            return Ok(added);
        }

        let context = merge(&merge(context, &self.session.snapshot()), &self.context);
        let (persisted, fresh): (Vec<Record>, Vec<Record>) =
            self.records.iter().cloned().partition(|r| r.id().is_some());

        if !persisted.is_empty() {
            let ids: Vec<RecordId> = persisted.iter().filter_map(Record::id).collect();
            let rows = self.remote.read(self.resource(), &ids, &added, &context)?;
            for row in &rows {
                let Some(id) = row_id(row) else { continue };
                for record in persisted.iter().filter(|r| r.id() == Some(id)) {
                    record.set(row, false);
                }
            }
        }

        if !fresh.is_empty() {
            let mut defaults: Values = self.remote.default_get(self.resource(), &added, &context)?;
            for name in &added {
                if let Some(field) = self.schema.field(name) {
                    defaults
                        .entry(name.clone())
                        .or_insert_with(|| field.missing_default());
                }
            }
            for record in &fresh {
                record.set_default(&defaults);
            }
        }

        Ok(added)
    }

    /// Move `record` from `from` into this group at `position` (appending
    /// when `None`).
    ///
    /// Both schemas become the union of the two before the record changes
    /// owner: this group learns `from`'s fields and `from` learns this
    /// group's. The record stays in `from`'s list until the caller removes
    /// it there.
    pub fn adopt(
        &mut self,
        from: &mut RecordGroup,
        record: Record,
        position: Option<usize>,
    ) -> Result<Record> {
        if record.group() == self.id() {
            return Ok(self.attach(record, position));
        }
        if record.group() != from.id() {
            return Err(Error::ForeignRecord {
                record: record.uid(),
                owner: record.group(),
                group: from.id(),
            });
        }

        let context = Context::new();
        self.add_fields(&from.schema.to_field_set(), &context)?;
        from.add_fields(&self.schema.to_field_set(), &context)?;

        tracing::debug!(
            record = record.uid(),
            from = from.id(),
            to = self.id(),
            "adopting record"
        );
        record.set_group(self.id());
        Ok(self.attach(record, position))
    }
}
