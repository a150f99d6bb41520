//! Field schema registry.
//!
//! A [`Schema`] is the immutable set of field descriptors a group works
//! with, together with the behaviour instantiated for each field. Extending
//! a schema never mutates it; [`Schema::extend`] returns the union as a new
//! schema and reports which field names were genuinely added.

use crate::{error::Result, Field, FieldDescriptor, FieldFactory};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Field descriptors keyed by field name, as published by a remote service.
pub type FieldSet = BTreeMap<String, FieldDescriptor>;

#[derive(Debug, Clone)]
struct Entry {
    descriptor: Rc<FieldDescriptor>,
    field: Rc<Field>,
}

/// Immutable field schema of one group.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: BTreeMap<String, Entry>,
}

impl Schema {
    /// A schema with no fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a schema from a field set, instantiating every field.
    pub fn build(fields: &FieldSet, factory: &FieldFactory) -> Result<Self> {
        let (schema, _) = Self::empty().extend(fields, factory)?;
        Ok(schema)
    }

    /// Union of this schema and `incoming`.
    ///
    /// Fields missing here are inserted with their name stamped from the key
    /// and a freshly instantiated behaviour. Fields already present get the
    /// incoming metadata merged into a new descriptor but keep their
    /// behaviour object. Returns the new schema and the added names, in key
    /// order.
    pub fn extend(&self, incoming: &FieldSet, factory: &FieldFactory) -> Result<(Self, Vec<String>)> {
        let mut entries = self.entries.clone();
        let mut added = Vec::new();

        for (name, descriptor) in incoming {
            match entries.get_mut(name) {
                Some(entry) => {
                    let mut merged = (*entry.descriptor).clone();
                    merged.merge_from(descriptor);
                    entry.descriptor = Rc::new(merged);
                }
                None => {
                    let mut stamped = descriptor.clone();
                    stamped.name.clone_from(name);
                    let field = factory.instantiate(&stamped)?;
                    entries.insert(
                        name.clone(),
                        Entry {
                            descriptor: Rc::new(stamped),
                            field: Rc::new(field),
                        },
                    );
                    added.push(name.clone());
                }
            }
        }

        Ok((Self { entries }, added))
    }

    /// Field names in key order.
    pub fn field_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.entries.get(name).map(|e| e.descriptor.as_ref())
    }

    /// Behaviour object for a field.
    pub fn field(&self, name: &str) -> Option<&Rc<Field>> {
        self.entries.get(name).map(|e| &e.field)
    }

    /// Owned copy of the descriptors, suitable for extending another schema.
    pub fn to_field_set(&self) -> FieldSet {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), (*entry.descriptor).clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
