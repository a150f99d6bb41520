//! Field descriptors and field behaviour.
//!
//! A [`FieldDescriptor`] is the metadata a remote service publishes for one
//! field of a resource. A [`Field`] is the behaviour instantiated from it by
//! the [`FieldFactory`], keyed by the descriptor's type tag.

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Field kinds understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Char,
    Text,
    Integer,
    Float,
    Numeric,
    Boolean,
    Date,
    DateTime,
    Selection,
    Many2One,
    One2Many,
    Many2Many,
    Reference,
    Binary,
}

impl FieldKind {
    /// Every built-in kind with the type tag it is registered under.
    pub const BUILTIN: [(&'static str, FieldKind); 14] = [
        ("char", FieldKind::Char),
        ("text", FieldKind::Text),
        ("integer", FieldKind::Integer),
        ("float", FieldKind::Float),
        ("numeric", FieldKind::Numeric),
        ("boolean", FieldKind::Boolean),
        ("date", FieldKind::Date),
        ("datetime", FieldKind::DateTime),
        ("selection", FieldKind::Selection),
        ("many2one", FieldKind::Many2One),
        ("one2many", FieldKind::One2Many),
        ("many2many", FieldKind::Many2Many),
        ("reference", FieldKind::Reference),
        ("binary", FieldKind::Binary),
    ];

    /// Value carried by a record that has never been given one.
    pub fn empty_value(self) -> Value {
        match self {
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::One2Many | FieldKind::Many2Many => Value::Array(Vec::new()),
            _ => Value::Null,
        }
    }

    /// Structural check of a value against this kind. Null and `false` mark
    /// an unset value and are always accepted.
    pub fn accepts(self, value: &Value) -> bool {
        if value.is_null() || value == &Value::Bool(false) {
            return true;
        }

        match self {
            FieldKind::Char | FieldKind::Text | FieldKind::Selection | FieldKind::Reference => {
                value.is_string()
            }
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Float | FieldKind::Numeric => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            // ISO strings or epoch numbers
            FieldKind::Date | FieldKind::DateTime => value.is_string() || value.is_number(),
            FieldKind::Many2One => value.is_i64() || value.is_u64(),
            FieldKind::One2Many | FieldKind::Many2Many => value
                .as_array()
                .is_some_and(|ids| ids.iter().all(|id| id.is_i64() || id.is_u64())),
            FieldKind::Binary => value.is_string(),
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = FieldKind::BUILTIN
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(tag, _)| *tag)
            .unwrap_or("unknown");
        write!(f, "{tag}")
    }
}

/// Metadata describing one field of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name; equal to the key it is stored under in a schema
    #[serde(default)]
    pub name: String,
    /// Type tag resolved through the [`FieldFactory`]
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Type-specific metadata (string, relation, selection, ...)
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl FieldDescriptor {
    /// Create a descriptor with no extra metadata.
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            attrs: Map::new(),
        }
    }

    /// Builder-style method to add one metadata entry.
    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Merge another descriptor's metadata into this one. Incoming keys win;
    /// the name is left untouched.
    pub fn merge_from(&mut self, other: &FieldDescriptor) {
        self.type_tag.clone_from(&other.type_tag);
        for (key, value) in &other.attrs {
            self.attrs.insert(key.clone(), value.clone());
        }
    }
}

/// Field behaviour bound to one field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    kind: FieldKind,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Fresh value for a record that gains this field after it was created.
    pub fn create(&self) -> Value {
        self.kind.empty_value()
    }

    /// Value to use when a default lookup omitted this field.
    pub fn missing_default(&self) -> Value {
        Value::Bool(false)
    }
}

/// Registry mapping type tags to field kinds.
#[derive(Debug, Clone)]
pub struct FieldFactory {
    kinds: HashMap<String, FieldKind>,
}

impl FieldFactory {
    /// A factory with no tags registered.
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Register (or re-map) a type tag.
    pub fn register(&mut self, tag: impl Into<String>, kind: FieldKind) -> &mut Self {
        self.kinds.insert(tag.into(), kind);
        self
    }

    /// Resolve a type tag.
    pub fn kind_of(&self, tag: &str) -> Option<FieldKind> {
        self.kinds.get(tag).copied()
    }

    /// Instantiate the behaviour for a descriptor.
    pub fn instantiate(&self, descriptor: &FieldDescriptor) -> Result<Field> {
        let kind =
            self.kind_of(&descriptor.type_tag)
                .ok_or_else(|| Error::UnknownFieldType {
                    field: descriptor.name.clone(),
                    tag: descriptor.type_tag.clone(),
                })?;

        Ok(Field {
            name: descriptor.name.clone(),
            kind,
        })
    }
}

impl Default for FieldFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        for (tag, kind) in FieldKind::BUILTIN {
            factory.register(tag, kind);
        }
        factory
    }
}
