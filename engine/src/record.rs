//! Records: single remote-backed entities.
//!
//! A [`Record`] is a cheap, cloneable handle to one entity: its identity
//! (none until persisted), its field values, and dirty/loaded state. It
//! remembers the [`GroupId`] of the group that owns it and, optionally, a
//! weak reference to a parent record. Field changes are announced through a
//! [`Signal`] after the record's internal borrow has been released, so
//! handlers may freely read the record they are notified about.

use crate::{
    error::Result, remote::row_id, Context, Error, GroupId, RecordId, RemoteService, Schema,
    Signal, SubscriptionId, Values,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Events emitted by a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEvent {
    /// Values of these fields changed
    Changed { fields: Vec<String> },
}

/// One clause of a search domain, used to seed defaults of new records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

impl Condition {
    /// An equality clause.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: "=".to_string(),
            value,
        }
    }
}

#[derive(Debug)]
struct State {
    id: Option<RecordId>,
    resource: String,
    group: GroupId,
    parent: Option<WeakRecord>,
    values: Values,
    loaded: bool,
    /// Fields changed locally since the last save or reload
    dirty: BTreeSet<String>,
    /// Set when a child collection of this record changed
    modified: bool,
}

struct Inner {
    uid: u64,
    state: RefCell<State>,
    events: Signal<RecordEvent>,
}

/// Handle to a record.
#[derive(Clone)]
pub struct Record {
    inner: Rc<Inner>,
}

/// Non-owning reference to a record.
#[derive(Clone)]
pub struct WeakRecord {
    inner: Weak<Inner>,
}

impl Record {
    /// Create a record of `resource` owned by `group`. It carries no values
    /// and is not loaded.
    pub fn new(resource: impl Into<String>, id: Option<RecordId>, group: GroupId) -> Self {
        Self {
            inner: Rc::new(Inner {
                uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
                state: RefCell::new(State {
                    id,
                    resource: resource.into(),
                    group,
                    parent: None,
                    values: Values::new(),
                    loaded: false,
                    dirty: BTreeSet::new(),
                    modified: false,
                }),
                events: Signal::new(),
            }),
        }
    }

    /// Process-unique handle identifier, stable for the record's lifetime.
    pub fn uid(&self) -> u64 {
        self.inner.uid
    }

    /// Persisted identity, if any.
    pub fn id(&self) -> Option<RecordId> {
        self.inner.state.borrow().id
    }

    pub fn resource(&self) -> String {
        self.inner.state.borrow().resource.clone()
    }

    /// Group that currently owns this record.
    pub fn group(&self) -> GroupId {
        self.inner.state.borrow().group
    }

    pub(crate) fn set_group(&self, group: GroupId) {
        self.inner.state.borrow_mut().group = group;
    }

    pub fn parent(&self) -> Option<Record> {
        self.inner
            .state
            .borrow()
            .parent
            .as_ref()
            .and_then(WeakRecord::upgrade)
    }

    pub fn set_parent(&self, parent: Option<&Record>) {
        self.inner.state.borrow_mut().parent = parent.map(Record::downgrade);
    }

    /// True until the record has a persisted identity.
    pub fn is_new(&self) -> bool {
        self.inner.state.borrow().id.is_none()
    }

    /// True once values were populated from the remote service.
    pub fn is_loaded(&self) -> bool {
        self.inner.state.borrow().loaded
    }

    /// True if any field changed locally or a child collection changed.
    pub fn is_modified(&self) -> bool {
        let state = self.inner.state.borrow();
        state.modified || !state.dirty.is_empty()
    }

    /// Flag this record as modified on behalf of a child collection.
    pub fn mark_modified(&self) {
        self.inner.state.borrow_mut().modified = true;
    }

    /// Fields changed locally since the last save or reload.
    pub fn dirty_fields(&self) -> Vec<String> {
        self.inner.state.borrow().dirty.iter().cloned().collect()
    }

    pub fn value(&self, field: &str) -> Option<Value> {
        self.inner.state.borrow().values.get(field).cloned()
    }

    /// Copy of every field value.
    pub fn values(&self) -> Values {
        self.inner.state.borrow().values.clone()
    }

    pub fn downgrade(&self) -> WeakRecord {
        WeakRecord {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Subscribe to this record's events.
    pub fn connect(&self, handler: impl Fn(&RecordEvent) + 'static) -> SubscriptionId {
        self.inner.events.connect(handler)
    }

    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        self.inner.events.disconnect(id)
    }

    /// Populate values as read from the remote service. An `id` key is
    /// ignored. Marks the record loaded; emits `Changed` when `signal` is set
    /// and at least one field was given.
    pub fn set(&self, values: &Values, signal: bool) {
        let fields = {
            let mut state = self.inner.state.borrow_mut();
            let mut fields = Vec::with_capacity(values.len());
            for (name, value) in values {
                if name == "id" {
                    continue;
                }
                state.values.insert(name.clone(), value.clone());
                state.dirty.remove(name);
                fields.push(name.clone());
            }
            state.loaded = true;
            fields
        };

        if signal && !fields.is_empty() {
            self.inner.events.emit(&RecordEvent::Changed { fields });
        }
    }

    /// Apply default values. Defaults count as local changes, so they are
    /// sent on the next save.
    pub fn set_default(&self, values: &Values) {
        let fields = {
            let mut state = self.inner.state.borrow_mut();
            let mut fields = Vec::with_capacity(values.len());
            for (name, value) in values {
                if name == "id" {
                    continue;
                }
                state.values.insert(name.clone(), value.clone());
                state.dirty.insert(name.clone());
                fields.push(name.clone());
            }
            fields
        };

        if !fields.is_empty() {
            self.inner.events.emit(&RecordEvent::Changed { fields });
        }
    }

    /// Change one field locally.
    pub fn set_field(&self, field: impl Into<String>, value: Value) {
        let field = field.into();
        {
            let mut state = self.inner.state.borrow_mut();
            state.values.insert(field.clone(), value);
            state.dirty.insert(field.clone());
        }
        self.inner.events.emit(&RecordEvent::Changed {
            fields: vec![field],
        });
    }

    /// Give the record a value for a field it never had, without signalling.
    pub(crate) fn init_field(&self, field: &str, value: Value) {
        self.inner
            .state
            .borrow_mut()
            .values
            .insert(field.to_string(), value);
    }

    /// Create or update this record on the remote service.
    ///
    /// New records send every value through `create`; persisted records send
    /// only their dirty fields through `write` (nothing at all when clean).
    /// Returns the persisted identity.
    pub fn save(&self, remote: &dyn RemoteService, context: &Context) -> Result<RecordId> {
        let (id, resource, payload) = {
            let state = self.inner.state.borrow();
            let payload: Values = match state.id {
                None => state.values.clone(),
                Some(_) => state
                    .dirty
                    .iter()
                    .filter_map(|f| state.values.get(f).map(|v| (f.clone(), v.clone())))
                    .collect(),
            };
            (state.id, state.resource.clone(), payload)
        };

        let id = match id {
            None => {
                let id = remote.create(&resource, &payload, context)?;
                tracing::debug!(resource = %resource, id, "created record");
                id
            }
            Some(id) => {
                if !payload.is_empty() {
                    remote.write(&resource, &[id], &payload, context)?;
                    tracing::debug!(resource = %resource, id, fields = payload.len(), "wrote record");
                }
                id
            }
        };

        let mut state = self.inner.state.borrow_mut();
        state.id = Some(id);
        state.dirty.clear();
        state.modified = false;
        Ok(id)
    }

    /// Refresh `fields` from the remote service, discarding local changes.
    pub fn reload(
        &self,
        remote: &dyn RemoteService,
        fields: &[String],
        context: &Context,
    ) -> Result<()> {
        let id = self.id().ok_or(Error::MissingIdentity)?;
        let resource = self.resource();

        let rows = remote.read(&resource, &[id], fields, context)?;
        let row = rows
            .into_iter()
            .find(|row| row_id(row) == Some(id))
            .ok_or(Error::RecordNotFound(id))?;

        {
            let mut state = self.inner.state.borrow_mut();
            state.dirty.clear();
            state.modified = false;
        }
        self.set(&row, true);
        tracing::trace!(resource = %resource, id, "reloaded record");
        Ok(())
    }

    /// Fetch and apply defaults for every field of `schema`.
    ///
    /// Fields the service omits get their kind's empty value. Equality
    /// clauses of `domain` on known fields override the fetched defaults.
    pub fn default_get(
        &self,
        remote: &dyn RemoteService,
        schema: &Schema,
        domain: &[Condition],
        context: &Context,
    ) -> Result<()> {
        let names = schema.field_names();
        if names.is_empty() {
            return Ok(());
        }

        let mut values = remote.default_get(&self.resource(), &names, context)?;
        for name in &names {
            if !values.contains_key(name) {
                if let Some(field) = schema.field(name) {
                    values.insert(name.clone(), field.missing_default());
                }
            }
        }
        for condition in domain {
            if condition.operator == "=" && schema.contains(&condition.field) {
                values.insert(condition.field.clone(), condition.value.clone());
            }
        }

        self.set_default(&values);
        Ok(())
    }

    /// True if both handles point at the same record.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Record {}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Record")
            .field("uid", &self.inner.uid)
            .field("id", &state.id)
            .field("resource", &state.resource)
            .field("group", &state.group)
            .field("loaded", &state.loaded)
            .finish()
    }
}

impl WeakRecord {
    pub fn upgrade(&self) -> Option<Record> {
        self.inner.upgrade().map(|inner| Record { inner })
    }
}

impl fmt::Debug for WeakRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakRecord")
    }
}
