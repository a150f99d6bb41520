//! Record collection groups.
//!
//! A [`RecordGroup`] coordinates one logical set of records tied to one
//! remote resource: it owns the observable [`RecordList`], the field
//! [`Schema`], a cursor used for focus navigation, and the identities
//! removed since the last save. Records report their own changes; the group
//! subscribes to each record it holds and re-emits those changes as
//! [`GroupEvent::RecordChanged`].
//!
//! Schema propagation lives in [`merge`](crate::merge) and save
//! reconciliation in [`reconcile`](crate::reconcile); both extend this type.

use crate::{
    error::Result, remote::row_id, Condition, Context, Error,
    FieldFactory, FieldSet, GroupId, Record, RecordId, RecordList, RemoteService, Row, Schema,
    Session, Signal, SubscriptionId, WeakRecord,
};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

/// Batches strictly larger than this are populated with notifications
/// suppressed, followed by a single
/// [`CollectionChange::Reset`](crate::CollectionChange::Reset).
pub const BULK_THRESHOLD: usize = 10;

/// Events emitted by a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    /// The record list changed structurally
    CollectionChanged(crate::CollectionChange),
    /// A record became available to observers
    RecordMaterialized(Record),
    /// A record held by the group reported a change of its own
    RecordChanged(Record),
}

/// An ordered, observable set of records of one remote resource.
pub struct RecordGroup {
    id: GroupId,
    resource: String,
    pub(crate) remote: Rc<dyn RemoteService>,
    pub(crate) session: Rc<Session>,
    pub(crate) factory: Rc<FieldFactory>,
    pub(crate) schema: Schema,
    pub(crate) context: Context,
    parent: Option<WeakRecord>,
    pub(crate) records: RecordList,
    pub(crate) current_idx: Option<usize>,
    pub(crate) removed: Vec<RecordId>,
    pub(crate) on_write: Option<String>,
    events: Signal<GroupEvent>,
    /// Per-record subscriptions, keyed by record uid
    subscriptions: HashMap<u64, SubscriptionId>,
}

impl RecordGroup {
    /// Create an empty group for `resource` with the given field schema.
    pub fn new(
        resource: impl Into<String>,
        fields: &FieldSet,
        remote: Rc<dyn RemoteService>,
        session: Rc<Session>,
    ) -> Result<Self> {
        Self::with_factory(
            resource,
            fields,
            remote,
            session,
            Rc::new(FieldFactory::default()),
        )
    }

    /// Create an empty group resolving field types through `factory`.
    pub fn with_factory(
        resource: impl Into<String>,
        fields: &FieldSet,
        remote: Rc<dyn RemoteService>,
        session: Rc<Session>,
        factory: Rc<FieldFactory>,
    ) -> Result<Self> {
        let schema = Schema::build(fields, &factory)?;
        let events = Signal::new();

        Ok(Self {
            id: NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            resource: resource.into(),
            remote,
            session,
            factory,
            schema,
            context: Context::new(),
            parent: None,
            records: RecordList::new(events.clone()),
            current_idx: None,
            removed: Vec::new(),
            on_write: None,
            events,
            subscriptions: HashMap::new(),
        })
    }

    /// Builder-style method to set the parent record.
    pub fn with_parent(mut self, parent: &Record) -> Self {
        self.parent = Some(parent.downgrade());
        self
    }

    /// Builder-style method to set the group's own context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Builder-style method to set the write hook invoked after each save.
    pub fn with_on_write(mut self, method: impl Into<String>) -> Self {
        self.on_write = Some(method.into());
        self
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The group's own context, without the session layer.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    /// Context sent with remote calls: session keys under the group's keys.
    pub fn request_context(&self) -> Context {
        self.session.merged(&self.context)
    }

    pub fn parent(&self) -> Option<Record> {
        self.parent.as_ref().and_then(WeakRecord::upgrade)
    }

    pub fn on_write(&self) -> Option<&str> {
        self.on_write.as_deref()
    }

    pub fn set_on_write(&mut self, method: Option<String>) {
        self.on_write = method;
    }

    pub fn records(&self) -> &RecordList {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identities removed by [`remove`](Self::remove) and not yet deleted
    /// remotely.
    pub fn removed_ids(&self) -> &[RecordId] {
        &self.removed
    }

    /// Subscribe to the group's events.
    pub fn connect(&self, handler: impl Fn(&GroupEvent) + 'static) -> SubscriptionId {
        self.events.connect(handler)
    }

    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        self.events.disconnect(id)
    }

    /// First record with persisted identity `id`.
    pub fn get_by_id(&self, id: RecordId) -> Option<Record> {
        self.records
            .position_by_id(id)
            .and_then(|idx| self.records.get(idx))
            .cloned()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Hydrate records for `ids`.
    ///
    /// With an empty schema the records are only created (see
    /// [`pre_load`](Self::pre_load)). Otherwise one batched read fetches
    /// every current field; an empty answer returns `Ok(false)` and leaves
    /// the collection untouched. On success the cursor moves to index 0.
    pub fn load(&mut self, ids: &[RecordId], display: bool) -> Result<bool> {
        if ids.is_empty() {
            return Ok(true);
        }
        if self.schema.is_empty() {
            return self.pre_load(ids, display);
        }

        let context = self.request_context();
        let fields = self.schema.field_names();
        let rows = self.remote.read(&self.resource, ids, &fields, &context)?;
        if rows.is_empty() {
            tracing::warn!(resource = %self.resource, requested = ids.len(), "batched read returned no rows");
            return Ok(false);
        }

        tracing::debug!(resource = %self.resource, rows = rows.len(), "loaded records");
        self.load_for(&rows);
        self.current_idx = Some(0);
        Ok(true)
    }

    /// Create unpopulated records for `ids`, announcing each one as
    /// materialized when `display` is set.
    pub fn pre_load(&mut self, ids: &[RecordId], display: bool) -> Result<bool> {
        if ids.is_empty() {
            return Ok(true);
        }

        let _bulk = self.records.bulk(ids.len() > BULK_THRESHOLD);
        for id in ids {
            let record = self.new_record(Some(*id));
            self.model_add(record.clone(), None)?;
            if display {
                self.events.emit(&GroupEvent::RecordMaterialized(record));
            }
        }
        Ok(true)
    }

    /// Append one record per pre-fetched row, populated from the row
    /// without further remote calls.
    pub fn load_for(&mut self, rows: &[Row]) {
        let _bulk = self.records.bulk(rows.len() > BULK_THRESHOLD);
        for row in rows {
            let record = self.new_record(row_id(row));
            record.set(row, false);
            self.records.append(record.clone());
            self.subscribe(&record);
        }
        if self.current_idx.is_none() && !self.records.is_empty() {
            self.current_idx = Some(0);
        }
    }

    /// Populate every record created by [`pre_load`](Self::pre_load) with one
    /// batched read. Returns the number of records populated.
    pub fn load_pending(&mut self) -> Result<usize> {
        if self.schema.is_empty() {
            return Ok(0);
        }

        let pending: Vec<Record> = self
            .records
            .iter()
            .filter(|r| !r.is_loaded() && r.id().is_some())
            .cloned()
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let ids: Vec<RecordId> = pending.iter().filter_map(Record::id).collect();
        let context = self.request_context();
        let rows = self
            .remote
            .read(&self.resource, &ids, &self.schema.field_names(), &context)?;

        let mut populated = 0;
        for row in &rows {
            let Some(id) = row_id(row) else { continue };
            for record in pending.iter().filter(|r| r.id() == Some(id)) {
                record.set(row, true);
                populated += 1;
            }
        }
        tracing::debug!(resource = %self.resource, requested = ids.len(), populated, "loaded pending records");
        Ok(populated)
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    pub(crate) fn new_record(&self, id: Option<RecordId>) -> Record {
        let record = Record::new(self.resource.clone(), id, self.id);
        record.set_parent(self.parent().as_ref());
        record
    }

    /// Add a record owned by this group, appending when `position` is `None`.
    ///
    /// The cursor moves to the new record. A record owned by another group
    /// must go through [`adopt`](Self::adopt) so both schemas are unified
    /// first.
    pub fn model_add(&mut self, record: Record, position: Option<usize>) -> Result<Record> {
        if record.group() != self.id {
            return Err(Error::ForeignRecord {
                record: record.uid(),
                owner: record.group(),
                group: self.id,
            });
        }
        Ok(self.attach(record, position))
    }

    pub(crate) fn attach(&mut self, record: Record, position: Option<usize>) -> Record {
        let index = match position {
            Some(position) => self.records.insert(position, record.clone()),
            None => self.records.append(record.clone()),
        };
        self.current_idx = Some(index);
        record.set_parent(self.parent().as_ref());
        self.subscribe(&record);
        record
    }

    /// Create a blank record bound to this group, optionally seeded with
    /// defaults. The record is announced but not inserted; add it with
    /// [`model_add`](Self::model_add).
    pub fn model_new(
        &mut self,
        default: bool,
        domain: &[Condition],
        context: &Context,
    ) -> Result<Record> {
        let record = self.new_record(None);
        self.subscribe(&record);

        if default {
            let context = self
                .session
                .merged(&crate::context::merge(context, &self.context));
            record.default_get(self.remote.as_ref(), &self.schema, domain, &context)?;
        }

        self.events
            .emit(&GroupEvent::RecordMaterialized(record.clone()));
        Ok(record)
    }

    /// Remove a record without scheduling a remote delete. Returns its
    /// former index.
    pub fn model_remove(&mut self, record: &Record) -> Option<usize> {
        let index = self.records.remove(record)?;
        self.detach(record, index);
        Some(index)
    }

    /// Remove a record on behalf of the user. A persisted record's identity
    /// is queued for deletion on the next [`save`](Self::save). Returns its
    /// former index.
    pub fn remove(&mut self, record: &Record) -> Option<usize> {
        let index = self.records.position(record)?;
        if let Some(id) = record.id() {
            self.removed.push(id);
        }
        self.records.remove_at(index);
        self.detach(record, index);
        Some(index)
    }

    fn detach(&mut self, record: &Record, index: usize) {
        self.unsubscribe(record);
        if let Some(parent) = record.parent() {
            parent.mark_modified();
        }
        self.current_idx = if self.records.is_empty() {
            None
        } else {
            Some(index.min(self.records.len() - 1))
        };
    }

    /// Remove every record and forget pending deletions.
    pub fn clear(&mut self) {
        for record in self.records.clear() {
            self.unsubscribe(&record);
        }
        self.removed.clear();
        self.current_idx = None;
    }

    fn subscribe(&mut self, record: &Record) {
        if self.subscriptions.contains_key(&record.uid()) {
            return;
        }

        let events = self.events.clone();
        let weak = record.downgrade();
        let subscription = record.connect(move |_| {
            if let Some(record) = weak.upgrade() {
                events.emit(&GroupEvent::RecordChanged(record));
            }
        });
        self.subscriptions.insert(record.uid(), subscription);
        tracing::trace!(group = self.id, record = record.uid(), "subscribed to record");
    }

    fn unsubscribe(&mut self, record: &Record) {
        if let Some(subscription) = self.subscriptions.remove(&record.uid()) {
            record.disconnect(subscription);
        }
    }

    /// True if the group re-emits this record's changes.
    pub fn is_subscribed(&self, record: &Record) -> bool {
        self.subscriptions.contains_key(&record.uid())
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    pub fn current_idx(&self) -> Option<usize> {
        self.current_idx
    }

    /// Record under the cursor.
    pub fn current(&self) -> Option<Record> {
        self.current_idx
            .and_then(|idx| self.records.get(idx))
            .cloned()
    }

    /// Move the cursor to `index`. Out-of-range indices leave it unchanged.
    pub fn set_current(&mut self, index: usize) -> Option<Record> {
        let record = self.records.get(index).cloned()?;
        self.current_idx = Some(index);
        Some(record)
    }

    /// Move the cursor back one record, wrapping around.
    pub fn prev(&mut self) -> Option<Record> {
        self.step(false)
    }

    /// Move the cursor forward one record, wrapping around.
    pub fn next(&mut self) -> Option<Record> {
        self.step(true)
    }

    fn step(&mut self, forward: bool) -> Option<Record> {
        let len = self.records.len();
        if len == 0 {
            return None;
        }

        let idx = match self.current_idx {
            Some(idx) if forward => (idx + 1) % len,
            Some(idx) => (idx % len + len - 1) % len,
            None => 0,
        };
        self.current_idx = Some(idx);
        self.records.get(idx).cloned()
    }
}

impl<'a> IntoIterator for &'a RecordGroup {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Debug for RecordGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordGroup")
            .field("id", &self.id)
            .field("resource", &self.resource)
            .field("fields", &self.schema.field_names())
            .field("len", &self.records.len())
            .field("current_idx", &self.current_idx)
            .field("removed", &self.removed)
            .field("on_write", &self.on_write)
            .finish()
    }
}
