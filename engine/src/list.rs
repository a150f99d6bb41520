//! Observable ordered collection of records.
//!
//! [`RecordList`] is an ordered sequence of records that announces every
//! mutation on its owner's event signal as a [`CollectionChange`]. It does
//! not prevent duplicates; that is the owner's responsibility.
//!
//! Bulk population runs under a [`BulkGuard`]: while a guard is active the
//! list still mutates but stays silent, and when the guard is dropped a
//! single [`CollectionChange::Reset`] replaces the suppressed sequence.

use crate::{GroupEvent, Record, RecordId, Signal};
use std::cell::Cell;
use std::rc::Rc;

/// A structural change of a record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionChange {
    Added { position: usize },
    Removed { position: usize },
    Changed { position: usize },
    /// A bulk operation finished; observers should re-read the whole list
    Reset,
}

/// Ordered, observable sequence of records.
#[derive(Debug)]
pub struct RecordList {
    records: Vec<Record>,
    locked: Rc<Cell<bool>>,
    events: Signal<GroupEvent>,
}

impl RecordList {
    /// Create an empty list announcing changes on `events`.
    pub fn new(events: Signal<GroupEvent>) -> Self {
        Self {
            records: Vec::new(),
            locked: Rc::new(Cell::new(false)),
            events,
        }
    }

    fn notify(&self, change: CollectionChange) {
        if !self.locked.get() {
            self.events.emit(&GroupEvent::CollectionChanged(change));
        }
    }

    /// Insert at `position`, clamped to the current length. Returns the
    /// index the record landed at.
    pub fn insert(&mut self, position: usize, record: Record) -> usize {
        let position = position.min(self.records.len());
        self.records.insert(position, record);
        self.notify(CollectionChange::Added { position });
        position
    }

    /// Append at the end. Returns the index the record landed at.
    pub fn append(&mut self, record: Record) -> usize {
        self.records.push(record);
        let position = self.records.len() - 1;
        self.notify(CollectionChange::Added { position });
        position
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Record> {
        if index >= self.records.len() {
            return None;
        }
        let record = self.records.remove(index);
        self.notify(CollectionChange::Removed { position: index });
        Some(record)
    }

    /// Remove the first occurrence of `record`. Returns its former index.
    pub fn remove(&mut self, record: &Record) -> Option<usize> {
        let index = self.position(record)?;
        self.remove_at(index);
        Some(index)
    }

    /// Remove every record from the end, announcing each removal with the
    /// length remaining after the pop. Returns the records in removal order.
    pub fn clear(&mut self) -> Vec<Record> {
        let mut removed = Vec::with_capacity(self.records.len());
        while let Some(record) = self.records.pop() {
            removed.push(record);
            self.notify(CollectionChange::Removed {
                position: self.records.len(),
            });
        }
        removed
    }

    /// Replace the record at `index`, returning the previous one.
    pub fn replace_at(&mut self, index: usize, record: Record) -> Option<Record> {
        let slot = self.records.get_mut(index)?;
        let previous = std::mem::replace(slot, record);
        self.notify(CollectionChange::Changed { position: index });
        Some(previous)
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn position(&self, record: &Record) -> Option<usize> {
        self.records.iter().position(|r| r.ptr_eq(record))
    }

    /// Index of the first record with persisted identity `id`.
    pub fn position_by_id(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == Some(id))
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

    /// True while notifications are suppressed.
    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    /// Suppress notifications until the returned guard is dropped.
    ///
    /// An inactive guard (or one taken while another guard already holds the
    /// lock) does nothing; only the guard that actually took the lock
    /// releases it and emits the closing [`CollectionChange::Reset`].
    pub fn bulk(&self, active: bool) -> BulkGuard {
        let active = active && !self.locked.get();
        if active {
            self.locked.set(true);
        }
        BulkGuard {
            locked: Rc::clone(&self.locked),
            events: self.events.clone(),
            active,
        }
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Scoped notification suppression for a [`RecordList`].
#[must_use = "notifications resume as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BulkGuard {
    locked: Rc<Cell<bool>>,
    events: Signal<GroupEvent>,
    active: bool,
}

impl BulkGuard {
    /// True if this guard holds the lock.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for BulkGuard {
    fn drop(&mut self) {
        if self.active {
            self.locked.set(false);
            self.events
                .emit(&GroupEvent::CollectionChanged(CollectionChange::Reset));
        }
    }
}
