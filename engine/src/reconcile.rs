//! Save reconciliation.
//!
//! Saving a group pushes its state to the remote service and then lets the
//! service tell the group which related records must be present afterwards.
//!
//! # Algorithm
//!
//! 1. Delete every identity queued by [`RecordGroup::remove`] in one call
//! 2. Save each record in collection order (create or write dirty fields)
//! 3. After each record, run the group's write hook with the saved identity
//! 4. Reload hook results already in the group; insert and load the others
//!    next to the edited record

use crate::{error::Result, Record, RecordGroup, RecordId};

impl RecordGroup {
    /// Persist the group. Returns the saved identities in collection order.
    ///
    /// Pending deletions go first and are forgotten only once the remote
    /// service accepted them. The first failing call aborts the save.
    pub fn save(&mut self) -> Result<Vec<RecordId>> {
        let context = self.request_context();

        if !self.removed.is_empty() {
            self.remote.delete(self.resource(), &self.removed, &context)?;
            tracing::debug!(resource = %self.resource(), count = self.removed.len(), "deleted removed records");
            self.removed.clear();
        }

        let records: Vec<Record> = self.records.iter().cloned().collect();
        let mut saved = Vec::with_capacity(records.len());
        for record in records {
            let id = record.save(self.remote.as_ref(), &context)?;
            self.writen(id)?;
            saved.push(id);
        }

        tracing::info!(resource = %self.resource(), saved = saved.len(), "saved group");
        Ok(saved)
    }

    /// Run the write hook after record `edited_id` was persisted.
    ///
    /// Every identity the hook returns that the group already holds is
    /// reloaded. Each other identity becomes a new record loaded from the
    /// remote service and inserted at `min(index of edited_id, len - 1)`,
    /// measured against the current length at each insertion. Without the
    /// edited record in the group new records are appended.
    ///
    /// Returns the first inserted record, or `None` when nothing was
    /// inserted or no hook is configured.
    pub fn writen(&mut self, edited_id: RecordId) -> Result<Option<Record>> {
        let Some(method) = self.on_write.clone() else {
            return Ok(None);
        };

        let context = self.request_context();
        let ids = self
            .remote
            .call(self.resource(), &method, edited_id, &context)?;
        let anchor = self.records.position_by_id(edited_id);
        let fields = self.schema.field_names();

        let mut first = None;
        for id in ids {
            let existing: Vec<Record> = self
                .records
                .iter()
                .filter(|r| r.id() == Some(id))
                .cloned()
                .collect();
            if !existing.is_empty() {
                for record in existing {
                    record.reload(self.remote.as_ref(), &fields, &context)?;
                }
                continue;
            }

            let record = self.new_record(Some(id));
            record.reload(self.remote.as_ref(), &fields, &context)?;
            let len = self.records.len();
            let position = match anchor {
                Some(index) => index.min(len.saturating_sub(1)),
                None => len,
            };
            self.attach(record.clone(), Some(position));
            tracing::debug!(resource = %self.resource(), id, position, hook = %method, "inserted record from write hook");
            if first.is_none() {
                first = Some(record);
            }
        }
        Ok(first)
    }
}
