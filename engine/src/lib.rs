//! # Rowset Engine
//!
//! A client-side record collection engine for remote-backed data.
//!
//! This crate keeps an ordered, observable set of records that mirror rows
//! owned by a remote service. It loads them in batches, tracks local edits,
//! propagates field schemas between related collections, saves changes back,
//! and reconciles with whatever the server reports as side effects of a save.
//!
//! ## Design Principles
//!
//! - **No IO**: every remote interaction goes through the [`RemoteService`] trait
//! - **Single-threaded**: records and groups are `Rc` handles, observed through
//!   [`Signal`]s that may be re-entered from their own handlers
//! - **No ownership cycles**: a record refers to its group by [`GroupId`] and to
//!   its parent through a [`WeakRecord`]
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] holds one entity's field values, its identity (none until the
//! first save), and dirty/loaded state. Field changes are announced as
//! [`RecordEvent`]s.
//!
//! ### Groups
//!
//! A [`RecordGroup`] owns a [`RecordList`], a field [`Schema`], a cursor for
//! focus navigation, and the identities deleted since the last save. It
//! re-emits every change of the records it holds as a [`GroupEvent`].
//!
//! ### Bulk loading
//!
//! Batches larger than [`BULK_THRESHOLD`] populate the list under a
//! [`BulkGuard`]: per-record notifications are suppressed and replaced by one
//! [`CollectionChange::Reset`].
//!
//! ### Schema propagation
//!
//! [`RecordGroup::add_fields`] extends a group's schema and fetches values for
//! the added fields. [`RecordGroup::adopt`] unifies two groups' schemas before
//! moving a record between them.
//!
//! ## Quick Start
//!
//! ```rust
//! use rowset_engine::{
//!     Context, FieldDescriptor, FieldSet, RecordGroup, RecordId, RemoteService, Result, Row,
//!     Session, Values,
//! };
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! // 1. Provide a remote service
//! struct Static;
//!
//! impl RemoteService for Static {
//!     fn read(&self, _: &str, ids: &[RecordId], _: &[String], _: &Context) -> Result<Vec<Row>> {
//!         Ok(ids
//!             .iter()
//!             .map(|id| json!({"id": id, "name": format!("party {id}")}))
//!             .filter_map(|row| row.as_object().cloned())
//!             .collect())
//!     }
//!     fn default_get(&self, _: &str, _: &[String], _: &Context) -> Result<Values> {
//!         Ok(Values::new())
//!     }
//!     fn create(&self, _: &str, _: &Values, _: &Context) -> Result<RecordId> {
//!         Ok(100)
//!     }
//!     fn write(&self, _: &str, _: &[RecordId], _: &Values, _: &Context) -> Result<()> {
//!         Ok(())
//!     }
//!     fn delete(&self, _: &str, _: &[RecordId], _: &Context) -> Result<()> {
//!         Ok(())
//!     }
//!     fn call(&self, _: &str, _: &str, _: RecordId, _: &Context) -> Result<Vec<RecordId>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! // 2. Describe the fields
//! let mut fields = FieldSet::new();
//! fields.insert("name".into(), FieldDescriptor::new("name", "char"));
//!
//! // 3. Create a group and load records
//! let mut group = RecordGroup::new("party", &fields, Rc::new(Static), Rc::new(Session::new()))?;
//! assert!(group.load(&[1, 2], true)?);
//!
//! // 4. Navigate
//! assert_eq!(group.current().and_then(|r| r.id()), Some(1));
//! assert_eq!(group.next().and_then(|r| r.value("name")), Some(json!("party 2")));
//! # Ok::<(), rowset_engine::Error>(())
//! ```

pub mod context;
pub mod error;
pub mod field;
pub mod group;
pub mod list;
pub mod merge;
pub mod reconcile;
pub mod record;
pub mod remote;
pub mod schema;
pub mod signal;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{Context, Session};
pub use error::{Error, Result};
pub use field::{Field, FieldDescriptor, FieldFactory, FieldKind};
pub use group::{GroupEvent, RecordGroup, BULK_THRESHOLD};
pub use list::{BulkGuard, CollectionChange, RecordList};
pub use record::{Condition, Record, RecordEvent, WeakRecord};
pub use remote::{RemoteService, Row, Values};
pub use schema::{FieldSet, Schema};
pub use signal::{Signal, SubscriptionId};

/// Persisted identity of a record, assigned by the remote service.
pub type RecordId = i64;

/// Process-unique identity of a group.
pub type GroupId = u64;
