//! Error types for the rowset engine.

use crate::{GroupId, RecordId};
use thiserror::Error;

/// All possible errors from the rowset engine.
///
/// Expected absences (an empty batch read, a missing write hook, navigation
/// on an empty collection) are not errors; they surface as `false`, `None`
/// or empty collections from the operations themselves.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Schema errors
    #[error("unknown field type '{tag}' for field '{field}'")]
    UnknownFieldType { field: String, tag: String },

    // Membership errors
    #[error("record {record} is owned by group {owner}, not group {group}")]
    ForeignRecord {
        record: u64,
        owner: GroupId,
        group: GroupId,
    },

    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("record has no persisted identity")]
    MissingIdentity,

    // Remote collaborator faults, propagated as-is
    #[error("remote service error: {0}")]
    Remote(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::RecordNotFound(42);
        assert_eq!(err.to_string(), "record not found: 42");

        let err = Error::UnknownFieldType {
            field: "colour".into(),
            tag: "rgb".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown field type 'rgb' for field 'colour'"
        );

        let err = Error::ForeignRecord {
            record: 3,
            owner: 1,
            group: 2,
        };
        assert_eq!(
            err.to_string(),
            "record 3 is owned by group 1, not group 2"
        );
    }
}
