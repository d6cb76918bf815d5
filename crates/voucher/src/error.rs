//! Error types for the voucher library.
//!
//! Validation findings (structural config problems, rule failures) are never
//! errors; they accumulate into message lists so a full pass always reports
//! everything wrong. Only conditions the pipeline cannot safely continue past
//! are raised here.

use thiserror::Error;

/// Main error type for voucher operations.
#[derive(Debug, Error)]
pub enum VoucherError {
    /// An attribute lookup that the caller expected to succeed did not.
    #[error("entity \"{entity}\" has no attribute for \"{column_or_uri}\"")]
    MissingAttribute {
        entity: String,
        column_or_uri: String,
    },

    /// A conceptAlias that does not resolve to an entity in the config.
    #[error("entity \"{0}\" does not exist in the config")]
    UnknownEntity(String),

    /// Two or more records share an identifier but carry conflicting data.
    #[error("invalid records, identifiers used more than once with differing data: {}", .identifiers.join(", "))]
    InvalidRecords { identifiers: Vec<String> },

    /// A join could not resolve a required ancestor record.
    #[error("missing record while joining ancestry for \"{}\"", .identifier.as_deref().unwrap_or("<unknown>"))]
    MissingRecord { identifier: Option<String> },

    /// A child RecordSet was validated without its parent RecordSet.
    #[error("entity \"{0}\" is a child entity, but no parent RecordSet was supplied")]
    MissingParentRecordSet(String),

    /// JSON serialization/deserialization error for config documents.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for voucher operations.
pub type Result<T> = std::result::Result<T, VoucherError>;
