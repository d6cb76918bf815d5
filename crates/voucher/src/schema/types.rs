//! Core type definitions for the schema model.

use serde::{Deserialize, Serialize};

/// Declared data type of an [`Attribute`](super::Attribute).
///
/// Serialized in the uppercase form the persisted config documents use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Integer,
    /// Text values, the default when a config omits the type.
    #[default]
    String,
    Date,
    Datetime,
    Time,
    Float,
    Boolean,
}

impl DataType {
    /// Returns true for DATE, DATETIME and TIME, the types that require a
    /// `dataFormat` on their attribute.
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Datetime | DataType::Time)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataType::Integer => "INTEGER",
            DataType::String => "STRING",
            DataType::Date => "DATE",
            DataType::Datetime => "DATETIME",
            DataType::Time => "TIME",
            DataType::Float => "FLOAT",
            DataType::Boolean => "BOOLEAN",
        };
        f.write_str(s)
    }
}

/// The concrete record representation an entity produces.
///
/// A compile-time registry keyed by the serialized discriminant; readers and
/// persistence layers dispatch on it. `Generic` is the property-bag
/// representation every entity uses unless a specialized one is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RecordType {
    #[default]
    #[serde(rename = "GenericRecord")]
    Generic,
}
