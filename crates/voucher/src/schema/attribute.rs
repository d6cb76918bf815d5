//! Attribute definition: a typed, URI-identified field of an entity.

use serde::{Deserialize, Serialize};

use super::types::DataType;

/// A single field of an [`Entity`](super::Entity), mapping a display column
/// to a stable semantic uri.
///
/// Identity is the `uri`: two attributes are equal iff their uris are equal,
/// regardless of column or type refinements.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Attribute {
    /// Display/source column name.
    pub column: String,
    /// Stable semantic identifier. Immutable once referenced by records.
    pub uri: String,
    pub data_type: DataType,
    /// Format string(s) for temporal types, comma-separated chrono patterns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_format: Option<String>,
    /// Ontology/standard that defines this attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defined_by: Option<String>,
    /// Delimiter for multi-valued cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimited_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Internal attributes are system-populated, not user-supplied.
    pub internal: bool,
    /// Allow the sentinel value "Unknown" for numeric/temporal types.
    pub allow_unknown: bool,
    /// Allow the sentinel values "TBD" / "to be determined".
    pub allow_tbd: bool,
}

impl Attribute {
    pub fn new(column: impl Into<String>, uri: impl Into<String>) -> Self {
        Attribute {
            column: column.into(),
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Is `val` the "Unknown" sentinel?
    pub fn is_unknown_value(val: &str) -> bool {
        val.eq_ignore_ascii_case("unknown")
    }

    /// Is `val` one of the "TBD" sentinels?
    pub fn is_tbd_value(val: &str) -> bool {
        let v = val.to_lowercase();
        v == "tbd" || v == "to be determined"
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Attribute {}

impl std::hash::Hash for Attribute {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_uri() {
        let mut a = Attribute::new("genus", "urn:genus");
        let mut b = Attribute::new("Genus", "urn:genus");
        b.data_type = DataType::Integer;
        assert_eq!(a, b);

        a.uri = "urn:other".into();
        assert_ne!(a, b);
    }

    #[test]
    fn sentinel_values() {
        assert!(Attribute::is_unknown_value("Unknown"));
        assert!(Attribute::is_unknown_value("unknown"));
        assert!(!Attribute::is_unknown_value("known"));
        assert!(Attribute::is_tbd_value("TBD"));
        assert!(Attribute::is_tbd_value("To Be Determined"));
        assert!(!Attribute::is_tbd_value("later"));
    }

    #[test]
    fn deserializes_from_config_document() {
        let a: Attribute = serde_json::from_str(
            r#"{"column":"eventDate","uri":"urn:eventDate","dataType":"DATE","dataFormat":"%Y-%m-%d"}"#,
        )
        .unwrap();
        assert_eq!(a.column, "eventDate");
        assert_eq!(a.data_type, DataType::Date);
        assert_eq!(a.data_format.as_deref(), Some("%Y-%m-%d"));
        assert!(!a.internal);
    }
}
