//! Controlled vocabulary lists and expedition metadata descriptors.

use serde::{Deserialize, Serialize};

/// One allowed value in a controlled vocabulary [`List`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Field {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defined_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl Field {
    pub fn new(value: impl Into<String>) -> Self {
        Field {
            value: value.into(),
            ..Default::default()
        }
    }
}

/// A named list of allowed values. Multiple rules can refer to the same list,
/// so lists are defined once on the config and referenced by alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct List {
    pub alias: String,
    pub case_insensitive: bool,
    pub fields: Vec<Field>,
    /// True when the list is inherited from the network config and may not
    /// be altered at project level.
    pub network_list: bool,
}

impl List {
    pub fn new(alias: impl Into<String>) -> Self {
        List {
            alias: alias.into(),
            ..Default::default()
        }
    }

    /// Membership check honoring the list's case sensitivity.
    pub fn contains_value(&self, value: &str) -> bool {
        if self.case_insensitive {
            self.fields
                .iter()
                .any(|f| f.value.eq_ignore_ascii_case(value))
        } else {
            self.fields.iter().any(|f| f.value == value)
        }
    }
}

/// A project-level expedition metadata property declared by the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpeditionMetadataProperty {
    pub name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl ExpeditionMetadataProperty {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        ExpeditionMetadataProperty {
            name: name.into(),
            required,
            uri: None,
        }
    }
}
