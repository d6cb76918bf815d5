//! The property-bag record and its load metadata.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single data row, keyed by attribute uri.
///
/// Values are stored verbatim; [`Record::get`] trims surrounding whitespace
/// so rules and joins never see padding artifacts from source files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    properties: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_identifier: Option<String>,
    project_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    expedition_code: Option<String>,
    #[serde(skip_serializing, default = "default_persist")]
    persist: bool,
    #[serde(skip)]
    error: bool,
}

fn default_persist() -> bool {
    true
}

impl Record {
    pub const ROOT_IDENTIFIER: &'static str = "rootIdentifier";
    pub const PROJECT_ID: &'static str = "projectId";
    pub const EXPEDITION_CODE: &'static str = "expeditionCode";

    /// Build a record from reader output. The reserved `rootIdentifier`,
    /// `projectId` and `expeditionCode` keys are lifted out of the property
    /// bag into their typed fields.
    pub fn new(mut properties: IndexMap<String, String>) -> Self {
        let root_identifier = properties
            .shift_remove(Self::ROOT_IDENTIFIER)
            .filter(|v| !v.trim().is_empty());
        let project_id = properties
            .shift_remove(Self::PROJECT_ID)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let expedition_code = properties
            .shift_remove(Self::EXPEDITION_CODE)
            .filter(|v| !v.trim().is_empty());

        Record {
            properties,
            root_identifier,
            project_id,
            expedition_code,
            persist: true,
            error: false,
        }
    }

    pub fn with_root_identifier(mut self, root_identifier: impl Into<String>) -> Self {
        self.root_identifier = Some(root_identifier.into());
        self
    }

    pub fn with_project_id(mut self, project_id: u32) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn with_expedition_code(mut self, expedition_code: impl Into<String>) -> Self {
        self.expedition_code = Some(expedition_code.into());
        self
    }

    pub fn set_expedition_code(&mut self, expedition_code: impl Into<String>) {
        self.expedition_code = Some(expedition_code.into());
    }

    /// Records loaded for context only (existing data fetched alongside an
    /// upload) are never persisted.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// The trimmed value for a uri, or "" when absent.
    pub fn get(&self, uri: &str) -> &str {
        self.properties.get(uri).map(|v| v.trim()).unwrap_or("")
    }

    pub fn has(&self, uri: &str) -> bool {
        !self.get(uri).is_empty()
    }

    /// Set a property value. A modified record is always persisted again.
    pub fn set(&mut self, uri: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(uri.into(), value.into());
        self.persist = true;
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    pub fn root_identifier(&self) -> Option<&str> {
        self.root_identifier.as_deref()
    }

    pub fn project_id(&self) -> u32 {
        self.project_id
    }

    pub fn expedition_code(&self) -> Option<&str> {
        self.expedition_code.as_deref()
    }

    /// Mark this record as having failed an ERROR-level rule. Once set, the
    /// record is excluded from persistence and later rules skip it.
    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Should this record be written back? False for context-only records
    /// and records that failed validation.
    pub fn persist(&self) -> bool {
        self.persist && !self.error
    }
}

/// Equality is by data and provenance; the transient persist/error flags do
/// not participate, so a fetched copy of an uploaded record compares equal.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties
            && self.root_identifier == other.root_identifier
            && self.project_id == other.project_id
            && self.expedition_code == other.expedition_code
    }
}

impl Eq for Record {}

/// Provenance carried alongside records while a dataset is being built:
/// which reader produced them and any reader-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordMetadata {
    pub reader_type: String,
    pub reload: bool,
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl RecordMetadata {
    pub fn new(reader_type: impl Into<String>, reload: bool) -> Self {
        RecordMetadata {
            reader_type: reader_type.into(),
            reload,
            metadata: IndexMap::new(),
        }
    }

    pub fn add(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }
}
