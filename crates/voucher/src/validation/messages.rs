//! Accumulated validation messages for a single entity.

use indexmap::IndexMap;
use serde::Serialize;

use super::rules::RuleLevel;

/// Ordered error/warning messages for one entity, grouped by a rule-specific
/// group name. This is the per-entity result shape consumed by API/CLI
/// layers: `{ queryEntity, sheetName, errors: {group: [msg]}, warnings: .. }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntityMessages {
    #[serde(rename = "queryEntity")]
    concept_alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sheet_name: Option<String>,
    errors: IndexMap<String, Vec<String>>,
    warnings: IndexMap<String, Vec<String>>,
}

impl EntityMessages {
    pub fn new(concept_alias: impl Into<String>, sheet_name: Option<String>) -> Self {
        EntityMessages {
            concept_alias: concept_alias.into(),
            sheet_name,
            errors: IndexMap::new(),
            warnings: IndexMap::new(),
        }
    }

    pub fn concept_alias(&self) -> &str {
        &self.concept_alias
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet_name.as_deref()
    }

    pub fn add_message(&mut self, group: &str, message: impl Into<String>, level: RuleLevel) {
        match level {
            RuleLevel::Error => self.add_error_message(group, message),
            RuleLevel::Warning => self.add_warning_message(group, message),
        }
    }

    pub fn add_error_message(&mut self, group: &str, message: impl Into<String>) {
        push_unique(&mut self.errors, group, message.into());
    }

    pub fn add_warning_message(&mut self, group: &str, message: impl Into<String>) {
        push_unique(&mut self.warnings, group, message.into());
    }

    pub fn error_messages(&self) -> &IndexMap<String, Vec<String>> {
        &self.errors
    }

    pub fn warning_messages(&self) -> &IndexMap<String, Vec<String>> {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Fold another entity's messages into this one, group by group. Used
    /// when multiple validation passes produce messages for the same
    /// (conceptAlias, sheetName) pair.
    pub fn merge(&mut self, other: &EntityMessages) {
        for (group, msgs) in &other.errors {
            for m in msgs {
                self.add_error_message(group, m.clone());
            }
        }
        for (group, msgs) in &other.warnings {
            for m in msgs {
                self.add_warning_message(group, m.clone());
            }
        }
    }
}

/// Duplicate messages within a group are suppressed.
fn push_unique(groups: &mut IndexMap<String, Vec<String>>, group: &str, message: String) {
    let msgs = groups.entry(group.to_string()).or_default();
    if !msgs.contains(&message) {
        msgs.push(message);
    }
}
