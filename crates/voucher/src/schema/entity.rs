//! Entity definitions: a named record type with attributes and rules.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VoucherError};
use crate::validation::rules::{
    CompositeUniqueValueRule, RequiredValueRule, Rule, RuleLevel, UniqueValueRule, ValidForUriRule,
};

use super::{Attribute, RecordType};

/// Distinguishes plain entities from child entities, which belong to a
/// parent and inherit its identifier column. Serialized as the `type`
/// property of the entity object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EntityVariant {
    #[default]
    #[serde(rename = "DefaultEntity")]
    Default,
    #[serde(rename = "ChildEntity")]
    Child,
}

/// A named record type in a config: its attributes, identity settings and
/// validation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Entity {
    pub concept_alias: String,
    #[serde(rename = "conceptURI", skip_serializing_if = "Option::is_none")]
    pub concept_uri: Option<String>,
    pub attributes: Vec<Attribute>,
    pub rules: Vec<Rule>,
    /// Column whose values identify records of this entity. For hashed
    /// entities the values in this column are generated from record content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<String>,
    /// Identifiers are unique across the whole project, not just within one
    /// expedition.
    pub unique_across_project: bool,
    /// Identity is a content hash instead of a user-supplied column.
    pub hashed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worksheet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_entity: Option<String>,
    pub record_type: RecordType,
    #[serde(rename = "type")]
    pub variant: EntityVariant,
}

impl Entity {
    pub fn new(concept_alias: impl Into<String>) -> Self {
        Entity {
            concept_alias: concept_alias.into(),
            ..Default::default()
        }
    }

    /// A child entity of `parent_entity`. Child entities inherit their
    /// parent's identifier column during [`Entity::configure`].
    pub fn child(concept_alias: impl Into<String>, parent_entity: impl Into<String>) -> Self {
        Entity {
            concept_alias: concept_alias.into(),
            parent_entity: Some(parent_entity.into()),
            variant: EntityVariant::Child,
            ..Default::default()
        }
    }

    pub fn is_child_entity(&self) -> bool {
        self.variant == EntityVariant::Child
    }

    pub fn has_worksheet(&self) -> bool {
        self.worksheet.is_some()
    }

    /// Child entity records cannot be reloaded in isolation: a reload
    /// replaces an expedition's records wholesale, and child identifiers
    /// are only meaningful under their parent.
    pub fn can_reload(&self) -> bool {
        !self.is_child_entity()
    }

    /// The composite identifier of a child record: the parent's identifier
    /// joined with the child's local one.
    pub fn build_child_identifier(parent_identifier: &str, local_identifier: &str) -> String {
        format!("{parent_identifier}_{local_identifier}")
    }

    pub fn unique_key(&self) -> Option<&str> {
        self.unique_key.as_deref()
    }

    /// The uri of the unique key column, when both exist.
    pub fn unique_key_uri(&self) -> Option<&str> {
        self.unique_key().and_then(|k| self.attribute_uri(k))
    }

    pub fn attribute(&self, column: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.column == column)
    }

    pub fn attribute_by_uri(&self, uri: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.uri == uri)
    }

    /// Like [`attribute`](Self::attribute), but a miss is a hard error for
    /// callers that cannot proceed without the attribute.
    pub fn require_attribute(&self, column: &str) -> Result<&Attribute> {
        self.attribute(column)
            .ok_or_else(|| VoucherError::MissingAttribute {
                entity: self.concept_alias.clone(),
                column_or_uri: column.to_string(),
            })
    }

    pub fn require_attribute_by_uri(&self, uri: &str) -> Result<&Attribute> {
        self.attribute_by_uri(uri)
            .ok_or_else(|| VoucherError::MissingAttribute {
                entity: self.concept_alias.clone(),
                column_or_uri: uri.to_string(),
            })
    }

    pub fn attribute_uri(&self, column: &str) -> Option<&str> {
        self.attribute(column).map(|a| a.uri.as_str())
    }

    pub fn attribute_column(&self, uri: &str) -> Option<&str> {
        self.attribute_by_uri(uri).map(|a| a.column.as_str())
    }

    pub fn columns(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.column.clone()).collect()
    }

    /// Add a rule, folding it into an equivalent existing rule when possible
    /// so defaults never duplicate declared rules.
    pub fn add_rule(&mut self, rule: Rule) {
        for existing in &mut self.rules {
            if existing.merge(&rule) {
                return;
            }
        }
        self.rules.push(rule);
    }

    /// Rules every entity gets in addition to its declared ones.
    ///
    /// Network configs only carry the data type check; identifier rules are
    /// added when the config is resolved for a project, where `parent` is
    /// this entity's parent entity if it has one.
    pub fn add_default_rules(&mut self, network: bool, parent: Option<&Entity>) {
        self.add_rule(Rule::ValidDataTypeFormat(Default::default()));

        if network {
            return;
        }

        let parent_key = parent.and_then(|p| p.unique_key()).map(str::to_string);

        let mut required: IndexSet<String> = IndexSet::new();
        if let Some(key) = parent_key.clone() {
            required.insert(key);
        }
        if let Some(key) = self.unique_key.clone() {
            required.insert(key);
        }
        if !required.is_empty() {
            self.add_rule(Rule::RequiredValue(RequiredValueRule::new(
                required.clone(),
                RuleLevel::Error,
            )));
        }

        if let Some(key) = self.unique_key.clone() {
            self.add_rule(Rule::ValidForUri(ValidForUriRule::new(
                key.clone(),
                RuleLevel::Error,
            )));

            if self.is_child_entity() {
                self.add_rule(Rule::CompositeUniqueValue(CompositeUniqueValueRule::new(
                    required,
                    RuleLevel::Error,
                )));
            } else {
                self.add_rule(Rule::UniqueValue(UniqueValueRule::new(
                    key,
                    self.unique_across_project,
                    RuleLevel::Error,
                )));
            }
        }

        if self.is_child_entity() {
            self.add_rule(Rule::ValidParentIdentifiers(Default::default()));
        }
    }

    /// Post-load wiring. A child entity that does not declare its parent's
    /// identifier column inherits that attribute so parent references can be
    /// stored on its records.
    pub fn configure(&mut self, parent: Option<&Entity>) {
        if !self.is_child_entity() {
            return;
        }
        let Some(parent) = parent else {
            return;
        };
        let Some(attribute) = parent.unique_key().and_then(|k| parent.attribute(k)) else {
            return;
        };

        if self.attribute_by_uri(&attribute.uri).is_none() {
            self.attributes.push(attribute.clone());
        }
    }

    /// Structural problems that make this entity unusable, independent of
    /// any config it is embedded in.
    pub fn validation_error_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();

        if self.is_child_entity()
            && self
                .parent_entity
                .as_deref()
                .map_or(true, |p| p.trim().is_empty())
        {
            messages.push(format!(
                "Entity \"{}\" is missing a valid parentEntity",
                self.concept_alias
            ));
        }

        messages
    }

    pub fn is_valid(&self) -> bool {
        self.validation_error_messages().is_empty()
    }

    /// Fill in uris for attributes that lack one, derived from the concept
    /// alias and a normalized column name. Collisions with existing uris get
    /// a numeric suffix.
    pub fn generate_uris(&mut self) {
        let mut existing: HashSet<String> = self
            .attributes
            .iter()
            .filter(|a| !a.uri.is_empty())
            .map(|a| a.uri.clone())
            .collect();

        for i in 0..self.attributes.len() {
            if !self.attributes[i].uri.is_empty() {
                continue;
            }

            let base = format!(
                "{}_{}",
                self.concept_alias,
                normalize_column(&self.attributes[i].column)
            );
            let mut uri = base.clone();
            let mut suffix = 1;
            while existing.contains(&uri) {
                uri = format!("{base}{suffix}");
                suffix += 1;
            }

            existing.insert(uri.clone());
            self.attributes[i].uri = uri;
        }
    }
}

/// Reduce a display column name to uri-safe characters: spaces become
/// underscores, everything outside `[a-zA-Z0-9_]` is dropped, and the result
/// is lowercased.
fn normalize_column(column: &str) -> String {
    column
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}
