//! Presence rules: required values, dependent columns, and parent identifier
//! checks.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::schema::{Config, Entity};
use crate::validation::EntityMessages;

use super::{entity_has_attribute, persistable, require_column, RuleContext, RuleLevel};

/// For each column in `columns`, check that no record is missing a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RequiredValueRule {
    pub columns: IndexSet<String>,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl RequiredValueRule {
    const GROUP: &'static str = "Missing column(s)";

    pub fn new(columns: IndexSet<String>, level: RuleLevel) -> Self {
        RequiredValueRule {
            columns,
            level,
            network_rule: false,
        }
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        // once a column is known to be missing a value, stop checking it
        let mut remaining: Vec<(String, String)> = self
            .columns
            .iter()
            .filter_map(|c| ctx.entity.attribute_uri(c).map(|u| (u.to_string(), c.clone())))
            .collect();
        let mut missing = Vec::new();
        let mark_errors = self.level == RuleLevel::Error;

        for r in persistable(ctx.records) {
            remaining.retain(|(uri, column)| {
                if r.get(uri).is_empty() {
                    if mark_errors {
                        r.set_error();
                    }
                    missing.push(column.clone());
                    false
                } else {
                    true
                }
            });

            if remaining.is_empty() {
                break;
            }
        }

        if missing.is_empty() {
            return true;
        }

        for column in missing {
            messages.add_message(
                Self::GROUP,
                format!("\"{column}\" has a missing cell value"),
                self.level,
            );
        }
        false
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        if self.columns.is_empty() {
            messages.push(
                "Invalid RequiredValue Rule configuration. Columns must not be empty.".to_string(),
            );
            return false;
        }

        self.columns
            .iter()
            .all(|c| entity_has_attribute(messages, entity, c, "RequiredValue"))
    }
}

/// At least one column in `columns` must have a value on every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RequiredValueInGroupRule {
    pub columns: IndexSet<String>,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl RequiredValueInGroupRule {
    const GROUP: &'static str = "Missing column from group";

    pub fn new(columns: IndexSet<String>, level: RuleLevel) -> Self {
        RequiredValueInGroupRule {
            columns,
            level,
            network_rule: false,
        }
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let uris: Vec<String> = self
            .columns
            .iter()
            .filter_map(|c| ctx.entity.attribute_uri(c).map(str::to_string))
            .collect();
        let unique_key = ctx.entity.unique_key().unwrap_or_default().to_string();
        let unique_key_uri = ctx.entity.unique_key_uri().unwrap_or_default().to_string();

        let mut failing_keys = Vec::new();

        for r in ctx.records.iter() {
            if uris.iter().all(|uri| r.get(uri).is_empty()) {
                failing_keys.push(r.get(&unique_key_uri).to_string());
            }
        }

        if failing_keys.is_empty() {
            return true;
        }

        let column_list = self
            .columns
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join("\",\"");
        for key in failing_keys {
            messages.add_message(
                Self::GROUP,
                format!(
                    "row with {unique_key}={key} must have a value in at least 1 of the columns: [\"{column_list}\"]"
                ),
                self.level,
            );
        }
        false
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        if self.columns.is_empty() {
            messages.push(
                "Invalid RequiredValueInGroup Rule configuration. Columns must not be empty."
                    .to_string(),
            );
            return false;
        }

        self.columns
            .iter()
            .all(|c| entity_has_attribute(messages, entity, c, "RequiredValueInGroup"))
    }
}

/// If `otherColumn` has data, `column` must also have data. Checked against
/// records still eligible for persistence; failing records are marked at
/// ERROR level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RequireValueIfOtherColumnRule {
    pub column: String,
    pub other_column: String,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl RequireValueIfOtherColumnRule {
    const GROUP: &'static str = "Dependent column value check";

    pub fn new(
        column: impl Into<String>,
        other_column: impl Into<String>,
        level: RuleLevel,
    ) -> Self {
        RequireValueIfOtherColumnRule {
            column: column.into(),
            other_column: other_column.into(),
            level,
            network_rule: false,
        }
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let Some(uri) = ctx.entity.attribute_uri(&self.column).map(str::to_string) else {
            return false;
        };
        let Some(other_uri) = ctx.entity.attribute_uri(&self.other_column).map(str::to_string)
        else {
            return false;
        };

        let mut valid = true;
        let mark_errors = self.level == RuleLevel::Error;

        for r in persistable(ctx.records) {
            let other_value = r.get(&other_uri).to_string();

            if !other_value.is_empty() && r.get(&uri).is_empty() {
                valid = false;
                if mark_errors {
                    r.set_error();
                }
                messages.add_message(
                    Self::GROUP,
                    format!(
                        "\"{}\" has value \"{}\", but associated column \"{}\" has no value",
                        self.other_column, other_value, self.column
                    ),
                    self.level,
                );
            }
        }

        valid
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        let name = "RequireValueIfOtherColumn";
        let mut valid = require_column(messages, &self.column, name)
            && entity_has_attribute(messages, entity, &self.column, name);

        if self.other_column.trim().is_empty() {
            messages.push(format!(
                "Invalid {name} Rule configuration. otherColumn must not be blank."
            ));
            return false;
        }

        valid &= entity_has_attribute(messages, entity, &self.other_column, name);
        valid
    }
}

/// Older variant of [`RequireValueIfOtherColumnRule`] kept for existing
/// configs: checks every record and never marks record errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IfOtherColumnRequireValueRule {
    pub column: String,
    pub other_column: String,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl IfOtherColumnRequireValueRule {
    const GROUP: &'static str = "Dependent column value check";

    pub fn new(
        column: impl Into<String>,
        other_column: impl Into<String>,
        level: RuleLevel,
    ) -> Self {
        IfOtherColumnRequireValueRule {
            column: column.into(),
            other_column: other_column.into(),
            level,
            network_rule: false,
        }
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let Some(uri) = ctx.entity.attribute_uri(&self.column) else {
            return false;
        };
        let Some(other_uri) = ctx.entity.attribute_uri(&self.other_column) else {
            return false;
        };

        let mut valid = true;

        for r in ctx.records.iter() {
            let other_value = r.get(other_uri);

            if !other_value.is_empty() && r.get(uri).is_empty() {
                valid = false;
                messages.add_message(
                    Self::GROUP,
                    format!(
                        "\"{}\" has value \"{}\", but associated column \"{}\" has no value",
                        self.other_column, other_value, self.column
                    ),
                    self.level,
                );
            }
        }

        valid
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        let name = "IfOtherColumnRequireValue";
        let mut valid = require_column(messages, &self.column, name)
            && entity_has_attribute(messages, entity, &self.column, name);

        if self.other_column.trim().is_empty() {
            messages.push(format!(
                "Invalid {name} Rule configuration. otherColumn must not be blank."
            ));
            return false;
        }

        valid &= entity_has_attribute(messages, entity, &self.other_column, name);
        valid
    }
}

/// Every value in the parent identifier column of a child RecordSet must
/// exist in the parent RecordSet (within the same expedition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidParentIdentifiersRule {
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl Default for ValidParentIdentifiersRule {
    fn default() -> Self {
        ValidParentIdentifiersRule {
            level: RuleLevel::Error,
            network_rule: false,
        }
    }
}

impl ValidParentIdentifiersRule {
    const GROUP: &'static str = "Invalid parent identifier(s)";

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        if !ctx.entity.is_child_entity() {
            return true;
        }
        // the dataset validator refuses to validate a child set without its
        // parent, so a missing parent here means there is nothing to check
        let Some(parent) = ctx.parent else {
            return true;
        };

        let parent_entity = parent.entity();
        let Some(parent_key) = parent_entity.unique_key() else {
            return true;
        };
        let Some(parent_key_uri) = parent_entity.unique_key_uri() else {
            return true;
        };
        let Some(uri) = ctx.entity.attribute_uri(parent_key) else {
            return true;
        };

        let expedition_code = ctx.expedition_code.as_deref();
        let parent_identifiers: HashSet<&str> = parent
            .records()
            .iter()
            .filter(|r| r.expedition_code() == expedition_code)
            .map(|r| r.get(parent_key_uri))
            .collect();

        let mut invalid = Vec::new();

        for r in ctx.records.iter().filter(|r| r.persist()) {
            let value = r.get(uri);

            if value.is_empty() || !parent_identifiers.contains(value) {
                invalid.push(value.to_string());
            }
        }

        if invalid.is_empty() {
            return true;
        }

        let parent_alias = ctx
            .entity
            .parent_entity
            .clone()
            .unwrap_or_else(|| parent_entity.concept_alias.clone());
        messages.add_message(
            Self::GROUP,
            format!(
                "The following identifiers do not exist in the parent entity \"{}\": [\"{}\"]",
                parent_alias,
                invalid.join("\", \"")
            ),
            self.level,
        );
        false
    }

    pub fn valid_configuration(
        &self,
        _messages: &mut Vec<String>,
        _entity: &Entity,
        _config: &Config,
    ) -> bool {
        true
    }
}
