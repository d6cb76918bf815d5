//! Uniqueness rules over single columns and column groups.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::schema::{Config, Entity};
use crate::validation::EntityMessages;

use super::{entity_has_attribute, require_column, RuleContext, RuleLevel};

const GROUP: &str = "Unique value constraint did not pass";

/// Check a column for duplicate values.
///
/// Empty values are not counted, so this rule alone does not enforce a
/// primary key; it must be combined with a RequiredValue rule on the same
/// column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UniqueValueRule {
    pub column: String,
    pub unique_across_project: bool,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl UniqueValueRule {
    pub fn new(column: impl Into<String>, unique_across_project: bool, level: RuleLevel) -> Self {
        UniqueValueRule {
            column: column.into(),
            unique_across_project,
            level,
            network_rule: false,
        }
    }

    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let Some(uri) = ctx.entity.attribute_uri(&self.column) else {
            return false;
        };

        if !ctx.records.iter().any(|r| r.persist()) {
            return true;
        }

        // uniqueness within the project considers every record; otherwise
        // only records from the expedition being loaded can collide
        let expedition_code = ctx.expedition_code.as_deref();
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();

        for r in ctx.records.iter() {
            if !self.unique_across_project && r.expedition_code() != expedition_code {
                continue;
            }

            let value = r.get(uri);

            if !value.is_empty() && !seen.insert(value.to_string()) {
                duplicates.push(value.to_string());
            }
        }

        if duplicates.is_empty() {
            return true;
        }

        let scope = if self.unique_across_project {
            "across the entire project "
        } else {
            ""
        };
        messages.add_message(
            GROUP,
            format!(
                "\"{}\" column is defined as unique {}but some values used more than once: \"{}\"",
                self.column,
                scope,
                duplicates.join("\", \"")
            ),
            self.level,
        );
        false
    }

    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        _config: &Config,
    ) -> bool {
        require_column(messages, &self.column, "UniqueValue")
            && entity_has_attribute(messages, entity, &self.column, "UniqueValue")
    }
}

/// Check a group of columns for duplicate value combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositeUniqueValueRule {
    pub columns: IndexSet<String>,
    pub level: RuleLevel,
    pub network_rule: bool,
}

impl CompositeUniqueValueRule {
    pub fn new(columns: IndexSet<String>, level: RuleLevel) -> Self {
        CompositeUniqueValueRule {
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

        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();

        for r in ctx.records.iter() {
            let composite: Vec<String> = uris.iter().map(|uri| r.get(uri).to_string()).collect();

            if !seen.insert(composite.clone()) {
                duplicates.push(composite);
            }
        }

        if duplicates.is_empty() {
            return true;
        }

        let combinations = duplicates
            .iter()
            .map(|values| values.join("\", \""))
            .collect::<Vec<_>>()
            .join("\"), (\"");
        let columns = self.columns.iter().cloned().collect::<Vec<_>>().join("\", \"");
        messages.add_message(
            GROUP,
            format!(
                "(\"{columns}\") is defined as a composite unique key, but some value combinations were used more than once: (\"{combinations}\")"
            ),
            self.level,
        );
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
                "Invalid CompositeUniqueValue Rule configuration. Columns must not be empty."
                    .to_string(),
            );
            return false;
        }

        self.columns
            .iter()
            .all(|c| entity_has_attribute(messages, entity, c, "CompositeUniqueValue"))
    }
}
