//! The rule engine.
//!
//! Rules are declarative validation checks attached to entities in a config
//! document. Each rule is serialized as an object whose `name` property picks
//! the implementation, so configs round-trip through serde without any
//! reflection machinery.
//!
//! A rule run never aborts the pass: failures accumulate into
//! [`EntityMessages`] and, for ERROR-level rules that can pinpoint the
//! offending row, mark the record so it is excluded from persistence.

mod format;
mod required;
mod unique;

pub use format::{
    ControlledVocabularyRule, MinMaxNumberRule, NumericRangeRule, RegExpRule,
    ValidDataTypeFormatRule, ValidForUriRule, ValidUrlRule,
};
pub use required::{
    IfOtherColumnRequireValueRule, RequireValueIfOtherColumnRule, RequiredValueInGroupRule,
    RequiredValueRule, ValidParentIdentifiersRule,
};
pub use unique::{CompositeUniqueValueRule, UniqueValueRule};

use serde::{Deserialize, Serialize};

use crate::records::{Record, RecordSet};
use crate::schema::{Config, Entity};
use crate::validation::EntityMessages;

/// Message group used when a rule's own configuration is broken.
pub(crate) const CONFIG_GROUP: &str = "Invalid Rule Configuration. Contact Project Administrator.";

/// Severity of a rule failure.
///
/// ERROR failures block persistence of the dataset; WARNING failures are
/// reported but do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleLevel {
    Error,
    #[default]
    Warning,
}

impl std::fmt::Display for RuleLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleLevel::Error => f.write_str("ERROR"),
            RuleLevel::Warning => f.write_str("WARNING"),
        }
    }
}

/// Everything a rule sees while running against one RecordSet.
///
/// `records` is the mutable record list of the set under validation (rules
/// mark failing records via [`Record::set_error`]); `parent` is the already
/// validated parent set for child entities.
pub struct RuleContext<'a> {
    pub entity: &'a Entity,
    pub records: &'a mut Vec<Record>,
    pub parent: Option<&'a RecordSet>,
    pub config: &'a Config,
    pub expedition_code: Option<String>,
}

/// A single validation rule, dispatched on the serialized `name` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Rule {
    RequiredValue(RequiredValueRule),
    RequiredValueInGroup(RequiredValueInGroupRule),
    RequireValueIfOtherColumn(RequireValueIfOtherColumnRule),
    IfOtherColumnRequireValue(IfOtherColumnRequireValueRule),
    UniqueValue(UniqueValueRule),
    CompositeUniqueValue(CompositeUniqueValueRule),
    ValidParentIdentifiers(ValidParentIdentifiersRule),
    ValidDataTypeFormat(ValidDataTypeFormatRule),
    #[serde(rename = "ValidForURI")]
    ValidForUri(ValidForUriRule),
    ControlledVocabulary(ControlledVocabularyRule),
    NumericRange(NumericRangeRule),
    MinMaxNumber(MinMaxNumberRule),
    RegExp(RegExpRule),
    #[serde(rename = "ValidURL")]
    ValidUrl(ValidUrlRule),
}

macro_rules! each_rule {
    ($self:expr, $r:pat => $body:expr) => {
        match $self {
            Rule::RequiredValue($r) => $body,
            Rule::RequiredValueInGroup($r) => $body,
            Rule::RequireValueIfOtherColumn($r) => $body,
            Rule::IfOtherColumnRequireValue($r) => $body,
            Rule::UniqueValue($r) => $body,
            Rule::CompositeUniqueValue($r) => $body,
            Rule::ValidParentIdentifiers($r) => $body,
            Rule::ValidDataTypeFormat($r) => $body,
            Rule::ValidForUri($r) => $body,
            Rule::ControlledVocabulary($r) => $body,
            Rule::NumericRange($r) => $body,
            Rule::MinMaxNumber($r) => $body,
            Rule::RegExp($r) => $body,
            Rule::ValidUrl($r) => $body,
        }
    };
}

impl Rule {
    /// The serialized discriminant, as it appears in config documents.
    pub fn name(&self) -> &'static str {
        match self {
            Rule::RequiredValue(_) => "RequiredValue",
            Rule::RequiredValueInGroup(_) => "RequiredValueInGroup",
            Rule::RequireValueIfOtherColumn(_) => "RequireValueIfOtherColumn",
            Rule::IfOtherColumnRequireValue(_) => "IfOtherColumnRequireValue",
            Rule::UniqueValue(_) => "UniqueValue",
            Rule::CompositeUniqueValue(_) => "CompositeUniqueValue",
            Rule::ValidParentIdentifiers(_) => "ValidParentIdentifiers",
            Rule::ValidDataTypeFormat(_) => "ValidDataTypeFormat",
            Rule::ValidForUri(_) => "ValidForURI",
            Rule::ControlledVocabulary(_) => "ControlledVocabulary",
            Rule::NumericRange(_) => "NumericRange",
            Rule::MinMaxNumber(_) => "MinMaxNumber",
            Rule::RegExp(_) => "RegExp",
            Rule::ValidUrl(_) => "ValidURL",
        }
    }

    pub fn level(&self) -> RuleLevel {
        each_rule!(self, r => r.level)
    }

    /// True when the rule was inherited from the network config. Network
    /// rules may not be removed or weakened at project level.
    pub fn is_network_rule(&self) -> bool {
        each_rule!(self, r => r.network_rule)
    }

    pub fn set_network_rule(&mut self, network_rule: bool) {
        each_rule!(self, r => r.network_rule = network_rule)
    }

    /// Run the rule against a RecordSet. Returns false when the rule found
    /// problems (of any level) or when its own configuration is invalid.
    pub fn run(&self, ctx: &mut RuleContext<'_>, messages: &mut EntityMessages) -> bool {
        let mut config_messages = Vec::new();
        if !self.valid_configuration(&mut config_messages, ctx.entity, ctx.config) {
            for m in config_messages {
                messages.add_error_message(CONFIG_GROUP, m);
            }
            return false;
        }

        each_rule!(self, r => r.run(ctx, messages))
    }

    /// Structural self-check, called during config validation.
    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        config: &Config,
    ) -> bool {
        each_rule!(self, r => r.valid_configuration(messages, entity, config))
    }

    /// A rule failed with ERROR severity iff it failed at all and its level
    /// is ERROR.
    pub fn is_error(&self, run_passed: bool) -> bool {
        !run_passed && self.level() == RuleLevel::Error
    }

    /// Attempt to fold `other` into this rule. RequiredValue rules of equal
    /// level union their column sets; otherwise merging succeeds only for
    /// rules that are equal apart from the network flag.
    pub fn merge(&mut self, other: &Rule) -> bool {
        match (&mut *self, other) {
            (Rule::RequiredValue(a), Rule::RequiredValue(b)) => {
                if a.level != b.level {
                    return false;
                }
                a.columns.extend(b.columns.iter().cloned());
                a.network_rule = a.network_rule && b.network_rule;
                true
            }
            (Rule::ValidDataTypeFormat(a), Rule::ValidDataTypeFormat(b)) => {
                a.network_rule = a.network_rule || b.network_rule;
                true
            }
            (Rule::ValidParentIdentifiers(a), Rule::ValidParentIdentifiers(b)) => {
                a.network_rule = a.network_rule || b.network_rule;
                true
            }
            _ => {
                if self.normalized() == other.normalized() {
                    let network = self.is_network_rule() || other.is_network_rule();
                    self.set_network_rule(network);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Is `other` subsumed by this rule? Used after merging to verify that a
    /// network rule still exists in a project config.
    pub fn contains(&self, other: &Rule) -> bool {
        match (self, other) {
            (Rule::RequiredValue(a), Rule::RequiredValue(b)) => {
                a.level == b.level && b.columns.iter().all(|c| a.columns.contains(c))
            }
            (Rule::ValidDataTypeFormat(_), Rule::ValidDataTypeFormat(_)) => true,
            (Rule::ValidParentIdentifiers(_), Rule::ValidParentIdentifiers(_)) => true,
            _ => self.normalized() == other.normalized(),
        }
    }

    /// Restrict this rule to a project's attribute columns. Returns `None`
    /// when the rule no longer applies to any of the given columns.
    pub fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        let has = |c: &str| columns.iter().any(|col| col == c);

        match self {
            Rule::ValidDataTypeFormat(_) | Rule::ValidParentIdentifiers(_) => Some(self.clone()),
            Rule::RequiredValue(r) => {
                if r.level == RuleLevel::Error {
                    return Some(self.clone());
                }
                let kept: indexmap::IndexSet<String> =
                    r.columns.iter().filter(|c| has(c)).cloned().collect();
                if kept.is_empty() {
                    None
                } else {
                    let mut rule = r.clone();
                    rule.columns = kept;
                    Some(Rule::RequiredValue(rule))
                }
            }
            Rule::RequiredValueInGroup(r) => {
                r.columns.iter().all(|c| has(c)).then(|| self.clone())
            }
            Rule::CompositeUniqueValue(r) => {
                r.columns.iter().all(|c| has(c)).then(|| self.clone())
            }
            Rule::RequireValueIfOtherColumn(r) => {
                let applicable = if r.level == RuleLevel::Error {
                    has(&r.column) || has(&r.other_column)
                } else {
                    has(&r.column) && has(&r.other_column)
                };
                applicable.then(|| self.clone())
            }
            Rule::IfOtherColumnRequireValue(r) => {
                (has(&r.column) && has(&r.other_column)).then(|| self.clone())
            }
            Rule::MinMaxNumber(r) => {
                (has(&r.minimum_column) && has(&r.maximum_column)).then(|| self.clone())
            }
            Rule::UniqueValue(r) => has(&r.column).then(|| self.clone()),
            Rule::ValidForUri(r) => has(&r.column).then(|| self.clone()),
            Rule::ControlledVocabulary(r) => has(&r.column).then(|| self.clone()),
            Rule::NumericRange(r) => has(&r.column).then(|| self.clone()),
            Rule::RegExp(r) => has(&r.column).then(|| self.clone()),
            Rule::ValidUrl(r) => has(&r.column).then(|| self.clone()),
        }
    }

    /// Copy with the network flag cleared, for flag-insensitive comparison.
    fn normalized(&self) -> Rule {
        let mut r = self.clone();
        r.set_network_rule(false);
        r
    }
}

/// Shared configuration check: the rule references a column that must exist
/// on the entity.
pub(crate) fn entity_has_attribute(
    messages: &mut Vec<String>,
    entity: &Entity,
    column: &str,
    rule_name: &str,
) -> bool {
    if entity.attribute_uri(column).is_none() {
        messages.push(format!(
            "Invalid {} Rule configuration. Could not find Attribute for column: {} in entity: {}",
            rule_name,
            column,
            entity.concept_alias
        ));
        return false;
    }
    true
}

/// Shared configuration check: a required column name must be non-blank.
pub(crate) fn require_column(messages: &mut Vec<String>, column: &str, rule_name: &str) -> bool {
    if column.trim().is_empty() {
        messages.push(format!(
            "Invalid {rule_name} Rule configuration. Column must not be blank."
        ));
        return false;
    }
    true
}

/// Records still eligible for persistence (not failed by an earlier
/// ERROR-level rule).
pub(crate) fn persistable(records: &mut [Record]) -> impl Iterator<Item = &mut Record> {
    records.iter_mut().filter(|r| r.persist())
}
