//! Structural validation of config documents.
//!
//! All findings accumulate into a message list; a config with any message is
//! rejected as a whole, there are no warning-level config problems.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::validation::rules::{Rule, RuleLevel};

use super::{Config, DataType, Entity};

static CONCEPT_ALIAS_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());
static URI_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_:/]+$").unwrap());

/// Validates a [`Config`]. Standalone validation covers the structural
/// checks every config must pass; supplying a network config additionally
/// verifies that the config is a faithful restriction of that network.
pub struct ConfigValidator<'a> {
    network: Option<&'a Config>,
}

impl<'a> ConfigValidator<'a> {
    pub fn new() -> Self {
        ConfigValidator { network: None }
    }

    /// Validate a project config against the network config it restricts.
    pub fn for_project(network: &'a Config) -> Self {
        ConfigValidator {
            network: Some(network),
        }
    }

    pub fn is_valid(&self, config: &mut Config) -> bool {
        self.validate(config).is_empty()
    }

    /// Run every check and return the accumulated error messages. Entities
    /// are configured first so inherited attributes exist before checking.
    pub fn validate(&self, config: &mut Config) -> Vec<String> {
        config.configure_entities();

        let mut errors = Vec::new();

        self.unique_concept_aliases(config, &mut errors);
        self.unique_and_valid_uris(config, &mut errors);
        self.unique_columns(config, &mut errors);
        self.most_atomic_worksheet_entity_not_hashed(config, &mut errors);
        self.worksheet_attributes_are_unique(config, &mut errors);
        self.expedition_metadata_have_names(config, &mut errors);

        if let Some(network) = self.network {
            self.valid_validation_lists(config, network, &mut errors);
            self.contains_network_expedition_props(config, network, &mut errors);
        }

        for e in &config.entities {
            self.worksheet_entity_has_unique_key(e, &mut errors);
            self.unique_key_has_matching_attribute(e, &mut errors);
            self.hashed_entity_has_required_value(e, &mut errors);
            self.rules_have_valid_configuration(config, e, &mut errors);
            self.concept_alias_has_valid_chars(e, &mut errors);
            self.entity_has_concept_uri(e, &mut errors);
            self.child_entity_has_valid_parent(config, e, &mut errors);
            self.datetime_attributes_have_data_format(e, &mut errors);
            errors.extend(e.validation_error_messages());

            if let Some(network) = self.network {
                self.entity_restricts_network_entity(config, network, e, &mut errors);
            }
        }

        errors
    }

    fn unique_concept_aliases(&self, config: &Config, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();

        for e in &config.entities {
            if e.concept_alias.trim().is_empty() {
                errors.push("Entity is missing a conceptAlias".to_string());
            } else if !seen.insert(e.concept_alias.to_lowercase()) {
                errors.push(format!(
                    "Duplicate entity conceptAlias detected \"{}\". conceptAliases are not case sensitive.",
                    e.concept_alias
                ));
            }
        }
    }

    fn unique_and_valid_uris(&self, config: &Config, errors: &mut Vec<String>) {
        for e in &config.entities {
            let mut uris = HashSet::new();
            for a in &e.attributes {
                if !URI_CHARS.is_match(&a.uri) {
                    errors.push(format!(
                        "Invalid Attribute uri \"{}\" found in entity \"{}\". Uri must only contain alpha-numeric or _:/ characters.",
                        a.uri, e.concept_alias
                    ));
                }
                if !uris.insert(a.uri.as_str()) {
                    errors.push(format!(
                        "Duplicate Attribute uri \"{}\" found in entity \"{}\"",
                        a.uri, e.concept_alias
                    ));
                }
            }
        }
    }

    fn unique_columns(&self, config: &Config, errors: &mut Vec<String>) {
        for e in &config.entities {
            let mut columns = HashSet::new();
            for a in &e.attributes {
                if !columns.insert(a.column.as_str()) {
                    errors.push(format!(
                        "Duplicate Attribute column \"{}\" found in entity \"{}\"",
                        a.column, e.concept_alias
                    ));
                }
            }
        }
    }

    /// On every worksheet, the most atomic (deepest child) entity supplies
    /// the row identity and therefore cannot derive its identity by hashing.
    fn most_atomic_worksheet_entity_not_hashed(&self, config: &Config, errors: &mut Vec<String>) {
        let mut sheet_entities: IndexMap<&str, Vec<&Entity>> = IndexMap::new();
        for e in &config.entities {
            if let Some(sheet) = e.worksheet.as_deref() {
                sheet_entities.entry(sheet).or_default().push(e);
            }
        }

        for (sheet, entities) in sheet_entities {
            let mut most_atomic: Option<&Entity> = None;

            for e in entities {
                match most_atomic {
                    None => most_atomic = Some(e),
                    Some(current) => {
                        if config.is_entity_child_descendant(current, e) {
                            most_atomic = Some(e);
                        }
                    }
                }
            }

            if let Some(e) = most_atomic {
                if e.hashed {
                    errors.push(format!(
                        "Entity \"{}\" is the most atomic (child) entity in the worksheet: \"{sheet}\". This entity can not be a hashed entity.",
                        e.concept_alias
                    ));
                }
            }
        }
    }

    fn worksheet_attributes_are_unique(&self, config: &Config, errors: &mut Vec<String>) {
        for sheet in config.worksheets() {
            let mut entities = config.entities_for_sheet(sheet);

            // duplicates within a single entity are reported elsewhere
            if entities.len() == 1 {
                continue;
            }

            // parents first, so the child's inherited key column is the
            // duplicate occurrence
            entities.sort_by_key(|e| config.ancestry_depth(e));

            let mut columns = HashSet::new();
            let mut uris = HashSet::new();

            for e in &entities {
                let parent = config.parent_entity(e);

                for a in &e.attributes {
                    let mut dup_column = !columns.insert(a.column.clone());
                    let mut dup_uri = !uris.insert(a.uri.clone());

                    // a child sharing its parent's uniqueKey column is the
                    // one permitted duplication
                    if (dup_column || dup_uri) && e.is_child_entity() {
                        if let Some(parent) = parent {
                            dup_column =
                                dup_column && parent.unique_key() != Some(a.column.as_str());
                            dup_uri = dup_uri && parent.unique_key_uri() != Some(a.uri.as_str());
                        }
                    }

                    if dup_column {
                        errors.push(format!(
                            "Worksheet \"{sheet}\" contains a duplicate column \"{}\"",
                            a.column
                        ));
                    }
                    if dup_uri {
                        errors.push(format!(
                            "Worksheet \"{sheet}\" contains a duplicate attribute uri \"{}\"",
                            a.uri
                        ));
                    }
                }
            }
        }
    }

    fn expedition_metadata_have_names(&self, config: &Config, errors: &mut Vec<String>) {
        for p in &config.expedition_metadata_properties {
            if p.name.trim().is_empty() {
                errors.push("ExpeditionMetadataProperty is missing a name.".to_string());
            }
        }
    }

    fn worksheet_entity_has_unique_key(&self, e: &Entity, errors: &mut Vec<String>) {
        if e.has_worksheet() && e.unique_key().map_or(true, |k| k.trim().is_empty()) {
            errors.push(format!(
                "Entity \"{}\" specifies a worksheet but is missing a uniqueKey",
                e.concept_alias
            ));
        }
    }

    fn unique_key_has_matching_attribute(&self, e: &Entity, errors: &mut Vec<String>) {
        if let Some(key) = e.unique_key() {
            if !key.trim().is_empty() && e.attribute(key).is_none() {
                errors.push(format!(
                    "Entity \"{}\" specifies a uniqueKey but can not find an Attribute with a matching column",
                    e.concept_alias
                ));
            }
        }
    }

    /// Hashed identity is derived from record content, so a hashed entity
    /// must require some value beyond its own (generated) uniqueKey,
    /// otherwise empty rows would all hash identically.
    fn hashed_entity_has_required_value(&self, e: &Entity, errors: &mut Vec<String>) {
        if !e.hashed {
            return;
        }

        for rule in &e.rules {
            if rule.level() != RuleLevel::Error {
                continue;
            }

            match rule {
                Rule::RequiredValue(r) => {
                    if r.columns.len() > 1
                        || e.unique_key().map_or(true, |k| !r.columns.contains(k))
                    {
                        return;
                    }
                }
                Rule::RequiredValueInGroup(r) => {
                    if e.unique_key().map_or(true, |k| !r.columns.contains(k)) {
                        return;
                    }
                }
                _ => {}
            }
        }

        errors.push(format!(
            "Entity \"{}\" is a hashed entity, but is missing at least 1 RequiredValueRule with level = \"ERROR\" and a column that is not the uniqueKey \"{}\"",
            e.concept_alias,
            e.unique_key().unwrap_or_default()
        ));
    }

    fn rules_have_valid_configuration(
        &self,
        config: &Config,
        e: &Entity,
        errors: &mut Vec<String>,
    ) {
        for rule in &e.rules {
            rule.valid_configuration(errors, e, config);

            if let Rule::UniqueValue(r) = rule {
                if r.unique_across_project
                    && Some(r.column.as_str()) == e.unique_key()
                    && !e.unique_across_project
                {
                    errors.push(format!(
                        "UniqueValueRule for uniqueKey column: \"{}\" has uniqueAcrossProject = true, however entity: \"{}\" uniqueAcrossProject = false",
                        r.column, e.concept_alias
                    ));
                }
            }
        }
    }

    fn concept_alias_has_valid_chars(&self, e: &Entity, errors: &mut Vec<String>) {
        if !e.concept_alias.trim().is_empty() && !CONCEPT_ALIAS_CHARS.is_match(&e.concept_alias) {
            errors.push(
                "Entity conceptAlias contains one or more invalid characters. Only letters, digits, and _ are valid"
                    .to_string(),
            );
        }
    }

    fn entity_has_concept_uri(&self, e: &Entity, errors: &mut Vec<String>) {
        if e.concept_uri.as_deref().map_or(true, |u| u.trim().is_empty()) {
            errors.push(format!(
                "Entity \"{}\" is missing a conceptURI",
                e.concept_alias
            ));
        }
    }

    fn child_entity_has_valid_parent(&self, config: &Config, e: &Entity, errors: &mut Vec<String>) {
        if !e.is_child_entity() {
            return;
        }

        let alias = &e.concept_alias;
        let Some(parent) = config.parent_entity(e) else {
            errors.push(format!(
                "Entity \"{alias}\" specifies a parent entity that does not exist"
            ));
            return;
        };

        let Some(parent_key) = parent.unique_key().filter(|k| !k.trim().is_empty()) else {
            errors.push(format!(
                "Entity \"{alias}\" specifies a parent entity that is missing a uniqueKey"
            ));
            return;
        };

        let Some(uri) = e.attribute_uri(parent_key) else {
            errors.push(format!(
                "Entity \"{alias}\" specifies a parent entity but is missing an attribute for the parent entity uniqueKey: \"{parent_key}\""
            ));
            return;
        };

        if parent.unique_key_uri() != Some(uri) {
            errors.push(format!(
                "Entity \"{alias}\" specifies a parent entity but the attribute for the parent entity uniqueKey: \"{parent_key}\" has a different uri: \"{uri}\" instead of \"{}\"",
                parent.unique_key_uri().unwrap_or_default()
            ));
        } else if parent.concept_alias == e.concept_alias {
            errors.push(format!(
                "Entity \"{alias}\" specifies a parent entity that is itself"
            ));
        } else if e.unique_across_project && !parent.unique_across_project {
            errors.push(format!(
                "Entity \"{alias}\" requires the key to be unique across the entire project, but the parentEntity is not unique across the project."
            ));
        }
    }

    fn datetime_attributes_have_data_format(&self, e: &Entity, errors: &mut Vec<String>) {
        for a in &e.attributes {
            if a.data_type.is_temporal()
                && a.data_format.as_deref().map_or(true, |f| f.is_empty())
            {
                errors.push(format!(
                    "Entity \"{}\" specifies an attribute \"{}\" with dataType \"{}\" but is missing a dataFormat",
                    e.concept_alias, a.uri, a.data_type
                ));
            }
        }
    }

    fn valid_validation_lists(&self, config: &Config, network: &Config, errors: &mut Vec<String>) {
        let mut missing: Vec<&str> = network.lists.iter().map(|l| l.alias.as_str()).collect();

        for l in &config.lists {
            if let Some(network_list) = network.find_list(&l.alias) {
                // field-for-field equality; the network flag is not part of
                // the comparison
                let mut ours = l.clone();
                ours.network_list = network_list.network_list;
                if ours != *network_list {
                    errors.push(format!(
                        "Project config validation list \"{}\" differs from the network config validation list with the same alias",
                        l.alias
                    ));
                }
                missing.retain(|alias| *alias != l.alias);
            }
        }

        if !missing.is_empty() {
            errors.push(format!(
                "Project config validation lists are missing the following network config validation lists: [\"{}\"]",
                missing.join("\", \"")
            ));
        }
    }

    fn contains_network_expedition_props(
        &self,
        config: &Config,
        network: &Config,
        errors: &mut Vec<String>,
    ) {
        for p in &network.expedition_metadata_properties {
            if !config.expedition_metadata_properties.contains(p) {
                errors.push(format!(
                    "Project config expeditionMetadataProperties is missing a network prop: \"{}\"",
                    p.name
                ));
            }
        }
    }

    /// Project entities must be restrictions of their network counterparts:
    /// same identity settings, a subset of attributes, and every applicable
    /// network rule still present.
    fn entity_restricts_network_entity(
        &self,
        config: &Config,
        network: &Config,
        e: &Entity,
        errors: &mut Vec<String>,
    ) {
        let alias = &e.concept_alias;
        let Some(network_entity) = network.entity(alias) else {
            errors.push(format!(
                "Entity \"{alias}\" is not a registered entity for this network"
            ));
            return;
        };

        if network_entity.concept_uri != e.concept_uri {
            errors.push(format!(
                "Entity \"{alias}\".conceptUri does not match the network entity's conceptUri"
            ));
        }
        if network_entity.parent_entity != e.parent_entity {
            errors.push(format!(
                "Entity \"{alias}\".parentEntity does not match the network entity's parentEntity"
            ));
        }
        if network_entity.record_type != e.record_type {
            errors.push(format!(
                "Entity \"{alias}\".recordType does not match the network entity's recordType"
            ));
        }
        if network_entity.variant != e.variant {
            errors.push(format!(
                "Entity \"{alias}\".type does not match the network entity's type"
            ));
        }

        self.attributes_restrict_network_entity(network_entity, e, errors);
        self.entity_contains_network_rules(network_entity, e, errors);
        self.entity_has_valid_unique_key(config, network_entity, e, errors);
    }

    fn attributes_restrict_network_entity(
        &self,
        network_entity: &Entity,
        e: &Entity,
        errors: &mut Vec<String>,
    ) {
        let network_attributes: HashMap<&str, &super::Attribute> = network_entity
            .attributes
            .iter()
            .map(|a| (a.uri.as_str(), a))
            .collect();

        for a in &e.attributes {
            let alias = &e.concept_alias;
            let Some(n) = network_attributes.get(a.uri.as_str()) else {
                errors.push(format!(
                    "Entity \"{alias}\" contains an Attribute \"{}\" that is not found in the network entity",
                    a.uri
                ));
                continue;
            };

            let mismatches = [
                (n.column != a.column, "column"),
                (n.data_type != a.data_type, "dataType"),
                (n.data_format != a.data_format, "dataFormat"),
                (n.internal != a.internal, "internal property"),
                (n.defined_by != a.defined_by, "definedBy"),
                (n.delimited_by != a.delimited_by, "delimitedBy"),
            ];
            for (mismatch, what) in mismatches {
                if mismatch {
                    errors.push(format!(
                        "Entity \"{alias}\" contains an Attribute \"{}\" whose {what} does not match the network Attribute's {what}",
                        a.uri
                    ));
                }
            }
        }
    }

    fn entity_contains_network_rules(
        &self,
        network_entity: &Entity,
        e: &Entity,
        errors: &mut Vec<String>,
    ) {
        let columns = e.columns();

        for network_rule in &network_entity.rules {
            // not every network rule applies to the columns this project kept
            let Some(expected) = network_rule.to_project_rule(&columns) else {
                continue;
            };

            let found = e
                .rules
                .iter()
                .any(|rule| *rule == expected || rule.contains(&expected));
            if !found {
                errors.push(format!(
                    "Entity \"{}\" is missing a network Rule: type: \"{}\", level: \"{}\"",
                    e.concept_alias,
                    expected.name(),
                    expected.level()
                ));
            }
        }
    }

    fn entity_has_valid_unique_key(
        &self,
        config: &Config,
        network_entity: &Entity,
        e: &Entity,
        errors: &mut Vec<String>,
    ) {
        if e.hashed || network_entity.unique_key() == e.unique_key() {
            return;
        }

        if e.is_child_entity() {
            if let Some(parent) = config.parent_entity(e) {
                if !parent.hashed
                    && parent.unique_key().map_or(false, |k| !k.is_empty())
                    && parent.unique_key() == e.unique_key()
                {
                    return;
                }
            }
        }

        errors.push(format!(
            "Entity \"{}\" does not specify a valid uniqueKey. The uniqueKey can be the network entity's uniqueKey or a parent entity's uniqueKey",
            e.concept_alias
        ));
    }
}

impl Default for ConfigValidator<'_> {
    fn default() -> Self {
        ConfigValidator::new()
    }
}
