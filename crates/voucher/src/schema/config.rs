//! The config document: entities, vocabulary lists and expedition metadata.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VoucherError};
use crate::validation::rules::{Rule, RuleLevel};

use super::{Attribute, Entity, ExpeditionMetadataProperty, List};

/// A complete schema document. Validation, record shaping and joining are
/// all driven by one of these.
///
/// The same type serves as a network config (the shared super-schema) and as
/// a project config (a restriction of a network config); which checks apply
/// is decided by the validator, not the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub entities: Vec<Entity>,
    pub lists: Vec<List>,
    pub expedition_metadata_properties: Vec<ExpeditionMetadataProperty>,
}

impl Config {
    /// Parse a config from its JSON document form.
    pub fn from_json(json: &str) -> Result<Config> {
        let mut config: Config = serde_json::from_str(json)?;
        config.configure_entities();
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn entity(&self, concept_alias: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.concept_alias == concept_alias)
    }

    pub fn entity_mut(&mut self, concept_alias: &str) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|e| e.concept_alias == concept_alias)
    }

    /// Like [`Config::entity`], but an unknown alias is an error.
    pub fn require_entity(&self, concept_alias: &str) -> Result<&Entity> {
        self.entity(concept_alias)
            .ok_or_else(|| VoucherError::UnknownEntity(concept_alias.to_string()))
    }

    pub fn find_list(&self, alias: &str) -> Option<&List> {
        self.lists.iter().find(|l| l.alias == alias)
    }

    /// Entities whose records come from the given worksheet.
    pub fn entities_for_sheet(&self, sheet_name: &str) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.worksheet.as_deref() == Some(sheet_name))
            .collect()
    }

    /// All attributes appearing on a worksheet, deduplicated by uri. When
    /// multiple entities share a sheet, shared columns appear once.
    pub fn attributes_for_sheet(&self, sheet_name: &str) -> Vec<&Attribute> {
        let mut seen = IndexSet::new();
        let mut attributes = Vec::new();

        for e in self.entities_for_sheet(sheet_name) {
            for a in &e.attributes {
                if seen.insert(a.uri.as_str()) {
                    attributes.push(a);
                }
            }
        }

        attributes
    }

    /// Distinct worksheet names declared by any entity, in declaration order.
    pub fn worksheets(&self) -> Vec<&str> {
        let mut sheets = IndexSet::new();
        for e in &self.entities {
            if let Some(w) = e.worksheet.as_deref() {
                sheets.insert(w);
            }
        }
        sheets.into_iter().collect()
    }

    /// True when the entity shares its worksheet with at least one other
    /// entity. Records on shared sheets are deduplicated before validation.
    pub fn is_multi_sheet_entity(&self, concept_alias: &str) -> bool {
        self.entity(concept_alias)
            .and_then(|e| e.worksheet.as_deref())
            .map(|sheet| self.entities_for_sheet(sheet).len() > 1)
            .unwrap_or(false)
    }

    /// True when any entity declares this one as its parent.
    pub fn is_parent_entity(&self, concept_alias: &str) -> bool {
        self.entities
            .iter()
            .any(|e| e.parent_entity.as_deref() == Some(concept_alias))
    }

    /// The declared parent of an entity, if it has one.
    pub fn parent_entity(&self, entity: &Entity) -> Option<&Entity> {
        entity
            .parent_entity
            .as_deref()
            .and_then(|alias| self.entity(alias))
    }

    /// The ancestor chain of an entity: parent, grandparent, and so on up
    /// to the root. Cycle-guarded like [`Config::ancestry_depth`].
    pub fn parent_entities(&self, concept_alias: &str) -> Vec<&Entity> {
        let mut parents = Vec::new();
        let Some(mut current) = self.entity(concept_alias) else {
            return parents;
        };

        while let Some(parent) = self.parent_entity(current) {
            parents.push(parent);
            if parents.len() > self.entities.len() {
                break;
            }
            current = parent;
        }

        parents
    }

    /// Columns on a worksheet covered by a RequiredValue rule at the given
    /// level, across every entity on the sheet.
    pub fn required_columns(&self, sheet_name: &str, level: RuleLevel) -> Vec<String> {
        let mut columns = IndexSet::new();

        for e in self.entities_for_sheet(sheet_name) {
            for rule in &e.rules {
                if let Rule::RequiredValue(r) = rule {
                    if r.level == level {
                        columns.extend(r.columns.iter().cloned());
                    }
                }
            }
        }

        columns.into_iter().collect()
    }

    /// True when `descendant` is a (possibly transitive) child of `entity`.
    pub fn is_entity_child_descendant(&self, entity: &Entity, descendant: &Entity) -> bool {
        let mut steps = 0;
        let mut current = descendant;

        while let Some(parent) = self.parent_entity(current) {
            if parent.concept_alias == entity.concept_alias {
                return true;
            }
            steps += 1;
            if steps > self.entities.len() {
                break;
            }
            current = parent;
        }

        false
    }

    /// Number of ancestors between this entity and its root. Guards against
    /// parent cycles by capping at the entity count.
    pub fn ancestry_depth(&self, entity: &Entity) -> usize {
        let mut depth = 0;
        let mut current = entity;

        while let Some(parent) = self.parent_entity(current) {
            depth += 1;
            if depth > self.entities.len() {
                break;
            }
            current = parent;
        }

        depth
    }

    /// Wire up inherited state that the serialized form does not carry:
    /// child entities inherit their parent's identifier attribute.
    pub fn configure_entities(&mut self) {
        let parents: Vec<Option<Entity>> = self
            .entities
            .iter()
            .map(|e| self.parent_entity(e).cloned())
            .collect();

        for (e, parent) in self.entities.iter_mut().zip(parents) {
            e.configure(parent.as_ref());
        }
    }

    /// Attach the implicit rules every entity carries. See
    /// [`Entity::add_default_rules`].
    pub fn add_default_rules(&mut self, network: bool) {
        let parents: Vec<Option<Entity>> = self
            .entities
            .iter()
            .map(|e| self.parent_entity(e).cloned())
            .collect();

        for (e, parent) in self.entities.iter_mut().zip(parents) {
            e.add_default_rules(network, parent.as_ref());
        }
    }

    /// Generate uris for attributes missing one, per entity.
    pub fn generate_uris(&mut self) {
        for e in &mut self.entities {
            e.generate_uris();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sheet_config() -> Config {
        let mut sample = Entity::new("Sample");
        sample.worksheet = Some("Samples".to_string());
        sample.unique_key = Some("materialSampleID".to_string());
        sample
            .attributes
            .push(Attribute::new("materialSampleID", "urn:materialSampleID"));
        sample.attributes.push(Attribute::new("genus", "urn:genus"));

        let mut tissue = Entity::child("Tissue", "Sample");
        tissue.worksheet = Some("Samples".to_string());
        tissue.unique_key = Some("tissueID".to_string());
        tissue.attributes.push(Attribute::new("tissueID", "urn:tissueID"));

        let mut event = Entity::new("Event");
        event.worksheet = Some("Events".to_string());

        Config {
            entities: vec![sample, tissue, event],
            ..Default::default()
        }
    }

    #[test]
    fn entity_lookup() {
        let config = two_sheet_config();
        assert!(config.entity("Sample").is_some());
        assert!(config.entity("Nope").is_none());
        assert!(config.require_entity("Nope").is_err());
    }

    #[test]
    fn sheet_queries() {
        let config = two_sheet_config();

        let aliases: Vec<&str> = config
            .entities_for_sheet("Samples")
            .iter()
            .map(|e| e.concept_alias.as_str())
            .collect();
        assert_eq!(aliases, vec!["Sample", "Tissue"]);

        assert!(config.is_multi_sheet_entity("Sample"));
        assert!(config.is_multi_sheet_entity("Tissue"));
        assert!(!config.is_multi_sheet_entity("Event"));

        assert_eq!(config.worksheets(), vec!["Samples", "Events"]);
    }

    #[test]
    fn attributes_for_sheet_dedupes_shared_columns() {
        let mut config = two_sheet_config();
        // Tissue inherits Sample's key attribute
        config.configure_entities();

        let columns: Vec<&str> = config
            .attributes_for_sheet("Samples")
            .iter()
            .map(|a| a.column.as_str())
            .collect();
        assert_eq!(columns, vec!["materialSampleID", "genus", "tissueID"]);
    }

    #[test]
    fn parent_relationships() {
        let config = two_sheet_config();

        assert!(config.is_parent_entity("Sample"));
        assert!(!config.is_parent_entity("Tissue"));

        let tissue = config.entity("Tissue").unwrap();
        assert_eq!(
            config.parent_entity(tissue).map(|e| e.concept_alias.as_str()),
            Some("Sample")
        );
        assert_eq!(config.ancestry_depth(tissue), 1);
        assert_eq!(config.ancestry_depth(config.entity("Sample").unwrap()), 0);
    }

    #[test]
    fn parent_entities_walks_the_chain() {
        let mut config = two_sheet_config();
        let mut subtissue = Entity::child("SubTissue", "Tissue");
        subtissue.unique_key = Some("subTissueID".to_string());
        config.entities.push(subtissue);

        let chain: Vec<&str> = config
            .parent_entities("SubTissue")
            .iter()
            .map(|e| e.concept_alias.as_str())
            .collect();
        assert_eq!(chain, vec!["Tissue", "Sample"]);
        assert!(config.parent_entities("Sample").is_empty());
    }

    #[test]
    fn required_columns_by_level() {
        use indexmap::IndexSet;

        let mut config = two_sheet_config();
        config
            .entity_mut("Sample")
            .unwrap()
            .rules
            .push(Rule::RequiredValue(
                crate::validation::rules::RequiredValueRule::new(
                    IndexSet::from(["genus".to_string()]),
                    RuleLevel::Warning,
                ),
            ));
        config.add_default_rules(false);

        let errors = config.required_columns("Samples", RuleLevel::Error);
        assert!(errors.contains(&"materialSampleID".to_string()));
        assert!(errors.contains(&"tissueID".to_string()));

        let warnings = config.required_columns("Samples", RuleLevel::Warning);
        assert_eq!(warnings, vec!["genus".to_string()]);
    }

    #[test]
    fn from_json_configures_children() {
        let config = two_sheet_config();
        let json = serde_json::to_string(&config).unwrap();

        let parsed = Config::from_json(&json).unwrap();
        let tissue = parsed.entity("Tissue").unwrap();
        assert!(tissue.attribute_by_uri("urn:materialSampleID").is_some());
    }
}
