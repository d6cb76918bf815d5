//! Controlled config updates.
//!
//! Some config data is immutable once records reference it: an entity's
//! parentEntity, its uniqueKey, and attribute uris. The updator takes a
//! submitted replacement config, reverts any change to immutable data, and
//! reports which entities were added or removed so callers can migrate
//! stored records.

use super::{Config, Entity};

/// Result of applying an update: the sanitized config plus the entity-level
/// diff against the previous config.
#[derive(Debug, Clone)]
pub struct ConfigUpdate {
    pub config: Config,
    pub new_entities: Vec<Entity>,
    pub removed_entities: Vec<Entity>,
}

/// Applies the update policy for network or project configs.
///
/// The two differ in one respect: network updates stamp every rule as a
/// network rule, and treat a renamed uniqueKey column as an illegal rename
/// to revert rather than a new attribute.
pub struct ConfigUpdator {
    network: bool,
}

impl ConfigUpdator {
    pub fn network() -> Self {
        ConfigUpdator { network: true }
    }

    pub fn project() -> Self {
        ConfigUpdator { network: false }
    }

    pub fn update(&self, mut updated: Config, previous: &Config) -> ConfigUpdate {
        let mut new_entities = Vec::new();

        for e in &mut updated.entities {
            match previous.entity(&e.concept_alias) {
                None => new_entities.push(e.clone()),
                Some(orig) => self.preserve_immutable_data(e, orig),
            }

            if self.network {
                for rule in &mut e.rules {
                    rule.set_network_rule(true);
                }
            }
        }

        let removed_entities = previous
            .entities
            .iter()
            .filter(|e| updated.entity(&e.concept_alias).is_none())
            .cloned()
            .collect();

        ConfigUpdate {
            config: updated,
            new_entities,
            removed_entities,
        }
    }

    /// parentEntity, uniqueKey and attribute uris cannot change after entity
    /// creation.
    fn preserve_immutable_data(&self, updated: &mut Entity, orig: &Entity) {
        updated.parent_entity = orig.parent_entity.clone();
        updated.unique_key = orig.unique_key.clone();

        let orig_key_uri = orig.unique_key_uri().map(str::to_string);

        for attribute in &mut updated.attributes {
            if let Some(orig_attribute) = orig.attribute(&attribute.column) {
                attribute.uri = orig_attribute.uri.clone();
            } else if self.network && orig_key_uri.as_deref() == Some(attribute.uri.as_str()) {
                // an attempt to rename the uniqueKey column: restore both
                // the column and its uri
                if let Some(key) = orig.unique_key() {
                    if let Some(orig_attribute) = orig.attribute(key) {
                        attribute.column = orig_attribute.column.clone();
                        attribute.uri = orig_attribute.uri.clone();
                    }
                }
            }
            // otherwise this is a new attribute; submitted data stands
        }
    }
}
