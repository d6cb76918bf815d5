//! Joining an entity's records with their ancestors' data.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{Result, VoucherError};
use crate::schema::{Config, Entity};

use super::{QueryResults, Record};

/// Flattens the ancestry of an entity's records.
///
/// Results are ordered deepest-child first, so each ancestor's data is in
/// place before it is needed to look up the next one: a record that only
/// carries its parent's key still reaches its grandparent through the
/// parent's joined properties.
#[derive(Debug)]
pub struct RecordJoiner {
    results: QueryResults,
    concept_alias: String,
    unique_key_uri: Option<String>,
    // per entity: join value -> record index within that entity's result
    lookups: HashMap<String, HashMap<String, usize>>,
}

impl RecordJoiner {
    pub fn new(config: &Config, entity: &Entity, mut results: QueryResults) -> Self {
        results.sort_children_first(config);

        let mut lookups = HashMap::new();
        for result in results.results() {
            if result.entity().concept_alias == entity.concept_alias {
                continue;
            }
            let Some(key_uri) = result.entity().unique_key_uri() else {
                continue;
            };
            let lookup = result
                .records()
                .iter()
                .enumerate()
                .map(|(i, r)| (r.get(key_uri).to_string(), i))
                .collect();
            lookups.insert(result.entity().concept_alias.clone(), lookup);
        }

        RecordJoiner {
            results,
            concept_alias: entity.concept_alias.clone(),
            unique_key_uri: entity.unique_key_uri().map(str::to_string),
            lookups,
        }
    }

    fn find(&self, concept_alias: &str, join_value: &str) -> Option<&Record> {
        let index = *self.lookups.get(concept_alias)?.get(join_value)?;
        self.results.result(concept_alias)?.records().get(index)
    }

    fn identifier(&self, record: &Record) -> Option<String> {
        self.unique_key_uri
            .as_deref()
            .map(|uri| record.get(uri).to_string())
    }

    fn missing_record(&self, record: &Record) -> VoucherError {
        VoucherError::MissingRecord {
            identifier: self.identifier(record),
        }
    }

    /// Produce a copy of `record` carrying all ancestor properties.
    ///
    /// Each ancestor also contributes a `{conceptAlias}_rootIdentifier`
    /// entry. On uri collisions the eldest ancestor's value survives,
    /// except against the record's own properties, which always win. The
    /// joined record is never persisted.
    pub fn join_record(&self, record: &Record) -> Result<Record> {
        let mut data: IndexMap<String, String> = IndexMap::new();

        for result in self.results.results() {
            let alias = &result.entity().concept_alias;
            if *alias == self.concept_alias {
                continue;
            }
            let join_key = result
                .entity()
                .unique_key_uri()
                .ok_or_else(|| self.missing_record(record))?;

            let mut join_value = record.get(join_key).to_string();
            if join_value.is_empty() {
                // farther ancestors are reached through data joined from
                // nearer ones
                join_value = data.get(join_key).cloned().unwrap_or_default();
            }
            if join_value.is_empty() {
                return Err(self.missing_record(record));
            }

            let ancestor = self
                .find(alias, &join_value)
                .ok_or_else(|| self.missing_record(record))?;

            for (uri, value) in ancestor.properties() {
                data.insert(uri.clone(), value.clone());
            }
            data.insert(
                format!("{alias}_{}", Record::ROOT_IDENTIFIER),
                ancestor.root_identifier().unwrap_or_default().to_string(),
            );
        }

        for (uri, value) in record.properties() {
            data.insert(uri.clone(), value.clone());
        }

        let mut joined = Record::new(data)
            .with_project_id(record.project_id())
            .with_persist(false);
        if let Some(root) = record.root_identifier() {
            joined = joined.with_root_identifier(root);
        }
        if let Some(code) = record.expedition_code() {
            joined = joined.with_expedition_code(code);
        }
        Ok(joined)
    }

    /// The record of ancestor entity `concept_alias` that `record` belongs
    /// to, following the parent chain one step at a time.
    pub fn parent(&self, concept_alias: &str, record: &Record) -> Result<&Record> {
        let mut current = record;
        let mut past_own = false;

        for result in self.results.results() {
            let alias = &result.entity().concept_alias;
            if !past_own {
                past_own = *alias == self.concept_alias;
                continue;
            }

            let join_key = result
                .entity()
                .unique_key_uri()
                .ok_or_else(|| self.missing_record(record))?;
            let mut join_value = current.get(join_key);
            if join_value.is_empty() {
                join_value = record.get(join_key);
            }
            if join_value.is_empty() {
                return Err(self.missing_record(record));
            }
            let ancestor = self
                .find(alias, join_value)
                .ok_or_else(|| self.missing_record(record))?;

            if alias == concept_alias {
                return Ok(ancestor);
            }
            current = ancestor;
        }

        Err(self.missing_record(record))
    }
}
