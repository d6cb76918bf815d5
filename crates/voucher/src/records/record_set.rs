//! RecordSet: the records of one entity within one load.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::error::{Result, VoucherError};
use crate::schema::Entity;

use super::Record;

/// Identity of a record within its project: records can only collide when
/// they share a project, an expedition and an identifier value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IdentityKey {
    project_id: u32,
    expedition_code: Option<String>,
    identifier: String,
}

/// All records of one entity being validated or persisted together, plus
/// any context records fetched to check cross-expedition constraints.
#[derive(Debug, Clone)]
pub struct RecordSet {
    entity: Entity,
    records: Vec<Record>,
    expedition_code: Option<String>,
    reload: bool,
    deduplicated: bool,
}

impl RecordSet {
    pub fn new(entity: Entity, records: Vec<Record>, reload: bool) -> Self {
        RecordSet {
            entity,
            records,
            expedition_code: None,
            reload,
            deduplicated: false,
        }
    }

    /// The expedition this set is being loaded into. Stamped onto every
    /// persistable record so expedition-scoped rules see a single code.
    pub fn with_expedition_code(mut self, expedition_code: impl Into<String>) -> Self {
        let code = expedition_code.into();
        for r in self.records.iter_mut().filter(|r| r.persist()) {
            r.set_expedition_code(code.clone());
        }
        self.expedition_code = Some(code);
        self.deduplicated = false;
        self
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn concept_alias(&self) -> &str {
        &self.entity.concept_alias
    }

    /// The set's expedition code, falling back to the first persistable
    /// record's code when none was set on the set itself.
    pub fn expedition_code(&self) -> Option<&str> {
        self.expedition_code.as_deref().or_else(|| {
            self.records
                .iter()
                .find(|r| r.persist())
                .and_then(|r| r.expedition_code())
        })
    }

    /// The project the set's persistable records belong to, 0 when unset.
    pub fn project_id(&self) -> u32 {
        self.records
            .iter()
            .find(|r| r.persist())
            .map(|r| r.project_id())
            .unwrap_or(0)
    }

    /// A reload replaces the expedition's existing records instead of
    /// merging into them.
    pub fn reload(&self) -> bool {
        self.reload
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn add(&mut self, record: Record) {
        self.records.push(record);
        self.deduplicated = false;
    }

    pub fn records_to_persist(&self) -> Vec<&Record> {
        self.records.iter().filter(|r| r.persist()).collect()
    }

    pub fn has_record_to_persist(&self) -> bool {
        self.records.iter().any(|r| r.persist())
    }

    /// Split borrow for the rule engine: the entity stays readable while
    /// rules mark records.
    pub fn entity_and_records_mut(&mut self) -> (&Entity, &mut Vec<Record>) {
        (&self.entity, &mut self.records)
    }

    /// The identifier value of a record under this set's entity: the
    /// uniqueKey column value, or a content hash for hashed entities.
    pub fn identity_value(&self, record: &Record) -> String {
        if self.entity.hashed {
            return content_hash(record);
        }
        self.entity
            .unique_key_uri()
            .map(|uri| record.get(uri).to_string())
            .unwrap_or_default()
    }

    fn identity_key(&self, record: &Record) -> IdentityKey {
        IdentityKey {
            project_id: record.project_id(),
            expedition_code: record.expedition_code().map(str::to_string),
            identifier: self.identity_value(record),
        }
    }

    fn build_index(&self) -> HashMap<IdentityKey, Vec<usize>> {
        let mut index: HashMap<IdentityKey, Vec<usize>> = HashMap::new();
        for (i, r) in self.records.iter().enumerate() {
            index.entry(self.identity_key(r)).or_default().push(i);
        }
        index
    }

    /// Drop structurally equal duplicate records, keeping the first of each
    /// group. Records that share an identifier but differ in data are a
    /// hard failure naming every conflicting identifier.
    ///
    /// Idempotent: a second call on an unchanged set does nothing.
    pub fn remove_duplicates(&mut self) -> Result<()> {
        if self.deduplicated {
            return Ok(());
        }

        let index = self.build_index();
        let mut conflicting = Vec::new();
        let mut drop = Vec::new();

        for indices in index.values() {
            if indices.len() < 2 {
                continue;
            }

            let first = &self.records[indices[0]];
            if indices[1..].iter().any(|&i| self.records[i] != *first) {
                conflicting.push(self.identity_value(first));
            } else {
                drop.extend_from_slice(&indices[1..]);
            }
        }

        if !conflicting.is_empty() {
            conflicting.sort();
            return Err(VoucherError::InvalidRecords {
                identifiers: conflicting,
            });
        }

        if !drop.is_empty() {
            drop.sort_unstable();
            let mut i = 0;
            self.records.retain(|_| {
                let keep = drop.binary_search(&i).is_err();
                i += 1;
                keep
            });
        }

        self.deduplicated = true;
        Ok(())
    }

    /// Merge context records into the set: first write wins, so records
    /// already present (by identity) are not replaced.
    pub fn merge(&mut self, records: Vec<Record>) {
        self.merge_scoped(records, None);
    }

    /// Merge with parent-key scoping: a record whose identifier is already
    /// present is still added when it references a different parent. Used
    /// for child entities whose identifiers only need to be unique within
    /// their parent.
    pub fn merge_with_parent_key(&mut self, records: Vec<Record>, parent_key_uri: &str) {
        self.merge_scoped(records, Some(parent_key_uri));
    }

    fn merge_scoped(&mut self, records: Vec<Record>, parent_key_uri: Option<&str>) {
        let mut index = self.build_index();

        for record in records {
            let key = self.identity_key(&record);

            let add = match index.get(&key) {
                None => true,
                Some(existing) => match parent_key_uri {
                    None => false,
                    Some(uri) => existing
                        .iter()
                        .all(|&i| self.records[i].get(uri) != record.get(uri)),
                },
            };

            if add {
                index.entry(key).or_default().push(self.records.len());
                self.records.push(record);
                self.deduplicated = false;
            }
        }
    }
}

/// Stable identity for hashed entities: a digest over the sorted property
/// list, so column order and whitespace never change the identity.
pub fn content_hash(record: &Record) -> String {
    let mut properties: Vec<(&str, &str)> = record
        .properties()
        .iter()
        .map(|(k, v)| (k.as_str(), v.trim()))
        .filter(|(_, v)| !v.is_empty())
        .collect();
    properties.sort_unstable();

    let mut hasher = Sha256::new();
    for (uri, value) in properties {
        hasher.update(uri.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use indexmap::IndexMap;

    fn tissue_entity() -> Entity {
        let mut e = Entity::new("Tissue");
        e.unique_key = Some("tissueID".to_string());
        e.attributes.push(Attribute::new("tissueID", "urn:tissueID"));
        e.attributes.push(Attribute::new("plate", "urn:plate"));
        e
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        let properties: IndexMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Record::new(properties)
    }

    #[test]
    fn removes_equal_duplicates_keeping_first() {
        let mut set = RecordSet::new(
            tissue_entity(),
            vec![
                record(&[("urn:tissueID", "T1"), ("urn:plate", "A")]),
                record(&[("urn:tissueID", "T1"), ("urn:plate", "A")]),
                record(&[("urn:tissueID", "T2"), ("urn:plate", "B")]),
            ],
            false,
        );

        set.remove_duplicates().unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0].get("urn:tissueID"), "T1");
        assert_eq!(set.records()[1].get("urn:tissueID"), "T2");
    }

    #[test]
    fn conflicting_duplicates_fail_naming_identifiers() {
        let mut set = RecordSet::new(
            tissue_entity(),
            vec![
                record(&[("urn:tissueID", "T1"), ("urn:plate", "A")]),
                record(&[("urn:tissueID", "T1"), ("urn:plate", "B")]),
            ],
            false,
        );

        match set.remove_duplicates() {
            Err(VoucherError::InvalidRecords { identifiers }) => {
                assert_eq!(identifiers, vec!["T1"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn dedup_is_idempotent_until_records_change() {
        let mut set = RecordSet::new(
            tissue_entity(),
            vec![
                record(&[("urn:tissueID", "T1")]),
                record(&[("urn:tissueID", "T1")]),
            ],
            false,
        );

        set.remove_duplicates().unwrap();
        assert_eq!(set.len(), 1);
        set.remove_duplicates().unwrap();
        assert_eq!(set.len(), 1);

        // adding invalidates the deduplicated state
        set.add(record(&[("urn:tissueID", "T1")]));
        set.remove_duplicates().unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn expedition_code_falls_back_to_the_first_persistable_record() {
        let set = RecordSet::new(
            tissue_entity(),
            vec![
                record(&[("urn:tissueID", "T0")]).with_persist(false),
                record(&[("urn:tissueID", "T1")]).with_expedition_code("TRIP1"),
            ],
            false,
        );
        assert_eq!(set.expedition_code(), Some("TRIP1"));

        let empty = RecordSet::new(tissue_entity(), Vec::new(), false);
        assert_eq!(empty.expedition_code(), None);
    }

    #[test]
    fn set_expedition_code_is_stamped_onto_persistable_records() {
        let set = RecordSet::new(
            tissue_entity(),
            vec![
                record(&[("urn:tissueID", "T1")]),
                record(&[("urn:tissueID", "T2")]).with_persist(false),
            ],
            false,
        )
        .with_expedition_code("TRIP1");

        assert_eq!(set.expedition_code(), Some("TRIP1"));
        assert_eq!(set.records()[0].expedition_code(), Some("TRIP1"));
        assert_eq!(set.records()[1].expedition_code(), None);
    }

    #[test]
    fn records_in_different_expeditions_do_not_collide() {
        let mut set = RecordSet::new(
            tissue_entity(),
            vec![
                record(&[("urn:tissueID", "T1"), ("urn:plate", "A")]).with_expedition_code("E1"),
                record(&[("urn:tissueID", "T1"), ("urn:plate", "B")]).with_expedition_code("E2"),
            ],
            false,
        );

        set.remove_duplicates().unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn merge_is_first_write_wins() {
        let mut set = RecordSet::new(
            tissue_entity(),
            vec![record(&[("urn:tissueID", "T1"), ("urn:plate", "A")])],
            false,
        );

        set.merge(vec![
            record(&[("urn:tissueID", "T1"), ("urn:plate", "ZZZ")]),
            record(&[("urn:tissueID", "T2"), ("urn:plate", "B")]),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0].get("urn:plate"), "A");
    }

    #[test]
    fn merge_with_parent_key_scopes_identity() {
        let mut e = tissue_entity();
        e.attributes
            .push(Attribute::new("materialSampleID", "urn:materialSampleID"));

        let mut set = RecordSet::new(
            e,
            vec![record(&[
                ("urn:tissueID", "T1"),
                ("urn:materialSampleID", "S1"),
            ])],
            false,
        );

        set.merge_with_parent_key(
            vec![
                // same identifier, same parent: skipped
                record(&[("urn:tissueID", "T1"), ("urn:materialSampleID", "S1")]),
                // same identifier, different parent: kept
                record(&[("urn:tissueID", "T1"), ("urn:materialSampleID", "S2")]),
            ],
            "urn:materialSampleID",
        );

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn hashed_entity_identity_ignores_order_and_whitespace() {
        let a = record(&[("urn:plate", "A"), ("urn:well", " B1 ")]);
        let b = record(&[("urn:well", "B1"), ("urn:plate", "A")]);
        let c = record(&[("urn:plate", "A"), ("urn:well", "B2")]);

        assert_eq!(content_hash(&a), content_hash(&b));
        assert_ne!(content_hash(&a), content_hash(&c));
    }

    #[test]
    fn hashed_set_dedups_by_content() {
        let mut e = tissue_entity();
        e.hashed = true;
        e.unique_key = None;

        let mut set = RecordSet::new(
            e,
            vec![
                record(&[("urn:plate", "A"), ("urn:well", "B1")]),
                record(&[("urn:well", "B1"), ("urn:plate", "A")]),
            ],
            false,
        );

        set.remove_duplicates().unwrap();
        assert_eq!(set.len(), 1);
    }
}
