//! Property-based tests for record identity and deduplication.

use indexmap::IndexMap;
use proptest::prelude::*;

use voucher::records::content_hash;
use voucher::schema::Attribute;
use voucher::{Entity, Record, RecordSet};

fn tissue_entity() -> Entity {
    let mut e = Entity::new("Tissue");
    e.unique_key = Some("tissueID".to_string());
    e.attributes.push(Attribute::new("tissueID", "urn:tissueID"));
    e.attributes.push(Attribute::new("plate", "urn:plate"));
    e
}

fn properties() -> impl Strategy<Value = IndexMap<String, String>> {
    proptest::collection::btree_map("urn:[a-z]{1,8}", "[ a-zA-Z0-9_\\-\\.]{0,20}", 0..8)
        .prop_map(|m| m.into_iter().collect())
}

fn identified_record() -> impl Strategy<Value = Record> {
    (properties(), "[A-Z][0-9]{1,4}").prop_map(|(mut props, id)| {
        props.insert("urn:tissueID".to_string(), id);
        Record::new(props)
    })
}

proptest! {
    #[test]
    fn content_hash_ignores_property_order(props in properties()) {
        let forward = Record::new(props.clone());
        let reversed = Record::new(props.into_iter().rev().collect());

        prop_assert_eq!(content_hash(&forward), content_hash(&reversed));
    }

    #[test]
    fn content_hash_ignores_surrounding_whitespace(props in properties()) {
        let padded: IndexMap<String, String> = props
            .iter()
            .map(|(k, v)| (k.clone(), format!("  {v}  ")))
            .collect();

        prop_assert_eq!(
            content_hash(&Record::new(props)),
            content_hash(&Record::new(padded))
        );
    }

    #[test]
    fn record_get_never_panics(props in properties(), uri in "[a-z:]{0,12}") {
        let record = Record::new(props);
        let _ = record.get(&uri);
        let _ = record.has(&uri);
    }

    #[test]
    fn dedup_never_increases_and_is_idempotent(
        records in proptest::collection::vec(identified_record(), 0..12)
    ) {
        let mut set = RecordSet::new(tissue_entity(), records.clone(), false);

        let Ok(()) = set.remove_duplicates() else {
            // conflicting identifiers are a hard failure, not a dedup case
            return Ok(());
        };

        let len = set.len();
        prop_assert!(len <= records.len());

        set.remove_duplicates().unwrap();
        prop_assert_eq!(set.len(), len);

        // all surviving identities are distinct
        let mut identities: Vec<String> =
            set.records().iter().map(|r| set.identity_value(r)).collect();
        identities.sort();
        identities.dedup();
        prop_assert_eq!(identities.len(), len);
    }

    #[test]
    fn duplicated_input_dedups_to_the_original(
        records in proptest::collection::vec(identified_record(), 1..8)
    ) {
        let mut unique = RecordSet::new(tissue_entity(), records.clone(), false);
        if unique.remove_duplicates().is_err() {
            return Ok(());
        }
        let expected = unique.len();

        let mut doubled_records = records.clone();
        doubled_records.extend(records);
        let mut doubled = RecordSet::new(tissue_entity(), doubled_records, false);

        doubled.remove_duplicates().unwrap();
        prop_assert_eq!(doubled.len(), expected);
    }
}
