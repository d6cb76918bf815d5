//! Validating a whole dataset, set by set, parents first.

use crate::error::{Result, VoucherError};
use crate::records::Dataset;
use crate::schema::Config;

use super::record_validator::RecordValidator;
use super::EntityMessages;

const DUPLICATE_PARENT_GROUP: &str = "Duplicate parent records";
const MISSING_EXPEDITION_GROUP: &str = "Missing expeditionCode";

/// The outcome of validating every RecordSet in a dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetReport {
    messages: Vec<EntityMessages>,
    has_error: bool,
}

impl DatasetReport {
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    /// True when any set failed an ERROR-level check; the dataset must not
    /// be persisted.
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn messages(&self) -> &[EntityMessages] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<EntityMessages> {
        self.messages
    }

    fn add(&mut self, messages: EntityMessages) {
        if messages.is_empty() {
            return;
        }
        let existing = self.messages.iter_mut().find(|m| {
            m.concept_alias() == messages.concept_alias() && m.sheet_name() == messages.sheet_name()
        });
        match existing {
            Some(m) => m.merge(&messages),
            None => self.messages.push(messages),
        }
    }
}

/// Validates a [`Dataset`]: deduplicates parent sets fanned out from
/// multi-entity worksheets, then runs each entity's rules with its parent
/// set in scope.
#[derive(Debug, Clone, Copy)]
pub struct DatasetValidator<'a> {
    config: &'a Config,
}

impl<'a> DatasetValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        DatasetValidator { config }
    }

    /// Returns an error only for structural problems (a child set whose
    /// parent set was never loaded). Data problems, including parent rows
    /// repeated with conflicting values, are reported in the
    /// [`DatasetReport`].
    pub fn validate(&self, dataset: &mut Dataset) -> Result<DatasetReport> {
        let mut report = DatasetReport::default();
        let validator = RecordValidator::new(self.config);

        // a parent entity read from a multi-entity sheet repeats once per
        // child row; collapse it before its uniqueness rules run. Parents
        // loaded from their own sheet keep their duplicates so the
        // uniqueness rules can report them.
        let parent_aliases: Vec<String> = dataset
            .sets()
            .iter()
            .filter(|s| {
                s.entity().is_child_entity()
                    && self.config.is_multi_sheet_entity(s.concept_alias())
            })
            .filter_map(|s| s.entity().parent_entity.clone())
            .collect();
        for alias in parent_aliases {
            let Some(parent) = dataset.set_mut(&alias) else {
                continue;
            };
            if let Err(VoucherError::InvalidRecords { identifiers }) = parent.remove_duplicates() {
                let mut messages = EntityMessages::new(
                    parent.concept_alias(),
                    parent.entity().worksheet.clone(),
                );
                messages.add_error_message(
                    DUPLICATE_PARENT_GROUP,
                    format!(
                        "identifiers used more than once with differing data: \"{}\"",
                        identifiers.join("\", \"")
                    ),
                );
                report.add(messages);
                report.has_error = true;
            }
        }

        for i in 0..dataset.len() {
            if !dataset.sets()[i].has_record_to_persist() {
                continue;
            }
            let (set, parent) = dataset.set_with_parent_mut(i);
            let set_report = validator.validate(set, parent)?;
            if set_report.has_error() {
                report.has_error = true;
            }
            report.add(set_report.into_messages());

            if set.expedition_code().is_none() {
                let mut messages = EntityMessages::new(
                    set.concept_alias(),
                    set.entity().worksheet.clone(),
                );
                messages.add_error_message(
                    MISSING_EXPEDITION_GROUP,
                    format!(
                        "One or more records are missing an expeditionCode. When uploading \
                         data from multiple expeditions, each record in the {} worksheet \
                         must have a pre-existing expeditionCode specified in the column \
                         \"expeditionCode\".",
                        set.concept_alias()
                    ),
                );
                report.add(messages);
                report.has_error = true;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Record, RecordSet};
    use crate::schema::Entity;

    fn record(pairs: &[(&str, &str)]) -> Record {
        Record::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn sample_tissue_config() -> Config {
        let json = r#"{
            "entities": [
                {
                    "conceptAlias": "Sample",
                    "conceptURI": "urn:Sample",
                    "uniqueKey": "materialSampleID",
                    "worksheet": "Samples",
                    "attributes": [
                        {"column": "materialSampleID", "uri": "urn:materialSampleID"},
                        {"column": "genus", "uri": "urn:genus"}
                    ],
                    "rules": []
                },
                {
                    "type": "ChildEntity",
                    "conceptAlias": "Tissue",
                    "conceptURI": "urn:Tissue",
                    "parentEntity": "Sample",
                    "uniqueKey": "tissueID",
                    "worksheet": "Samples",
                    "attributes": [
                        {"column": "tissueID", "uri": "urn:tissueID"}
                    ],
                    "rules": []
                }
            ],
            "lists": []
        }"#;
        let mut config = Config::from_json(json).unwrap();
        config.add_default_rules(false);
        config
    }

    /// Same entities, but the tissues load from their own worksheet.
    fn separate_sheet_config() -> Config {
        let mut config = sample_tissue_config();
        config.entities[1].worksheet = Some("Tissues".to_string());
        config
    }

    fn entity(config: &Config, alias: &str) -> Entity {
        config.entity(alias).cloned().unwrap()
    }

    fn set(config: &Config, alias: &str, records: Vec<Record>) -> RecordSet {
        RecordSet::new(entity(config, alias), records, false).with_expedition_code("demo")
    }

    #[test]
    fn valid_dataset_passes() {
        let config = sample_tissue_config();

        let mut dataset = Dataset::new();
        dataset.add(set(
            &config,
            "Sample",
            vec![record(&[("urn:materialSampleID", "S1"), ("urn:genus", "Carex")])],
        ));
        dataset.add(set(
            &config,
            "Tissue",
            vec![record(&[
                ("urn:tissueID", "T1"),
                ("urn:materialSampleID", "S1"),
            ])],
        ));

        let report = DatasetValidator::new(&config)
            .validate(&mut dataset)
            .unwrap();
        assert!(report.is_valid(), "{:?}", report.messages());
        assert!(!report.has_error());
    }

    #[test]
    fn repeated_parent_rows_collapse_before_uniqueness_runs() {
        let config = sample_tissue_config();

        // the Samples sheet repeats the parent row once per tissue row
        let mut dataset = Dataset::new();
        dataset.add(set(
            &config,
            "Sample",
            vec![
                record(&[("urn:materialSampleID", "S1"), ("urn:genus", "Carex")]),
                record(&[("urn:materialSampleID", "S1"), ("urn:genus", "Carex")]),
            ],
        ));
        dataset.add(set(
            &config,
            "Tissue",
            vec![
                record(&[("urn:tissueID", "T1"), ("urn:materialSampleID", "S1")]),
                record(&[("urn:tissueID", "T2"), ("urn:materialSampleID", "S1")]),
            ],
        ));

        let report = DatasetValidator::new(&config)
            .validate(&mut dataset)
            .unwrap();
        assert!(report.is_valid(), "{:?}", report.messages());
        assert_eq!(dataset.set("Sample").unwrap().len(), 1);
    }

    #[test]
    fn single_sheet_parent_duplicates_fail_uniqueness() {
        let config = separate_sheet_config();

        // the parent loads from its own sheet, so repeated rows are real
        // duplicates and must fail the uniqueKey rule instead of collapsing
        let mut dataset = Dataset::new();
        dataset.add(set(
            &config,
            "Sample",
            vec![
                record(&[("urn:materialSampleID", "S1"), ("urn:genus", "Carex")]),
                record(&[("urn:materialSampleID", "S1"), ("urn:genus", "Carex")]),
            ],
        ));
        dataset.add(set(
            &config,
            "Tissue",
            vec![record(&[
                ("urn:tissueID", "T1"),
                ("urn:materialSampleID", "S1"),
            ])],
        ));

        let report = DatasetValidator::new(&config)
            .validate(&mut dataset)
            .unwrap();
        assert!(report.has_error());
        assert_eq!(dataset.set("Sample").unwrap().len(), 2);
        let parent_messages = report
            .messages()
            .iter()
            .find(|m| m.concept_alias() == "Sample")
            .unwrap();
        assert!(parent_messages
            .error_messages()
            .contains_key("Unique value constraint did not pass"));
    }

    #[test]
    fn conflicting_parent_rows_are_an_error() {
        let config = sample_tissue_config();

        let mut dataset = Dataset::new();
        dataset.add(set(
            &config,
            "Sample",
            vec![
                record(&[("urn:materialSampleID", "S1"), ("urn:genus", "Carex")]),
                record(&[("urn:materialSampleID", "S1"), ("urn:genus", "Poa")]),
            ],
        ));
        dataset.add(set(
            &config,
            "Tissue",
            vec![record(&[
                ("urn:tissueID", "T1"),
                ("urn:materialSampleID", "S1"),
            ])],
        ));

        let report = DatasetValidator::new(&config)
            .validate(&mut dataset)
            .unwrap();
        assert!(report.has_error());
        let parent_messages = report
            .messages()
            .iter()
            .find(|m| m.concept_alias() == "Sample")
            .unwrap();
        assert!(parent_messages
            .error_messages()
            .contains_key(DUPLICATE_PARENT_GROUP));
    }

    #[test]
    fn invalid_parent_reference_is_reported_on_the_child() {
        let config = sample_tissue_config();

        let mut dataset = Dataset::new();
        dataset.add(set(
            &config,
            "Sample",
            vec![record(&[("urn:materialSampleID", "S1")])],
        ));
        dataset.add(set(
            &config,
            "Tissue",
            vec![record(&[
                ("urn:tissueID", "T1"),
                ("urn:materialSampleID", "MISSING"),
            ])],
        ));

        let report = DatasetValidator::new(&config)
            .validate(&mut dataset)
            .unwrap();
        assert!(report.has_error());
        let child_messages = report
            .messages()
            .iter()
            .find(|m| m.concept_alias() == "Tissue")
            .unwrap();
        assert!(child_messages
            .error_messages()
            .contains_key("Invalid parent identifier(s)"));
    }

    #[test]
    fn sets_with_nothing_to_persist_are_skipped() {
        let config = sample_tissue_config();

        let mut dataset = Dataset::new();
        dataset.add(set(
            &config,
            "Sample",
            vec![record(&[("urn:materialSampleID", "S1")])],
        ));
        // context-only tissue records with a broken parent reference
        dataset.add(set(
            &config,
            "Tissue",
            vec![record(&[
                ("urn:tissueID", "T1"),
                ("urn:materialSampleID", "MISSING"),
            ])
            .with_persist(false)],
        ));

        let report = DatasetValidator::new(&config)
            .validate(&mut dataset)
            .unwrap();
        assert!(report.is_valid(), "{:?}", report.messages());
    }

    #[test]
    fn sets_without_an_expedition_code_are_an_error() {
        let config = sample_tissue_config();

        let mut dataset = Dataset::new();
        dataset.add(RecordSet::new(
            entity(&config, "Sample"),
            vec![record(&[("urn:materialSampleID", "S1")])],
            false,
        ));

        let report = DatasetValidator::new(&config)
            .validate(&mut dataset)
            .unwrap();
        assert!(report.has_error());
        let messages = report
            .messages()
            .iter()
            .find(|m| m.concept_alias() == "Sample")
            .unwrap();
        assert!(messages
            .error_messages()
            .contains_key(MISSING_EXPEDITION_GROUP));
    }
}
