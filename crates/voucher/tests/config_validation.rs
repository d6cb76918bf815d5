//! Integration tests for config parsing and validation.

use voucher::{Config, ConfigValidator};

fn parse(json: &str) -> Config {
    Config::from_json(json).expect("config should parse")
}

/// A small but complete two-entity config: sampling events with samples
/// hanging off them, sharing a worksheet.
fn event_sample_config() -> Config {
    parse(
        r#"{
        "entities": [
            {
                "conceptAlias": "Event",
                "conceptURI": "urn:Event",
                "uniqueKey": "eventID",
                "worksheet": "Events",
                "attributes": [
                    {"column": "eventID", "uri": "urn:eventID"},
                    {"column": "locality", "uri": "urn:locality"},
                    {"column": "collectionDate", "uri": "urn:collectionDate", "dataType": "DATE", "dataFormat": "%Y-%m-%d"}
                ],
                "rules": [
                    {"name": "RequiredValue", "columns": ["locality"], "level": "WARNING"}
                ]
            },
            {
                "type": "ChildEntity",
                "conceptAlias": "Sample",
                "conceptURI": "urn:Sample",
                "parentEntity": "Event",
                "uniqueKey": "materialSampleID",
                "worksheet": "Samples",
                "attributes": [
                    {"column": "materialSampleID", "uri": "urn:materialSampleID"},
                    {"column": "genus", "uri": "urn:genus"}
                ],
                "rules": []
            }
        ],
        "lists": []
    }"#,
    )
}

// =============================================================================
// Structural validation
// =============================================================================

#[test]
fn complete_config_is_valid() {
    let mut config = event_sample_config();
    let errors = ConfigValidator::new().validate(&mut config);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn duplicate_concept_aliases_are_case_insensitive() {
    let mut config = event_sample_config();
    let mut dup = config.entities[0].clone();
    dup.concept_alias = "EVENT".to_string();
    dup.worksheet = None;
    config.entities.push(dup);

    let errors = ConfigValidator::new().validate(&mut config);
    assert!(errors.contains(
        &"Duplicate entity conceptAlias detected \"EVENT\". conceptAliases are not case sensitive."
            .to_string()
    ));
}

#[test]
fn invalid_attribute_uri_is_rejected() {
    let mut config = event_sample_config();
    config.entities[0].attributes[1].uri = "urn:loc ality!".to_string();

    let errors = ConfigValidator::new().validate(&mut config);
    assert!(errors.iter().any(|e| e.starts_with(
        "Invalid Attribute uri \"urn:loc ality!\" found in entity \"Event\""
    )));
}

#[test]
fn worksheet_entity_without_unique_key_is_rejected() {
    let mut config = event_sample_config();
    config.entities[0].unique_key = None;

    let errors = ConfigValidator::new().validate(&mut config);
    assert!(!errors.is_empty());
}

#[test]
fn child_with_unknown_parent_is_rejected() {
    let mut config = event_sample_config();
    config.entities[1].parent_entity = Some("Station".to_string());

    let errors = ConfigValidator::new().validate(&mut config);
    assert!(errors
        .contains(&"Entity \"Sample\" specifies a parent entity that does not exist".to_string()));
}

#[test]
fn child_parent_key_attribute_must_share_the_parent_uri() {
    let mut config = parse(
        r#"{
        "entities": [
            {
                "conceptAlias": "Event",
                "conceptURI": "urn:Event",
                "uniqueKey": "eventID",
                "worksheet": "Events",
                "attributes": [{"column": "eventID", "uri": "urn:eventID"}],
                "rules": []
            },
            {
                "type": "ChildEntity",
                "conceptAlias": "Sample",
                "conceptURI": "urn:Sample",
                "parentEntity": "Event",
                "uniqueKey": "materialSampleID",
                "attributes": [
                    {"column": "materialSampleID", "uri": "urn:materialSampleID"},
                    {"column": "eventID", "uri": "urn:stationID"}
                ],
                "rules": []
            }
        ],
        "lists": []
    }"#,
    );

    let errors = ConfigValidator::new().validate(&mut config);
    assert!(errors.iter().any(|e| e.contains(
        "the attribute for the parent entity uniqueKey: \"eventID\" has a different uri: \"urn:stationID\""
    )));
}

#[test]
fn datetime_attributes_require_a_data_format() {
    let mut config = event_sample_config();
    config.entities[0].attributes[2].data_format = None;

    let errors = ConfigValidator::new().validate(&mut config);
    assert!(!errors.is_empty());
}

#[test]
fn broken_rule_configuration_is_reported() {
    let mut config = event_sample_config();
    config = parse(&{
        let mut json: serde_json::Value =
            serde_json::from_str(&config.to_json().unwrap()).unwrap();
        json["entities"][0]["rules"] = serde_json::json!([
            {"name": "RequiredValue", "columns": ["notAColumn"], "level": "WARNING"}
        ]);
        json.to_string()
    });

    let errors = ConfigValidator::new().validate(&mut config);
    assert!(errors.iter().any(|e| e.contains(
        "Could not find Attribute for column: notAColumn in entity: Event"
    )));
}

// =============================================================================
// Project configs validated against their network
// =============================================================================

#[test]
fn project_matching_network_is_valid() {
    let network = event_sample_config();
    let mut project = event_sample_config();

    let errors = ConfigValidator::for_project(&network).validate(&mut project);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn project_cannot_add_unregistered_entities() {
    let network = event_sample_config();
    let mut project = event_sample_config();
    let mut extra = project.entities[0].clone();
    extra.concept_alias = "Photo".to_string();
    extra.worksheet = None;
    project.entities.push(extra);

    let errors = ConfigValidator::for_project(&network).validate(&mut project);
    assert!(errors
        .contains(&"Entity \"Photo\" is not a registered entity for this network".to_string()));
}

#[test]
fn project_cannot_add_unregistered_attributes() {
    let network = event_sample_config();
    let mut project = event_sample_config();
    project.entities[1]
        .attributes
        .push(voucher::Attribute::new("species", "urn:species"));

    let errors = ConfigValidator::for_project(&network).validate(&mut project);
    assert!(errors.contains(
        &"Entity \"Sample\" contains an Attribute \"urn:species\" that is not found in the network entity"
            .to_string()
    ));
}

#[test]
fn project_must_keep_applicable_network_rules() {
    let network = event_sample_config();
    let mut project = event_sample_config();
    project.entities[0].rules.clear();

    let errors = ConfigValidator::for_project(&network).validate(&mut project);
    assert!(errors.contains(
        &"Entity \"Event\" is missing a network Rule: type: \"RequiredValue\", level: \"WARNING\""
            .to_string()
    ));
}

#[test]
fn network_rule_dropping_its_only_column_no_longer_applies() {
    let network = event_sample_config();
    let mut project = event_sample_config();
    project.entities[0]
        .attributes
        .retain(|a| a.column != "locality");
    project.entities[0].rules.clear();

    let errors = ConfigValidator::for_project(&network).validate(&mut project);
    assert!(
        !errors.iter().any(|e| e.contains("missing a network Rule")),
        "{errors:?}"
    );
}
