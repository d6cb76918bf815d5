//! Query results: records fetched from storage, grouped by entity.

use indexmap::IndexMap;

use crate::schema::{Config, Entity};

use super::{Record, RecordMapper};

/// The stored records of one entity returned by a query, together with the
/// schema needed to shape them for output.
#[derive(Debug, Clone)]
pub struct QueryResult {
    entity: Entity,
    parent_entity: Option<Entity>,
    records: Vec<Record>,
}

impl QueryResult {
    pub fn new(entity: Entity, records: Vec<Record>) -> Self {
        QueryResult {
            entity,
            parent_entity: None,
            records,
        }
    }

    pub fn with_parent(mut self, parent_entity: Entity) -> Self {
        self.parent_entity = Some(parent_entity);
        self
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn parent_entity(&self) -> Option<&Entity> {
        self.parent_entity.as_ref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Shape every record as column->value maps. See [`RecordMapper`].
    pub fn get(&self, include_empty: bool, source: &[String]) -> Vec<IndexMap<String, String>> {
        let mapper = self.mapper(include_empty, source);
        self.records.iter().map(|r| mapper.map(r)).collect()
    }

    /// Like [`QueryResult::get`], but keeps the shaped rows as records.
    pub fn get_as_records(&self, include_empty: bool, source: &[String]) -> Vec<Record> {
        let mapper = self.mapper(include_empty, source);
        self.records.iter().map(|r| mapper.map_as_record(r)).collect()
    }

    fn mapper(&self, include_empty: bool, source: &[String]) -> RecordMapper {
        RecordMapper::new(
            &self.entity,
            self.parent_entity.as_ref(),
            include_empty,
            source.to_vec(),
        )
    }
}

/// Results for all entities touched by a query.
#[derive(Debug, Clone, Default)]
pub struct QueryResults {
    results: Vec<QueryResult>,
}

impl QueryResults {
    pub fn new(results: Vec<QueryResult>) -> Self {
        QueryResults { results }
    }

    pub fn results(&self) -> &[QueryResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn result(&self, concept_alias: &str) -> Option<&QueryResult> {
        self.results
            .iter()
            .find(|r| r.entity.concept_alias == concept_alias)
    }

    /// Order results deepest-child first, so joins see nearer ancestors
    /// before farther ones.
    pub fn sort_children_first(&mut self, config: &Config) {
        self.results
            .sort_by_key(|r| std::cmp::Reverse(config.ancestry_depth(&r.entity)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;

    #[test]
    fn sorts_children_first() {
        let mut event = Entity::new("Event");
        event.unique_key = Some("eventID".to_string());
        event.attributes.push(Attribute::new("eventID", "urn:eventID"));

        let mut sample = Entity::child("Sample", "Event");
        sample.unique_key = Some("materialSampleID".to_string());

        let mut tissue = Entity::child("Tissue", "Sample");
        tissue.unique_key = Some("tissueID".to_string());

        let config = Config {
            entities: vec![event.clone(), sample.clone(), tissue.clone()],
            ..Default::default()
        };

        let mut results = QueryResults::new(vec![
            QueryResult::new(event, Vec::new()),
            QueryResult::new(sample, Vec::new()),
            QueryResult::new(tissue, Vec::new()),
        ]);
        results.sort_children_first(&config);

        let aliases: Vec<&str> = results
            .results()
            .iter()
            .map(|r| r.entity().concept_alias.as_str())
            .collect();
        assert_eq!(aliases, vec!["Tissue", "Sample", "Event"]);
    }
}
