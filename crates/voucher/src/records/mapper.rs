//! Shaping stored records into column-keyed output rows.

use indexmap::IndexMap;

use crate::schema::Entity;

use super::Record;

/// Builds the persistent identifier for an output row: the record's root
/// identifier suffixed with its local identifier value.
///
/// Hashed entities have generated local identifiers with no meaning to
/// users, so their rows are identified through the parent's key instead.
#[derive(Debug, Clone)]
pub struct IdentifierBuilder {
    identifier_uri: Option<String>,
}

impl IdentifierBuilder {
    pub fn new(entity: &Entity, parent_entity: Option<&Entity>) -> Self {
        let identifier_uri = if entity.hashed {
            parent_entity
                .and_then(|p| p.unique_key_uri())
                .map(str::to_string)
        } else {
            entity.unique_key_uri().map(str::to_string)
        };
        IdentifierBuilder { identifier_uri }
    }

    pub fn build(&self, record: &Record) -> String {
        let root = record.root_identifier().unwrap_or("");
        let suffix = self
            .identifier_uri
            .as_deref()
            .map(|uri| record.get(uri))
            .unwrap_or("");
        format!("{root}{suffix}")
    }
}

/// Maps a uri-keyed [`Record`] to a column-keyed row for output.
///
/// Known uris are renamed to their attribute column; unknown uris (joined
/// parent data, bookkeeping entries) pass through under their own key. A
/// non-empty `source` list restricts the row to those keys.
#[derive(Debug, Clone)]
pub struct RecordMapper {
    columns: IndexMap<String, String>,
    include_empty: bool,
    source: Vec<String>,
    identifier: IdentifierBuilder,
}

impl RecordMapper {
    pub const BCID: &'static str = "bcid";

    pub fn new(
        entity: &Entity,
        parent_entity: Option<&Entity>,
        include_empty: bool,
        source: Vec<String>,
    ) -> Self {
        let columns = entity
            .attributes
            .iter()
            .map(|a| (a.uri.clone(), a.column.clone()))
            .collect();

        RecordMapper {
            columns,
            include_empty,
            source,
            identifier: IdentifierBuilder::new(entity, parent_entity),
        }
    }

    fn include(&self, key: &str) -> bool {
        self.source.is_empty() || self.source.iter().any(|s| s == key)
    }

    pub fn map(&self, record: &Record) -> IndexMap<String, String> {
        let mut row = IndexMap::new();

        for (uri, value) in record.properties() {
            let key = self.columns.get(uri).unwrap_or(uri);
            if self.include(key) {
                row.insert(key.clone(), value.trim().to_string());
            }
        }

        if self.include_empty {
            for column in self.columns.values() {
                if self.include(column) && !row.contains_key(column) {
                    row.insert(column.clone(), String::new());
                }
            }
        }

        if let Some(code) = record.expedition_code() {
            if self.include(Record::EXPEDITION_CODE) {
                row.insert(Record::EXPEDITION_CODE.to_string(), code.to_string());
            }
        }
        if record.project_id() != 0 && self.include(Record::PROJECT_ID) {
            row.insert(Record::PROJECT_ID.to_string(), record.project_id().to_string());
        }
        if self.include(Self::BCID) {
            row.insert(Self::BCID.to_string(), self.identifier.build(record));
        }

        row
    }

    /// Shape the record while keeping it a [`Record`], for callers that
    /// stream rows onward. The result is never persisted.
    pub fn map_as_record(&self, record: &Record) -> Record {
        let mut mapped = Record::new(self.map(record))
            .with_project_id(record.project_id())
            .with_persist(false);
        if let Some(root) = record.root_identifier() {
            mapped = mapped.with_root_identifier(root);
        }
        if let Some(code) = record.expedition_code() {
            mapped = mapped.with_expedition_code(code);
        }
        mapped
    }
}
