//! Dataset: the RecordSets of one load, ordered parents-first.

use super::RecordSet;

/// All RecordSets being validated or persisted together.
///
/// Sets are kept in dependency order: a parent entity's set always precedes
/// the sets of its children, so validation can process each set after its
/// parent and persistence can write identifiers before references to them.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    record_sets: Vec<RecordSet>,
}

impl Dataset {
    pub fn new() -> Self {
        Dataset::default()
    }

    pub fn sets(&self) -> &[RecordSet] {
        &self.record_sets
    }

    pub fn len(&self) -> usize {
        self.record_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_sets.is_empty()
    }

    pub fn set(&self, concept_alias: &str) -> Option<&RecordSet> {
        self.record_sets
            .iter()
            .find(|s| s.concept_alias() == concept_alias)
    }

    pub fn set_mut(&mut self, concept_alias: &str) -> Option<&mut RecordSet> {
        self.record_sets
            .iter_mut()
            .find(|s| s.concept_alias() == concept_alias)
    }

    /// Insert a set, maintaining parents-first order.
    pub fn add(&mut self, record_set: RecordSet) {
        if record_set.entity().is_child_entity() {
            let parent_alias = record_set.entity().parent_entity.as_deref();
            let after_parent = parent_alias.and_then(|alias| {
                self.record_sets
                    .iter()
                    .position(|s| s.concept_alias() == alias)
            });

            match after_parent {
                // directly after the parent keeps grandchildren behind it
                Some(i) => self.record_sets.insert(i + 1, record_set),
                // parent not loaded (yet); order against it is irrelevant
                None => self.record_sets.push(record_set),
            }
            return;
        }

        // a root set goes before the first child set, so a child added
        // before its parent still ends up behind it
        let first_child = self
            .record_sets
            .iter()
            .position(|s| s.entity().is_child_entity());
        match first_child {
            Some(i) => self.record_sets.insert(i, record_set),
            None => self.record_sets.push(record_set),
        }
    }

    /// Index of the parent set of the set at `index`, if loaded.
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        let parent_alias = self.record_sets[index].entity().parent_entity.as_deref()?;
        self.record_sets
            .iter()
            .position(|s| s.concept_alias() == parent_alias)
    }

    /// Mutable access to one set together with shared access to its parent.
    pub fn set_with_parent_mut(&mut self, index: usize) -> (&mut RecordSet, Option<&RecordSet>) {
        match self.parent_index(index) {
            None => (&mut self.record_sets[index], None),
            Some(p) if p < index => {
                let (left, right) = self.record_sets.split_at_mut(index);
                (&mut right[0], Some(&left[p]))
            }
            Some(p) => {
                let (left, right) = self.record_sets.split_at_mut(p);
                (&mut left[index], Some(&right[0]))
            }
        }
    }
}

impl FromIterator<RecordSet> for Dataset {
    fn from_iter<T: IntoIterator<Item = RecordSet>>(iter: T) -> Self {
        let mut dataset = Dataset::new();
        for set in iter {
            dataset.add(set);
        }
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Entity};

    fn set_for(entity: Entity) -> RecordSet {
        RecordSet::new(entity, Vec::new(), false)
    }

    fn sample() -> Entity {
        let mut e = Entity::new("Sample");
        e.unique_key = Some("materialSampleID".to_string());
        e.attributes
            .push(Attribute::new("materialSampleID", "urn:materialSampleID"));
        e
    }

    fn tissue() -> Entity {
        let mut e = Entity::child("Tissue", "Sample");
        e.unique_key = Some("tissueID".to_string());
        e.attributes.push(Attribute::new("tissueID", "urn:tissueID"));
        e
    }

    #[test]
    fn parents_precede_children_regardless_of_add_order() {
        let mut dataset = Dataset::new();
        dataset.add(set_for(tissue()));
        dataset.add(set_for(sample()));

        let aliases: Vec<&str> = dataset.sets().iter().map(|s| s.concept_alias()).collect();
        assert_eq!(aliases, vec!["Sample", "Tissue"]);

        let mut dataset = Dataset::new();
        dataset.add(set_for(sample()));
        dataset.add(set_for(tissue()));

        let aliases: Vec<&str> = dataset.sets().iter().map(|s| s.concept_alias()).collect();
        assert_eq!(aliases, vec!["Sample", "Tissue"]);
    }

    #[test]
    fn grandchildren_stay_behind_children() {
        let mut subsample = Entity::child("SubTissue", "Tissue");
        subsample.unique_key = Some("subTissueID".to_string());

        let mut dataset = Dataset::new();
        dataset.add(set_for(sample()));
        dataset.add(set_for(tissue()));
        dataset.add(set_for(subsample));

        let aliases: Vec<&str> = dataset.sets().iter().map(|s| s.concept_alias()).collect();
        assert_eq!(aliases, vec!["Sample", "Tissue", "SubTissue"]);
    }

    #[test]
    fn parent_lookup_and_split_borrow() {
        let mut dataset = Dataset::new();
        dataset.add(set_for(sample()));
        dataset.add(set_for(tissue()));

        assert_eq!(dataset.parent_index(1), Some(0));
        assert_eq!(dataset.parent_index(0), None);

        let (child, parent) = dataset.set_with_parent_mut(1);
        assert_eq!(child.concept_alias(), "Tissue");
        assert_eq!(parent.map(|p| p.concept_alias()), Some("Sample"));
    }
}
