//! Running an entity's rules against one RecordSet.

use crate::error::{Result, VoucherError};
use crate::records::RecordSet;
use crate::schema::Config;

use super::rules::RuleContext;
use super::EntityMessages;

/// The outcome of validating one RecordSet.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    messages: EntityMessages,
    has_error: bool,
}

impl ValidationReport {
    /// True when no rule failed at any level.
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    /// True when an ERROR-level rule failed; the set must not be persisted.
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn messages(&self) -> &EntityMessages {
        &self.messages
    }

    pub fn into_messages(self) -> EntityMessages {
        self.messages
    }
}

/// Validates one RecordSet against its entity's rules.
#[derive(Debug, Clone, Copy)]
pub struct RecordValidator<'a> {
    config: &'a Config,
}

impl<'a> RecordValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        RecordValidator { config }
    }

    /// Run the set's entity rules, declared plus implicit defaults. Child
    /// entities need their parent set for parent identifier checks.
    ///
    /// Failing ERROR-level rules mark the offending records, so
    /// [`RecordSet::records_to_persist`] already reflects the outcome.
    pub fn validate(
        &self,
        record_set: &mut RecordSet,
        parent: Option<&RecordSet>,
    ) -> Result<ValidationReport> {
        if record_set.entity().is_child_entity() && parent.is_none() {
            return Err(VoucherError::MissingParentRecordSet(
                record_set.concept_alias().to_string(),
            ));
        }

        let mut messages = EntityMessages::new(
            record_set.concept_alias(),
            record_set.entity().worksheet.clone(),
        );
        let expedition_code = record_set.expedition_code().map(str::to_string);

        // merging makes this a no-op for configs that already carry their
        // default rules
        let mut entity = record_set.entity().clone();
        let parent_entity = self.config.parent_entity(&entity).cloned();
        entity.add_default_rules(false, parent_entity.as_ref());
        let rules = entity.rules.clone();

        let (_, records) = record_set.entity_and_records_mut();
        let mut ctx = RuleContext {
            entity: &entity,
            records,
            parent,
            config: self.config,
            expedition_code,
        };

        let mut has_error = false;
        for rule in &rules {
            let passed = rule.run(&mut ctx, &mut messages);
            if rule.is_error(passed) {
                has_error = true;
            }
        }

        Ok(ValidationReport {
            messages,
            has_error,
        })
    }
}
