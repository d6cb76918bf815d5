//! Dataset validation: the rule engine and the validators that drive it.

mod dataset_validator;
mod messages;
mod record_validator;
pub mod rules;

pub use dataset_validator::{DatasetReport, DatasetValidator};
pub use messages::EntityMessages;
pub use record_validator::{RecordValidator, ValidationReport};
