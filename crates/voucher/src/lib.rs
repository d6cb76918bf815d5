//! Voucher: schema-driven validation for structured biodiversity datasets.
//!
//! A project's data model is described by a [`Config`]: a set of entities
//! (sampling events, samples, tissues) with typed attributes, vocabulary
//! lists, and declarative validation rules. Voucher validates the config
//! itself, then validates datasets against it, accumulating every finding
//! instead of stopping at the first.
//!
//! # Core Principles
//!
//! - **Declarative**: Rules live in the config document, not in code
//! - **Exhaustive**: A validation pass reports everything wrong, at ERROR
//!   and WARNING levels
//! - **Hierarchical**: Child entities join to their parents through unique
//!   keys, down an arbitrary ancestry chain
//!
//! # Example
//!
//! ```no_run
//! use voucher::{Config, Dataset, DatasetValidator};
//!
//! let config = Config::from_json(&std::fs::read_to_string("project.json").unwrap()).unwrap();
//! let mut dataset = Dataset::new();
//!
//! let report = DatasetValidator::new(&config).validate(&mut dataset).unwrap();
//! for messages in report.messages() {
//!     println!("{}: {:?}", messages.concept_alias(), messages.error_messages());
//! }
//! ```

pub mod error;
pub mod records;
pub mod schema;
pub mod validation;

pub use error::{Result, VoucherError};
pub use records::{Dataset, Record, RecordJoiner, RecordMapper, RecordSet};
pub use schema::{Attribute, Config, ConfigUpdator, ConfigValidator, Entity};
pub use validation::{DatasetReport, DatasetValidator, EntityMessages, RecordValidator};
