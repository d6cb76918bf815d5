//! The schema model: configs, entities, attributes and vocabulary lists.

mod attribute;
mod config;
mod entity;
mod list;
mod types;
mod updator;
mod validator;

pub use attribute::Attribute;
pub use config::Config;
pub use entity::{Entity, EntityVariant};
pub use list::{ExpeditionMetadataProperty, Field, List};
pub use types::{DataType, RecordType};
pub use updator::{ConfigUpdate, ConfigUpdator};
pub use validator::ConfigValidator;
