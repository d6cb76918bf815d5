//! Records, record sets and the dataset pipeline around them.

mod dataset;
mod joiner;
mod mapper;
mod query;
mod record;
mod record_set;

pub use dataset::Dataset;
pub use joiner::RecordJoiner;
pub use mapper::{IdentifierBuilder, RecordMapper};
pub use query::{QueryResult, QueryResults};
pub use record::{Record, RecordMetadata};
pub use record_set::{content_hash, RecordSet};
