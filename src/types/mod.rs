pub mod raw_sample;
pub mod payload;
pub mod derived_metrics;
pub mod records;
pub mod tasks;

pub use raw_sample::RawSample;
pub use payload::{PayloadError, SamplePayload};
pub use derived_metrics::{DerivedMetrics, MovementPattern, ParsePatternError};
pub use records::StoredRaw;
pub use tasks::{StoreReply, StoreTask};
