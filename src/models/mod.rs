//! Data models for langaudit.

mod bucket;
mod record;

pub use bucket::Bucket;
pub use record::{DetectionResult, ManualAnalysisRecord, ResultRecord, SourceRow};
