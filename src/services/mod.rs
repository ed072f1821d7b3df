//! Service layer for langaudit.
//!
//! Classification, sampling, tallying and the job runner that ties them to
//! preview fetching and detection. Usable from the CLI or as a library.

pub mod classify;
pub mod job;
pub mod sample;
pub mod tally;

pub use classify::{classify, write_buckets, ClassificationBuckets};
pub use job::{JobError, JobEvent, JobRunner, JobSummary};
pub use sample::{write_samples, Sampler, SAMPLE_SIZE};
pub use tally::{
    tally_jobs, tally_records, BucketTally, DetectorTally, TallyCounts, TallyReport,
    CORRECT_MARKER,
};
