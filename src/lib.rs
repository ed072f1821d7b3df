//! langaudit - language detection audit for labeled document batches.
//!
//! Fetches a bounded text preview for every document of a job, runs a legacy
//! in-process detector and a remote detection service over it, and sorts the
//! results by how the service's guess relates to the document's current and
//! expected language labels.

#![allow(clippy::should_implement_trait)]

pub mod cli;
pub mod config;
pub mod detection;
pub mod models;
pub mod output;
pub mod preview;
pub mod services;
pub mod source;

pub use config::{ConfigError, JobConfig, JobsFile, Settings};
pub use detection::{DetectionError, DualLanguageDetector, FailurePolicy};
pub use models::{DetectionResult, ManualAnalysisRecord, ResultRecord, SourceRow};
pub use preview::{PreviewError, TextPreviewFetcher, MAX_PREVIEW_CHARS};
pub use services::{ClassificationBuckets, JobError, JobEvent, JobRunner, JobSummary, Sampler};
