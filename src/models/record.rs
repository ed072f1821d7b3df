//! Per-document records flowing through a job.

use serde::{Deserialize, Serialize};

use crate::config::JobConfig;

/// A row of a job's materials file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    pub id: String,
    /// Storage fingerprint of the document's text preview pages.
    pub fileurl: String,
    pub name: String,
}

/// Language codes guessed by the two detectors for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionResult {
    /// Top guess of the detection service.
    pub new_detected_language: String,
    /// Top guess of the legacy detector; empty when it declined to guess.
    pub old_detected_language: String,
}

/// Outcome of processing a single source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: String,
    pub name: String,
    pub fileurl: String,
    pub current_language: String,
    pub expected_language: String,
    pub new_detected_language: String,
    pub old_detected_language: String,
    /// Length of `text_preview` in characters.
    pub text_preview_length: usize,
    pub text_preview: String,
}

impl ResultRecord {
    /// Assemble the record for `row` under `job`.
    pub fn new(
        row: SourceRow,
        job: &JobConfig,
        text_preview: String,
        detection: DetectionResult,
    ) -> Self {
        Self {
            id: row.id,
            name: row.name,
            fileurl: row.fileurl,
            current_language: job.current_language.clone(),
            expected_language: job.expected_language.clone(),
            new_detected_language: detection.new_detected_language,
            old_detected_language: detection.old_detected_language,
            text_preview_length: text_preview.chars().count(),
            text_preview,
        }
    }
}

/// A sampled record with the reviewer's verdicts.
///
/// Samples are written in this shape with empty verdicts; a reviewer fills
/// `new_analysis` and `old_analysis` in place before the tally reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAnalysisRecord {
    #[serde(flatten)]
    pub record: ResultRecord,
    #[serde(default)]
    pub new_analysis: String,
    #[serde(default)]
    pub old_analysis: String,
}

impl From<ResultRecord> for ManualAnalysisRecord {
    fn from(record: ResultRecord) -> Self {
        Self {
            record,
            new_analysis: String::new(),
            old_analysis: String::new(),
        }
    }
}
