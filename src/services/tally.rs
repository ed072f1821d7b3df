//! Tally of reviewer verdicts in the manual-analysis samples.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::JobConfig;
use crate::models::{Bucket, ManualAnalysisRecord};
use crate::output::{read_json, OutputError};

/// Verdict a reviewer writes for a correct guess.
pub const CORRECT_MARKER: &str = "Correto";

/// Verdict counts for one detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TallyCounts {
    pub correct: usize,
    pub incorrect: usize,
    /// Records the reviewer has not judged yet.
    pub unannotated: usize,
}

impl TallyCounts {
    fn record(&mut self, verdict: &str) {
        if verdict == CORRECT_MARKER {
            self.correct += 1;
        } else if verdict.trim().is_empty() {
            self.unannotated += 1;
        } else {
            self.incorrect += 1;
        }
    }

    fn add(&mut self, other: &TallyCounts) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.unannotated += other.unannotated;
    }

    /// Share of judged records marked correct.
    pub fn accuracy(&self) -> Option<f64> {
        let judged = self.correct + self.incorrect;
        (judged > 0).then(|| self.correct as f64 / judged as f64)
    }
}

/// Counts for the detection service (`new`) and the legacy detector (`old`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectorTally {
    pub new: TallyCounts,
    pub old: TallyCounts,
}

impl DetectorTally {
    fn add(&mut self, other: &DetectorTally) {
        self.new.add(&other.new);
        self.old.add(&other.old);
    }
}

/// Tally of one job's sample of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketTally {
    pub job: String,
    pub bucket: Bucket,
    pub records: usize,
    pub tally: DetectorTally,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TallyReport {
    pub entries: Vec<BucketTally>,
    pub total: DetectorTally,
}

/// Count the verdicts of a set of reviewed records.
pub fn tally_records(records: &[ManualAnalysisRecord]) -> DetectorTally {
    let mut tally = DetectorTally::default();
    for record in records {
        tally.new.record(&record.new_analysis);
        tally.old.record(&record.old_analysis);
    }
    tally
}

/// Read back every job's reviewed samples and count the verdicts.
///
/// A sample file that does not exist is skipped; one that does not parse
/// is an error.
pub fn tally_jobs(jobs: &[JobConfig]) -> Result<TallyReport, OutputError> {
    let mut report = TallyReport::default();

    for job in jobs {
        let folder = job.manual_analysis_folder();
        for bucket in Bucket::ALL {
            let path = folder.join(bucket.file_name());
            if !path.exists() {
                warn!("No sample for job {} bucket {}: {}", job.key, bucket, path.display());
                continue;
            }

            let records: Vec<ManualAnalysisRecord> = read_json(&path)?;
            let tally = tally_records(&records);
            info!(
                "Job {} {}: new {}/{} correct, old {}/{} correct",
                job.key,
                bucket,
                tally.new.correct,
                records.len(),
                tally.old.correct,
                records.len()
            );

            report.total.add(&tally);
            report.entries.push(BucketTally {
                job: job.key.clone(),
                bucket,
                records: records.len(),
                tally,
            });
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultRecord;
    use crate::output::write_json;

    fn reviewed(new: &str, old: &str) -> ManualAnalysisRecord {
        ManualAnalysisRecord {
            record: ResultRecord {
                id: "1".to_string(),
                name: "Doc".to_string(),
                fileurl: "f".to_string(),
                current_language: "pt".to_string(),
                expected_language: "es".to_string(),
                new_detected_language: "es".to_string(),
                old_detected_language: "pt".to_string(),
                text_preview_length: 0,
                text_preview: String::new(),
            },
            new_analysis: new.to_string(),
            old_analysis: old.to_string(),
        }
    }

    #[test]
    fn test_counts_literal_marker_only() {
        let tally = tally_records(&[
            reviewed("Correto", "Errado"),
            reviewed("correto", "Correto"),
            reviewed("Correto", ""),
            reviewed("", "Correto "),
        ]);
        assert_eq!(
            tally.new,
            TallyCounts {
                correct: 2,
                incorrect: 1,
                unannotated: 1,
            }
        );
        assert_eq!(
            tally.old,
            TallyCounts {
                correct: 1,
                incorrect: 2,
                unannotated: 1,
            }
        );
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(TallyCounts::default().accuracy(), None);
        let counts = TallyCounts {
            correct: 3,
            incorrect: 1,
            unannotated: 10,
        };
        assert_eq!(counts.accuracy(), Some(0.75));
    }

    #[test]
    fn test_tally_jobs_reads_samples_across_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let pt = JobConfig::new("pt", "pt.csv", "pt", "es", "pt.json", dir.path().join("pt"));
        let es = JobConfig::new("es", "es.csv", "es", "pt", "es.json", dir.path().join("es"));

        write_json(
            &pt.manual_analysis_folder().join(Bucket::Different.file_name()),
            &vec![reviewed("Correto", "Correto"), reviewed("Errado", "Correto")],
        )
        .unwrap();
        write_json(
            &es.manual_analysis_folder().join(Bucket::SameAsExpected.file_name()),
            &vec![reviewed("Correto", "")],
        )
        .unwrap();

        let report = tally_jobs(&[pt, es]).unwrap();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].job, "pt");
        assert_eq!(report.entries[0].bucket, Bucket::Different);
        assert_eq!(report.entries[1].job, "es");
        assert_eq!(report.total.new.correct, 2);
        assert_eq!(report.total.new.incorrect, 1);
        assert_eq!(report.total.old.correct, 2);
        assert_eq!(report.total.old.unannotated, 1);
    }

    #[test]
    fn test_tally_rejects_malformed_sample() {
        let dir = tempfile::tempdir().unwrap();
        let job = JobConfig::new("pt", "pt.csv", "pt", "es", "pt.json", dir.path());
        let path = job.manual_analysis_folder().join(Bucket::Different.file_name());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"[{"id": 1}]"#).unwrap();
        assert!(tally_jobs(&[job]).is_err());
    }
}
