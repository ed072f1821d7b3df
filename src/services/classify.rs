//! Bucketing of result records by what the detection service guessed.

use std::path::Path;

use crate::models::{Bucket, ResultRecord};
use crate::output::{write_json, OutputError};

/// Records grouped by how the service's guess relates to their labels.
///
/// The buckets are independent filters over the same input, each keeping
/// input order. With distinct current and expected labels (enforced by
/// `JobConfig::validate`) every record lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationBuckets {
    pub different: Vec<ResultRecord>,
    pub same_as_current: Vec<ResultRecord>,
    pub same_as_expected: Vec<ResultRecord>,
}

impl ClassificationBuckets {
    pub fn get(&self, bucket: Bucket) -> &[ResultRecord] {
        match bucket {
            Bucket::Different => &self.different,
            Bucket::SameAsCurrent => &self.same_as_current,
            Bucket::SameAsExpected => &self.same_as_expected,
        }
    }

    /// Buckets with their records, in [`Bucket::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &[ResultRecord])> + '_ {
        Bucket::ALL.into_iter().map(move |b| (b, self.get(b)))
    }
}

/// Whether `record` belongs to `bucket`.
pub fn matches(bucket: Bucket, record: &ResultRecord) -> bool {
    let guess = &record.new_detected_language;
    match bucket {
        Bucket::SameAsCurrent => *guess == record.current_language,
        Bucket::SameAsExpected => *guess == record.expected_language,
        Bucket::Different => {
            *guess != record.current_language && *guess != record.expected_language
        }
    }
}

/// Sort `records` into the three buckets.
pub fn classify(records: &[ResultRecord]) -> ClassificationBuckets {
    let filter = |bucket| {
        records
            .iter()
            .filter(|r| matches(bucket, r))
            .cloned()
            .collect::<Vec<_>>()
    };

    ClassificationBuckets {
        different: filter(Bucket::Different),
        same_as_current: filter(Bucket::SameAsCurrent),
        same_as_expected: filter(Bucket::SameAsExpected),
    }
}

/// Write each bucket whole to its own file under `folder`.
pub fn write_buckets(buckets: &ClassificationBuckets, folder: &Path) -> Result<(), OutputError> {
    for (bucket, records) in buckets.iter() {
        write_json(&folder.join(bucket.file_name()), records)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, guess: &str) -> ResultRecord {
        ResultRecord {
            id: id.to_string(),
            name: format!("Doc {id}"),
            fileurl: format!("f{id}"),
            current_language: "pt".to_string(),
            expected_language: "es".to_string(),
            new_detected_language: guess.to_string(),
            old_detected_language: String::new(),
            text_preview_length: 0,
            text_preview: String::new(),
        }
    }

    #[test]
    fn test_classify_by_service_guess() {
        let records = vec![
            record("1", "en"),
            record("2", "pt"),
            record("3", "es"),
            record("4", "pt"),
            record("5", ""),
        ];
        let buckets = classify(&records);

        let ids = |rs: &[ResultRecord]| rs.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&buckets.different), vec!["1", "5"]);
        assert_eq!(ids(&buckets.same_as_current), vec!["2", "4"]);
        assert_eq!(ids(&buckets.same_as_expected), vec!["3"]);
    }

    #[test]
    fn test_membership_rules_hold_for_every_record() {
        let records: Vec<_> = ["pt", "es", "en", "fr", "PT", ""]
            .iter()
            .enumerate()
            .map(|(i, g)| record(&i.to_string(), g))
            .collect();
        let buckets = classify(&records);

        for r in &records {
            let current = r.new_detected_language == r.current_language;
            let expected = r.new_detected_language == r.expected_language;
            assert_eq!(buckets.same_as_current.contains(r), current);
            assert_eq!(buckets.same_as_expected.contains(r), expected);
            assert_eq!(buckets.different.contains(r), !current && !expected);
        }
    }

    #[test]
    fn test_empty_input() {
        let buckets = classify(&[]);
        assert!(buckets.iter().all(|(_, records)| records.is_empty()));
    }

    #[test]
    fn test_write_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let buckets = classify(&[record("1", "en"), record("2", "es")]);
        write_buckets(&buckets, dir.path()).unwrap();

        let different: Vec<ResultRecord> =
            crate::output::read_json(&dir.path().join("different.json")).unwrap();
        assert_eq!(different, buckets.different);
        let current: Vec<ResultRecord> =
            crate::output::read_json(&dir.path().join("same-as-current.json")).unwrap();
        assert!(current.is_empty());
        assert!(dir.path().join("same-as-expected.json").exists());
    }
}
