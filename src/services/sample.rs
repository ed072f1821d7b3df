//! Random samples of each bucket for manual review.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::classify::ClassificationBuckets;
use crate::models::{Bucket, ManualAnalysisRecord};
use crate::output::{write_json, OutputError};

/// Records drawn from each bucket.
pub const SAMPLE_SIZE: usize = 25;

/// Draws bounded random subsets.
///
/// The default random source is seeded from the OS, so samples differ from
/// run to run; tests inject a seeded generator with [`Sampler::with_rng`].
pub struct Sampler<R = StdRng> {
    rng: R,
    size: usize,
}

impl Sampler<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Sampler<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Sampler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            size: SAMPLE_SIZE,
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Shuffle a copy of `items` and keep the first `min(size, len)`.
    pub fn sample<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut pool = items.to_vec();
        pool.shuffle(&mut self.rng);
        pool.truncate(self.size);
        pool
    }

    /// Sample every bucket independently, ready for review.
    pub fn sample_buckets(
        &mut self,
        buckets: &ClassificationBuckets,
    ) -> Vec<(Bucket, Vec<ManualAnalysisRecord>)> {
        Bucket::ALL
            .into_iter()
            .map(|bucket| {
                let picked = self
                    .sample(buckets.get(bucket))
                    .into_iter()
                    .map(ManualAnalysisRecord::from)
                    .collect();
                (bucket, picked)
            })
            .collect()
    }
}

/// Write each bucket's sample to its own file under `folder`.
pub fn write_samples(
    samples: &[(Bucket, Vec<ManualAnalysisRecord>)],
    folder: &Path,
) -> Result<(), OutputError> {
    for (bucket, records) in samples {
        write_json(&folder.join(bucket.file_name()), records)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultRecord;

    fn records(n: usize, guess: &str) -> Vec<ResultRecord> {
        (0..n)
            .map(|i| ResultRecord {
                id: i.to_string(),
                name: format!("Doc {i}"),
                fileurl: format!("f{i}"),
                current_language: "pt".to_string(),
                expected_language: "es".to_string(),
                new_detected_language: guess.to_string(),
                old_detected_language: "pt".to_string(),
                text_preview_length: 0,
                text_preview: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_sample_size_is_bounded() {
        let mut sampler = Sampler::seeded(7);
        for n in [0, 1, 24, 25, 26, 100] {
            let items: Vec<usize> = (0..n).collect();
            assert_eq!(sampler.sample(&items).len(), n.min(SAMPLE_SIZE), "n = {n}");
        }
    }

    #[test]
    fn test_sample_is_subset_without_repeats() {
        let mut sampler = Sampler::seeded(42);
        let items: Vec<usize> = (0..200).collect();
        let picked = sampler.sample(&items);
        let unique: std::collections::HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), picked.len());
        assert!(picked.iter().all(|p| items.contains(p)));
    }

    #[test]
    fn test_seeded_sampler_is_reproducible() {
        let items: Vec<usize> = (0..100).collect();
        let a = Sampler::seeded(3).sample(&items);
        let b = Sampler::seeded(3).sample(&items);
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_bucket_is_kept_whole() {
        let items = vec!["a", "b", "c"];
        let mut picked = Sampler::new().sample(&items);
        picked.sort();
        assert_eq!(picked, items);
    }

    #[test]
    fn test_sample_buckets_writes_reviewable_records() {
        let mut all = records(30, "en");
        all.extend(records(3, "pt"));
        let buckets = super::super::classify::classify(&all);

        let samples = Sampler::seeded(1).sample_buckets(&buckets);
        let sizes: Vec<_> = samples.iter().map(|(b, s)| (*b, s.len())).collect();
        assert_eq!(
            sizes,
            vec![
                (Bucket::Different, 25),
                (Bucket::SameAsCurrent, 3),
                (Bucket::SameAsExpected, 0),
            ]
        );
        for (bucket, sample) in &samples {
            for manual in sample {
                assert!(buckets.get(*bucket).contains(&manual.record));
                assert!(manual.new_analysis.is_empty());
                assert!(manual.old_analysis.is_empty());
            }
        }

        let dir = tempfile::tempdir().unwrap();
        write_samples(&samples, dir.path()).unwrap();
        let back: Vec<ManualAnalysisRecord> =
            crate::output::read_json(&dir.path().join("different.json")).unwrap();
        assert_eq!(back, samples[0].1);
    }
}
