//! Job orchestration: rows in, classified results and review samples out.
//!
//! Emits events for progress tracking; separated from UI concerns.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info};

use super::classify::{classify, write_buckets};
use super::sample::{write_samples, Sampler, SAMPLE_SIZE};
use crate::config::{validate_jobs, ConfigError, JobConfig, DEFAULT_WORKERS};
use crate::detection::{DetectionError, DualLanguageDetector};
use crate::models::{ResultRecord, SourceRow};
use crate::output::{write_json, OutputError};
use crate::preview::{PreviewError, TextPreviewFetcher};
use crate::source::{read_source_rows, SourceError};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Document {id}: {source}")]
    Preview {
        id: String,
        #[source]
        source: PreviewError,
    },
    #[error("Document {id}: {source}")]
    Detection {
        id: String,
        #[source]
        source: DetectionError,
    },
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("Worker pool closed")]
    PoolClosed,
}

/// Events emitted while a job runs.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// Rows loaded, processing about to start
    JobStarted { job: String, total_documents: usize },
    /// One document fetched and detected
    DocumentCompleted {
        job: String,
        document_id: String,
        new_language: String,
        old_language: String,
    },
    /// All outputs written
    JobCompleted { summary: JobSummary },
}

/// Counts reported at the end of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub job: String,
    pub total: usize,
    pub different: usize,
    pub same_as_current: usize,
    pub same_as_expected: usize,
    /// Records written across the three samples.
    pub sampled: usize,
}

/// Runs audit jobs end to end.
pub struct JobRunner {
    fetcher: Arc<TextPreviewFetcher>,
    detector: Arc<DualLanguageDetector>,
    workers: usize,
    sample_size: usize,
    seed: Option<u64>,
}

impl JobRunner {
    pub fn new(fetcher: TextPreviewFetcher, detector: DualLanguageDetector) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            detector: Arc::new(detector),
            workers: DEFAULT_WORKERS,
            sample_size: SAMPLE_SIZE,
            seed: None,
        }
    }

    /// Documents processed concurrently (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Make sampling reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn sampler(&self) -> Sampler {
        let sampler = match self.seed {
            Some(seed) => Sampler::seeded(seed),
            None => Sampler::new(),
        };
        sampler.with_size(self.sample_size)
    }

    /// Run `jobs` one after another, stopping at the first failure.
    /// Outputs of jobs that completed before the failure stay in place.
    pub async fn run_all(
        &self,
        jobs: &[JobConfig],
        event_tx: mpsc::Sender<JobEvent>,
    ) -> Result<Vec<JobSummary>, JobError> {
        validate_jobs(jobs)?;

        let mut summaries = Vec::with_capacity(jobs.len());
        for job in jobs {
            summaries.push(self.run_job(job, event_tx.clone()).await?);
        }
        Ok(summaries)
    }

    /// Run a single job.
    ///
    /// Nothing is written unless every document was fetched and detected.
    pub async fn run_job(
        &self,
        job: &JobConfig,
        event_tx: mpsc::Sender<JobEvent>,
    ) -> Result<JobSummary, JobError> {
        job.validate()?;
        let rows = read_source_rows(&job.materials_source, job.delimiter_byte()?)?;

        info!(
            "Job {}: {} documents from {}",
            job.key,
            rows.len(),
            job.materials_source.display()
        );
        let _ = event_tx
            .send(JobEvent::JobStarted {
                job: job.key.clone(),
                total_documents: rows.len(),
            })
            .await;

        let records = self.process_rows(job, rows, event_tx.clone()).await?;
        write_json(&job.output_path, &records)?;

        let buckets = classify(&records);
        write_buckets(&buckets, &job.aggregated_results_folder)?;

        let samples = self.sampler().sample_buckets(&buckets);
        write_samples(&samples, &job.manual_analysis_folder())?;

        let summary = JobSummary {
            job: job.key.clone(),
            total: records.len(),
            different: buckets.different.len(),
            same_as_current: buckets.same_as_current.len(),
            same_as_expected: buckets.same_as_expected.len(),
            sampled: samples.iter().map(|(_, s)| s.len()).sum(),
        };
        info!(
            "Job {}: {} documents, {} different, {} same as current ({}), {} same as expected ({})",
            summary.job,
            summary.total,
            summary.different,
            summary.same_as_current,
            job.current_language,
            summary.same_as_expected,
            job.expected_language
        );

        let _ = event_tx
            .send(JobEvent::JobCompleted {
                summary: summary.clone(),
            })
            .await;

        Ok(summary)
    }

    /// Fetch and detect every row, returning records in row order.
    ///
    /// Rows are queued on a pool of `workers` permits. The first failure
    /// aborts the rows still queued or in flight.
    pub async fn process_rows(
        &self,
        job: &JobConfig,
        rows: Vec<SourceRow>,
        event_tx: mpsc::Sender<JobEvent>,
    ) -> Result<Vec<ResultRecord>, JobError> {
        let total = rows.len();
        let job = Arc::new(job.clone());
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, row) in rows.into_iter().enumerate() {
            let job = job.clone();
            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            let detector = self.detector.clone();
            let event_tx = event_tx.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| JobError::PoolClosed)?;

                let text = fetcher
                    .fetch(&row.fileurl)
                    .await
                    .map_err(|source| JobError::Preview {
                        id: row.id.clone(),
                        source,
                    })?;
                let detection = detector
                    .detect(&text)
                    .await
                    .map_err(|source| JobError::Detection {
                        id: row.id.clone(),
                        source,
                    })?;

                debug!(
                    "Document {}: {} chars, new '{}', old '{}'",
                    row.id,
                    text.chars().count(),
                    detection.new_detected_language,
                    detection.old_detected_language
                );
                let _ = event_tx
                    .send(JobEvent::DocumentCompleted {
                        job: job.key.clone(),
                        document_id: row.id.clone(),
                        new_language: detection.new_detected_language.clone(),
                        old_language: detection.old_detected_language.clone(),
                    })
                    .await;

                Ok::<_, JobError>((index, ResultRecord::new(row, &job, text, detection)))
            });
        }

        let mut slots: Vec<Option<ResultRecord>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((index, record))) => slots[index] = Some(record),
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(e.into());
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
