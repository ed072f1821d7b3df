//! Configuration management for langaudit.
//!
//! Runtime settings come from the environment (and CLI flags); the job list
//! comes from a jobs file discovered with the prefer crate, falling back to
//! the two built-in jobs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::FailurePolicy;

/// Default number of documents processed concurrently within a job.
pub const DEFAULT_WORKERS: usize = 8;

/// Default key prefix under which text preview pages are stored.
pub const DEFAULT_PREVIEW_PREFIX: &str = "TextPreview";

/// Default detection service endpoint.
pub const DEFAULT_DETECTION_ENDPOINT: &str = "http://localhost:8080";

/// Subfolder of a job's aggregated results holding the review samples.
pub const MANUAL_ANALYSIS_DIR: &str = "manual-analysis";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("No jobs configured")]
    NoJobs,
    #[error("Duplicate job key: {0}")]
    DuplicateKey(String),
    #[error("Unknown job: {0}")]
    UnknownJob(String),
    #[error("Job {key}: {reason}")]
    InvalidJob { key: String, reason: String },
    #[error("Job {key}: current and expected language are both '{language}'")]
    IdenticalLabels { key: String, language: String },
    #[error("No storage configured: set BUCKET_NAME or --storage-root")]
    MissingStorage,
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),
}

/// Definition of a single audit job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Short identifier, e.g. "pt".
    pub key: String,
    /// Delimited file with the job's source rows.
    pub materials_source: PathBuf,
    /// Label the documents currently carry.
    pub current_language: String,
    /// Label the documents are suspected to deserve.
    pub expected_language: String,
    /// Where the full result array is written.
    pub output_path: PathBuf,
    /// Folder for the bucket files and the manual-analysis samples.
    pub aggregated_results_folder: PathBuf,
    /// Field delimiter of the materials file.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

impl JobConfig {
    pub fn new(
        key: impl Into<String>,
        materials_source: impl Into<PathBuf>,
        current_language: impl Into<String>,
        expected_language: impl Into<String>,
        output_path: impl Into<PathBuf>,
        aggregated_results_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key: key.into(),
            materials_source: materials_source.into(),
            current_language: current_language.into(),
            expected_language: expected_language.into(),
            output_path: output_path.into(),
            aggregated_results_folder: aggregated_results_folder.into(),
            delimiter: default_delimiter(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| ConfigError::InvalidJob {
                key: self.key.clone(),
                reason: format!("delimiter '{}' is not ASCII", self.delimiter),
            })
    }

    /// Folder the review samples are written to.
    pub fn manual_analysis_folder(&self) -> PathBuf {
        self.aggregated_results_folder.join(MANUAL_ANALYSIS_DIR)
    }

    /// Check the job can be classified without double counting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidJob {
            key: self.key.clone(),
            reason: reason.to_string(),
        };

        if self.key.trim().is_empty() {
            return Err(invalid("key is empty"));
        }
        if self.current_language.trim().is_empty() {
            return Err(invalid("current_language is empty"));
        }
        if self.expected_language.trim().is_empty() {
            return Err(invalid("expected_language is empty"));
        }
        self.delimiter_byte()?;
        // Equal labels would put every matching record in two buckets.
        if self.current_language == self.expected_language {
            return Err(ConfigError::IdenticalLabels {
                key: self.key.clone(),
                language: self.current_language.clone(),
            });
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        self.materials_source = resolve_path(&self.materials_source, base_dir);
        self.output_path = resolve_path(&self.output_path, base_dir);
        self.aggregated_results_folder = resolve_path(&self.aggregated_results_folder, base_dir);
    }
}

/// The two built-in jobs: Portuguese-labeled materials suspected to be
/// Spanish, and the mirror case.
pub fn default_jobs() -> Vec<JobConfig> {
    vec![
        JobConfig::new(
            "pt",
            "materials/pt-materials.csv",
            "pt",
            "es",
            "results/pt-results.json",
            "results/pt",
        ),
        JobConfig::new(
            "es",
            "materials/es-materials.csv",
            "es",
            "pt",
            "results/es-results.json",
            "results/es",
        ),
    ]
}

/// Validate a job list as a whole.
pub fn validate_jobs(jobs: &[JobConfig]) -> Result<(), ConfigError> {
    if jobs.is_empty() {
        return Err(ConfigError::NoJobs);
    }
    let mut seen = HashSet::new();
    for job in jobs {
        job.validate()?;
        if !seen.insert(job.key.as_str()) {
            return Err(ConfigError::DuplicateKey(job.key.clone()));
        }
    }
    Ok(())
}

/// Keep only the jobs named in `keys`, in the order given.
/// An empty `keys` keeps every job.
pub fn select_jobs(jobs: Vec<JobConfig>, keys: &[String]) -> Result<Vec<JobConfig>, ConfigError> {
    if keys.is_empty() {
        return Ok(jobs);
    }
    keys.iter()
        .map(|key| {
            jobs.iter()
                .find(|job| &job.key == key)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownJob(key.clone()))
        })
        .collect()
}

/// Jobs file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsFile {
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl JobsFile {
    /// Discover a langaudit config file with prefer, or use the built-in jobs.
    pub async fn load() -> Self {
        match prefer::load("langaudit").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(file) => file,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::builtin()
                        }
                    }
                } else {
                    Self::builtin()
                }
            }
            Err(_) => Self::builtin(),
        }
    }

    /// The built-in job list, with paths relative to the working directory.
    pub fn builtin() -> Self {
        Self {
            jobs: default_jobs(),
            source_path: None,
        }
    }

    /// Load a jobs file from a specific path.
    /// Supports JSON, TOML and YAML based on file extension. Relative job
    /// paths are resolved against the file's directory.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut file: JobsFile = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        };

        file.source_path = Some(path.to_path_buf());
        if let Some(base_dir) = file.base_dir() {
            for job in &mut file.jobs {
                job.resolve_paths(&base_dir);
            }
        }
        Ok(file)
    }

    /// Directory of the file this was loaded from.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }
}

/// Resolve a path that may be relative to `base_dir`.
/// Paths starting with ~ are expanded; absolute paths are returned as-is.
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(path_str.as_ref());
    let path = Path::new(expanded.as_ref());

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Runtime settings shared by every job.
#[derive(Debug, Clone)]
pub struct Settings {
    /// S3 bucket holding the text previews.
    pub bucket: Option<String>,
    /// S3 region of `bucket`.
    pub region: Option<String>,
    /// Local directory used instead of S3 when set.
    pub storage_root: Option<PathBuf>,
    /// Key prefix of the preview pages.
    pub preview_prefix: String,
    /// Base URL of the detection service.
    pub detection_endpoint: String,
    /// Detection service request timeout in seconds.
    pub request_timeout: u64,
    /// Documents processed concurrently within a job.
    pub workers: usize,
    /// How a failing legacy detector is handled.
    pub policy: FailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            storage_root: None,
            preview_prefix: DEFAULT_PREVIEW_PREFIX.to_string(),
            detection_endpoint: DEFAULT_DETECTION_ENDPOINT.to_string(),
            request_timeout: 60,
            workers: DEFAULT_WORKERS,
            policy: FailurePolicy::default(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Open the object store holding the text previews.
    ///
    /// A local storage root wins over the bucket; S3 credentials are taken
    /// from the standard AWS environment variables.
    pub fn open_store(&self) -> Result<Arc<dyn ObjectStore>, ConfigError> {
        if let Some(ref root) = self.storage_root {
            let store = LocalFileSystem::new_with_prefix(root)?;
            return Ok(Arc::new(store));
        }

        let bucket = self.bucket.as_ref().ok_or(ConfigError::MissingStorage)?;
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(ref region) = self.region {
            builder = builder.with_region(region);
        }
        Ok(Arc::new(builder.build()?))
    }
}
