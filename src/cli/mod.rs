//! Command-line interface.

mod run_cmd;
mod tally_cmd;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::{
    JobConfig, JobsFile, Settings, DEFAULT_DETECTION_ENDPOINT, DEFAULT_PREVIEW_PREFIX,
    DEFAULT_WORKERS,
};
use crate::detection::FailurePolicy;

#[derive(Parser)]
#[command(name = "langaudit")]
#[command(about = "Compare legacy and service language detection against document labels")]
#[command(version)]
pub struct Cli {
    /// Jobs file (TOML, YAML or JSON); defaults to a discovered langaudit
    /// config, then the built-in pt/es jobs
    #[arg(long, global = true)]
    jobs: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch previews, detect, classify and sample every job (the default)
    Run(RunArgs),

    /// Tally reviewer verdicts in the manual-analysis samples
    Tally {
        /// Also write the report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
pub(crate) struct RunArgs {
    /// Only run these jobs (repeatable; default: all)
    #[arg(short = 'j', long = "job")]
    only: Vec<String>,

    /// Documents processed concurrently within a job
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Record an empty legacy guess instead of failing when the legacy detector errors
    #[arg(long)]
    best_effort: bool,

    /// S3 bucket holding the text previews
    #[arg(long, env = "BUCKET_NAME")]
    bucket: Option<String>,

    /// Region of the S3 bucket
    #[arg(long, env = "BUCKET_REGION")]
    region: Option<String>,

    /// Read previews from a local directory instead of S3
    #[arg(long, env = "STORAGE_ROOT")]
    storage_root: Option<PathBuf>,

    /// Key prefix of the preview pages
    #[arg(long, env = "PREVIEW_PREFIX", default_value = DEFAULT_PREVIEW_PREFIX)]
    preview_prefix: String,

    /// Base URL of the language detection service
    #[arg(long, env = "LANGUAGE_DETECTION_URL", default_value = DEFAULT_DETECTION_ENDPOINT)]
    endpoint: String,

    /// Detection service request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Seed for reproducible samples
    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    fn settings(&self) -> Settings {
        Settings {
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            storage_root: self.storage_root.clone(),
            preview_prefix: self.preview_prefix.clone(),
            detection_endpoint: self.endpoint.clone(),
            request_timeout: self.timeout,
            workers: self.workers,
            policy: if self.best_effort {
                FailurePolicy::BestEffort
            } else {
                FailurePolicy::FailFast
            },
        }
    }
}

/// Load the job list from an explicit file or by discovery.
async fn load_jobs(path: Option<&Path>) -> anyhow::Result<Vec<JobConfig>> {
    let file = match path {
        Some(path) => JobsFile::load_from_path(path).await?,
        None => JobsFile::load().await,
    };
    if let Some(ref source) = file.source_path {
        tracing::info!("Loaded {} jobs from {}", file.jobs.len(), source.display());
    }
    Ok(file.jobs)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let jobs_path = cli.jobs.as_deref();

    match cli.command.unwrap_or(Commands::Run(cli.run)) {
        Commands::Run(args) => run_cmd::cmd_run(jobs_path, &args).await,
        Commands::Tally { output } => tally_cmd::cmd_tally(jobs_path, output.as_deref()).await,
    }
}
