//! The batch run: every job through fetch, detect, classify and sample.

use std::path::Path;
use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::{select_jobs, validate_jobs};
use crate::detection::{DualLanguageDetector, HttpLanguageService, StatisticalDetector};
use crate::preview::TextPreviewFetcher;
use crate::services::{JobEvent, JobRunner, JobSummary};

use super::{load_jobs, RunArgs};

pub async fn cmd_run(jobs_path: Option<&Path>, args: &RunArgs) -> anyhow::Result<()> {
    let settings = args.settings();
    let jobs = select_jobs(load_jobs(jobs_path).await?, &args.only)?;
    validate_jobs(&jobs)?;

    let store = settings.open_store()?;
    let fetcher =
        TextPreviewFetcher::from_object_store(store).with_prefix(settings.preview_prefix.clone());
    let service =
        HttpLanguageService::new(settings.detection_endpoint.clone(), settings.request_timeout())?;
    let detector =
        DualLanguageDetector::new(Arc::new(service), Arc::new(StatisticalDetector::new()))
            .with_policy(settings.policy);

    let mut runner = JobRunner::new(fetcher, detector).with_workers(settings.workers);
    if let Some(seed) = args.seed {
        runner = runner.with_seed(seed);
    }

    println!(
        "{} Running {} job(s) with {} workers against {}",
        style("→").cyan(),
        jobs.len(),
        settings.workers,
        settings.detection_endpoint
    );

    let (event_tx, mut event_rx) = mpsc::channel::<JobEvent>(100);

    // Spawn event handler for UI
    let event_handler = tokio::spawn(async move {
        let mut progress: Option<ProgressBar> = None;
        while let Some(event) = event_rx.recv().await {
            match event {
                JobEvent::JobStarted {
                    job,
                    total_documents,
                } => {
                    let bar = ProgressBar::new(total_documents as u64);
                    bar.set_style(
                        ProgressStyle::with_template(
                            "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}",
                        )
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓░"),
                    );
                    bar.set_message(format!("job {}", job));
                    progress = Some(bar);
                }
                JobEvent::DocumentCompleted { document_id, .. } => {
                    if let Some(ref bar) = progress {
                        bar.set_message(document_id);
                        bar.inc(1);
                    }
                }
                JobEvent::JobCompleted { summary } => {
                    if let Some(bar) = progress.take() {
                        bar.finish_and_clear();
                    }
                    print_summary(&summary);
                }
            }
        }
        if let Some(bar) = progress {
            bar.abandon();
        }
    });

    let result = runner.run_all(&jobs, event_tx).await;
    let _ = event_handler.await;

    match result {
        Ok(summaries) => {
            println!(
                "{} {} job(s) complete",
                style("✓").green(),
                summaries.len()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", style("✗").red(), e);
            Err(e.into())
        }
    }
}

fn print_summary(summary: &JobSummary) {
    println!(
        "{} Job {}: {} documents",
        style("✓").green(),
        style(&summary.job).bold(),
        summary.total
    );
    println!("  different:        {}", summary.different);
    println!("  same as current:  {}", summary.same_as_current);
    println!("  same as expected: {}", summary.same_as_expected);
    println!("  sampled:          {}", summary.sampled);
}
