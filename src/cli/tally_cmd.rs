//! Tally of reviewed samples.

use std::path::Path;

use console::style;

use crate::output::write_json;
use crate::services::{tally_jobs, TallyCounts};

use super::load_jobs;

pub async fn cmd_tally(jobs_path: Option<&Path>, output: Option<&Path>) -> anyhow::Result<()> {
    let jobs = load_jobs(jobs_path).await?;
    let report = tally_jobs(&jobs)?;

    if report.entries.is_empty() {
        println!("{} No reviewed samples found", style("!").yellow());
        return Ok(());
    }

    println!(
        "{:<8} {:<16} {:>7}  {:<22} {:<22}",
        "job", "bucket", "records", "new (ok/bad/open)", "old (ok/bad/open)"
    );
    for entry in &report.entries {
        println!(
            "{:<8} {:<16} {:>7}  {:<22} {:<22}",
            entry.job,
            entry.bucket.as_str(),
            entry.records,
            counts(&entry.tally.new),
            counts(&entry.tally.old)
        );
    }

    println!();
    println!(
        "{} Detection service: {}",
        style("→").cyan(),
        accuracy(&report.total.new)
    );
    println!(
        "{} Legacy detector:   {}",
        style("→").cyan(),
        accuracy(&report.total.old)
    );

    if let Some(path) = output {
        write_json(path, &report)?;
        println!("{} Report written to {}", style("✓").green(), path.display());
    }

    Ok(())
}

fn counts(c: &TallyCounts) -> String {
    format!("{}/{}/{}", c.correct, c.incorrect, c.unannotated)
}

fn accuracy(c: &TallyCounts) -> String {
    match c.accuracy() {
        Some(ratio) => format!(
            "{} correct, {} incorrect ({:.1}%)",
            c.correct,
            c.incorrect,
            ratio * 100.0
        ),
        None => "no verdicts yet".to_string(),
    }
}
