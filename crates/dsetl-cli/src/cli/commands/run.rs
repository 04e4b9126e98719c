//! `dsetl run` – download the selected datasets.

use anyhow::{bail, Result};
use dsetl_core::config::{EtlConfig, FailurePolicy};
use dsetl_core::scheduler::{self, JobStatus, RunOptions, RunReport};
use dsetl_core::transport::{CurlTransport, Transport};
use dsetl_core::EtlError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::load_catalog;

#[derive(Debug, Default)]
pub struct RunArgs {
    pub catalog: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub fail_fast: bool,
    pub only: Vec<String>,
    pub report: Option<PathBuf>,
}

impl RunArgs {
    /// Config values with command-line overrides applied.
    pub fn options(&self, cfg: &EtlConfig, cwd: PathBuf) -> RunOptions {
        let mut opts = RunOptions::from_config(cfg, cwd);
        if let Some(dir) = &self.output {
            opts.output_root = dir.clone();
        }
        if let Some(n) = self.jobs {
            opts.max_concurrent_jobs = n;
        }
        if self.fail_fast {
            opts.failure_policy = FailurePolicy::Abort;
        }
        opts
    }
}

pub async fn run_etl(cfg: &EtlConfig, args: RunArgs) -> Result<()> {
    let catalog = load_catalog(cfg, args.catalog.as_deref())?.select(&args.only)?;
    let opts = args.options(cfg, std::env::current_dir()?);
    let transport: Arc<dyn Transport> =
        Arc::new(CurlTransport::new(cfg.transport.curl_options()));
    let jobs = catalog.into_jobs(Arc::clone(&transport));

    println!(
        "Downloading {} dataset(s) into {}",
        jobs.len(),
        opts.output_root.display()
    );
    let outcome = tokio::task::spawn_blocking(move || {
        scheduler::run_datasets(jobs, transport, &opts)
    })
    .await?;
    settle(outcome, args.report.as_deref())
}

/// Print the summary and write the report for finished and aborted runs alike,
/// then turn failures into an error.
pub(crate) fn settle(
    outcome: Result<RunReport, EtlError>,
    report_path: Option<&Path>,
) -> Result<()> {
    let (report, aborted_by) = match outcome {
        Ok(report) => (report, None),
        Err(EtlError::RunAborted { source, report }) => (report, Some(*source)),
        Err(e) => return Err(e.into()),
    };

    print_summary(&report);
    if let Some(path) = report_path {
        report.write_json(path)?;
        println!("Report written to {}", path.display());
    }
    if let Some(first) = aborted_by {
        return Err(anyhow::Error::new(first).context("run aborted"));
    }
    let failed = report.failed().len();
    if failed > 0 {
        bail!("{} of {} dataset(s) failed", failed, report.jobs.len());
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    if report.jobs.is_empty() {
        println!("No datasets selected.");
        return;
    }
    println!(
        "{:<44} {:<10} {:>6} {:>14}",
        "DATASET", "STATUS", "FILES", "BYTES"
    );
    for j in &report.jobs {
        let status = match j.status {
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Aborted => "aborted",
        };
        println!(
            "{:<44} {:<10} {:>6} {:>14}",
            j.name, status, j.files_written, j.bytes_written
        );
        if let Some(err) = &j.error {
            println!("    {}", err);
        }
    }
    println!(
        "{} completed, {} failed, {} aborted; {} file(s), {:.1} MiB in {:.1}s",
        report.completed().len(),
        report.failed().len(),
        report.aborted(),
        report.total_files(),
        report.total_bytes() as f64 / 1_048_576.0,
        report.elapsed_ms as f64 / 1000.0
    );
}
