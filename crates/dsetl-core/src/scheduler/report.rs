//! Completion signals and the aggregated run report.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use crate::EtlError;

/// Where a dataset job was when it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum JobPhase {
    Pending,
    Listing,
    CreatingDirectory,
    DirectoryReady,
    Transferring { file: String },
    Completed,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobPhase::Pending => write!(f, "pending"),
            JobPhase::Listing => write!(f, "listing"),
            JobPhase::CreatingDirectory => write!(f, "creating directory"),
            JobPhase::DirectoryReady => write!(f, "directory ready"),
            JobPhase::Transferring { file } => write!(f, "transferring {}", file),
            JobPhase::Completed => write!(f, "completed"),
        }
    }
}

/// Counters accumulated by one worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub files_written: usize,
    /// `""` listing entries passed over.
    pub entries_skipped: usize,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct JobFailure {
    pub phase: JobPhase,
    pub error: EtlError,
}

/// The completion signal: emitted exactly once per dataset job.
#[derive(Debug)]
pub struct Completion {
    pub dataset: String,
    pub stats: TransferStats,
    pub result: Result<(), JobFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
    /// Stopped (or never started) because the run was aborted.
    Aborted,
}

/// Per-dataset line of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub name: String,
    pub status: JobStatus,
    pub files_written: usize,
    pub entries_skipped: usize,
    pub bytes_written: u64,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<JobPhase>,
}

impl Completion {
    /// Split into the report line and, for failures, the original error.
    pub(super) fn into_report(self) -> (JobReport, Option<EtlError>) {
        let Completion {
            dataset,
            stats,
            result,
        } = self;
        let mut report = JobReport {
            name: dataset,
            status: JobStatus::Completed,
            files_written: stats.files_written,
            entries_skipped: stats.entries_skipped,
            bytes_written: stats.bytes_written,
            elapsed_ms: stats.elapsed.as_millis() as u64,
            error: None,
            failed_at: None,
        };
        match result {
            Ok(()) => (report, None),
            Err(JobFailure { phase, error }) => {
                report.status = match error {
                    EtlError::Aborted { .. } => JobStatus::Aborted,
                    _ => JobStatus::Failed,
                };
                report.error = Some(error.to_string());
                report.failed_at = Some(phase);
                (report, Some(error))
            }
        }
    }
}

/// One entry per dataset, in completion (arrival) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub jobs: Vec<JobReport>,
    pub elapsed_ms: u64,
}

impl RunReport {
    fn with_status(&self, status: JobStatus) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(move |j| j.status == status)
    }

    pub fn completed(&self) -> Vec<&str> {
        self.with_status(JobStatus::Completed)
            .map(|j| j.name.as_str())
            .collect()
    }

    pub fn failed(&self) -> Vec<&JobReport> {
        self.with_status(JobStatus::Failed).collect()
    }

    pub fn aborted(&self) -> usize {
        self.with_status(JobStatus::Aborted).count()
    }

    pub fn is_success(&self) -> bool {
        self.jobs.iter().all(|j| j.status == JobStatus::Completed)
    }

    pub fn total_files(&self) -> usize {
        self.jobs.iter().map(|j| j.files_written).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.jobs.iter().map(|j| j.bytes_written).sum()
    }

    pub fn get(&self, name: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("create report {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("write report {}", path.display()))?;
        Ok(())
    }
}
