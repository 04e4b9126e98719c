//! Dataset scheduler: one worker per dataset job, results gathered over a
//! channel into a [`RunReport`].

mod parallel;
mod report;
mod sink;
mod worker;

pub use parallel::run_datasets;
pub use report::{Completion, JobFailure, JobPhase, JobReport, JobStatus, RunReport, TransferStats};

use std::path::PathBuf;

use crate::config::{EtlConfig, FailurePolicy};
use crate::storage::DEFAULT_BUFFER_BYTES;

/// Per-run scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Parent of the per-dataset directories.
    pub output_root: PathBuf,
    /// 0 = one thread per dataset.
    pub max_concurrent_jobs: usize,
    pub failure_policy: FailurePolicy,
    /// Write buffer for each local file.
    pub buffer_bytes: usize,
}

impl RunOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            max_concurrent_jobs: EtlConfig::default().max_concurrent_jobs,
            failure_policy: FailurePolicy::default(),
            buffer_bytes: DEFAULT_BUFFER_BYTES,
        }
    }

    /// Settings from config; `output_root` falls back to `default_root`.
    pub fn from_config(cfg: &EtlConfig, default_root: PathBuf) -> Self {
        Self {
            output_root: cfg.output_root.clone().unwrap_or(default_root),
            max_concurrent_jobs: cfg.max_concurrent_jobs,
            failure_policy: cfg.failure_policy,
            buffer_bytes: cfg.transport.write_buffer_bytes(),
        }
    }
}
