//! The per-dataset algorithm run on a worker thread.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::control::AbortToken;
use crate::dataset::{is_safe_file_name, DatasetJob, ListError};
use crate::storage::ensure_dataset_dir;
use crate::transport::{Transport, TransportError};
use crate::EtlError;

use super::report::{Completion, JobFailure, JobPhase, TransferStats};
use super::sink::{LazyPartFile, SinkError};

/// Shared, read-only settings for every worker of one run.
pub(super) struct WorkerContext {
    pub output_root: PathBuf,
    pub buffer_bytes: usize,
    pub abort: AbortToken,
}

/// Run one dataset to completion or first failure. Always yields exactly one
/// completion signal; errors are carried inside it.
pub(super) fn run_job(
    job: &dyn DatasetJob,
    transport: &dyn Transport,
    ctx: &WorkerContext,
) -> Completion {
    let started = Instant::now();
    let mut run = JobRun {
        job,
        transport,
        ctx,
        phase: JobPhase::Pending,
        stats: TransferStats::default(),
    };
    let outcome = run.execute();
    let JobRun {
        phase, mut stats, ..
    } = run;
    stats.elapsed = started.elapsed();

    let result = match outcome {
        Ok(()) => {
            tracing::info!(
                "dataset {}: {} file(s), {} bytes in {:.1}s",
                job.name(),
                stats.files_written,
                stats.bytes_written,
                stats.elapsed.as_secs_f64()
            );
            Ok(())
        }
        Err(error) => {
            match &error {
                EtlError::Aborted { .. } => {
                    tracing::info!("dataset {}: aborted while {}", job.name(), phase)
                }
                e => tracing::warn!("{} (while {})", e, phase),
            }
            Err(JobFailure { phase, error })
        }
    };
    Completion {
        dataset: job.name().to_string(),
        stats,
        result,
    }
}

struct JobRun<'a> {
    job: &'a dyn DatasetJob,
    transport: &'a dyn Transport,
    ctx: &'a WorkerContext,
    phase: JobPhase,
    stats: TransferStats,
}

impl JobRun<'_> {
    fn dataset(&self) -> String {
        self.job.name().to_string()
    }

    fn enter(&mut self, phase: JobPhase) {
        tracing::debug!(dataset = self.job.name(), %phase, "phase");
        self.phase = phase;
    }

    fn check_abort(&self) -> Result<(), EtlError> {
        if self.ctx.abort.is_tripped() {
            return Err(EtlError::Aborted {
                dataset: self.dataset(),
            });
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), EtlError> {
        self.check_abort()?;
        tracing::info!("dataset {}: starting", self.job.name());

        self.enter(JobPhase::Listing);
        let files = self
            .job
            .list_files_abortable(&self.ctx.abort)
            .map_err(|source| match source {
                ListError::Index {
                    source: TransportError::Aborted,
                    ..
                } => EtlError::Aborted {
                    dataset: self.dataset(),
                },
                source => EtlError::Enumeration {
                    dataset: self.dataset(),
                    source,
                },
            })?;

        self.enter(JobPhase::CreatingDirectory);
        let dir = ensure_dataset_dir(&self.ctx.output_root, self.job.name()).map_err(
            |source| EtlError::DirectoryCreation {
                dataset: self.dataset(),
                path: self.ctx.output_root.join(self.job.name()),
                source,
            },
        )?;
        self.enter(JobPhase::DirectoryReady);

        for file in &files {
            if file.is_empty() {
                self.stats.entries_skipped += 1;
                continue;
            }
            self.check_abort()?;
            if !is_safe_file_name(file) {
                return Err(EtlError::UnsafeFileName {
                    dataset: self.dataset(),
                    file: file.clone(),
                });
            }
            self.enter(JobPhase::Transferring { file: file.clone() });
            let bytes = self.transfer(file, &dir)?;
            self.stats.files_written += 1;
            self.stats.bytes_written += bytes;
        }

        self.enter(JobPhase::Completed);
        Ok(())
    }

    /// Fetch one file into `<dir>/<file>`. The final name only appears once
    /// the whole body is on disk.
    fn transfer(&self, file: &str, dir: &Path) -> Result<u64, EtlError> {
        let url = self.job.file_url(file);
        let final_path = dir.join(file);
        tracing::info!("downloading: {}", url);

        let mut sink = LazyPartFile::new(&final_path, self.ctx.buffer_bytes);
        let fetched = self.transport.fetch(&url, &mut sink, &self.ctx.abort);
        match fetched {
            Ok(bytes) => match sink.finalize() {
                Ok(_) => {
                    tracing::debug!("wrote {} ({} bytes)", final_path.display(), bytes);
                    Ok(bytes)
                }
                Err(SinkError::Open(source)) => Err(EtlError::FileOpen {
                    dataset: self.dataset(),
                    path: final_path,
                    source,
                }),
                Err(SinkError::Finish(e)) => Err(EtlError::StreamCopy {
                    dataset: self.dataset(),
                    url,
                    path: final_path,
                    source: TransportError::Write(e),
                }),
            },
            Err(err) => {
                let open_error = sink.take_open_error();
                sink.discard();
                if let Some(source) = open_error {
                    return Err(EtlError::FileOpen {
                        dataset: self.dataset(),
                        path: final_path,
                        source,
                    });
                }
                Err(match err {
                    TransportError::Aborted => EtlError::Aborted {
                        dataset: self.dataset(),
                    },
                    e if e.is_stream_failure() => EtlError::StreamCopy {
                        dataset: self.dataset(),
                        url,
                        path: final_path,
                        source: e,
                    },
                    e => EtlError::FetchInitiation {
                        dataset: self.dataset(),
                        url,
                        source: e,
                    },
                })
            }
        }
    }
}
