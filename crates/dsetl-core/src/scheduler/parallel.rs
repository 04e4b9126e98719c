//! Fan-out / fan-in over dataset jobs.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::config::FailurePolicy;
use crate::control::AbortToken;
use crate::dataset::DatasetJob;
use crate::transport::Transport;
use crate::EtlError;

use super::report::{Completion, JobFailure, JobPhase, RunReport, TransferStats};
use super::worker::{run_job, WorkerContext};
use super::RunOptions;

type Queue = Arc<Mutex<VecDeque<Arc<dyn DatasetJob>>>>;

/// Run every job concurrently and block until each one has reported back.
///
/// With `max_concurrent_jobs == 0` (or at least as many slots as jobs) each job
/// gets its own thread; otherwise a pool of that many threads pulls jobs from
/// a queue. Under [`FailurePolicy::Isolate`] the report lists every outcome and
/// the call succeeds. Under [`FailurePolicy::Abort`] the first failure trips
/// the abort token, remaining jobs report `aborted`, and the call returns
/// [`EtlError::RunAborted`] once all workers have been joined.
pub fn run_datasets(
    jobs: Vec<Arc<dyn DatasetJob>>,
    transport: Arc<dyn Transport>,
    opts: &RunOptions,
) -> Result<RunReport, EtlError> {
    let started = Instant::now();
    let count = jobs.len();
    let abort = AbortToken::new();
    let ctx = Arc::new(WorkerContext {
        output_root: opts.output_root.clone(),
        buffer_bytes: opts.buffer_bytes,
        abort: abort.clone(),
    });
    if count == 0 {
        tracing::info!("no datasets selected");
        return Ok(RunReport::default());
    }

    let (tx, rx) = mpsc::channel::<Completion>();
    let handles = if opts.max_concurrent_jobs == 0 || opts.max_concurrent_jobs >= count {
        tracing::info!("starting {} dataset(s), one thread each", count);
        spawn_per_job(jobs, &transport, &ctx, &tx)
    } else {
        tracing::info!(
            "starting {} dataset(s), at most {} at a time",
            count,
            opts.max_concurrent_jobs
        );
        spawn_pool(jobs, opts.max_concurrent_jobs, &transport, &ctx, &tx)
    };
    drop(tx);

    let mut reports = Vec::with_capacity(count);
    let mut first_failure: Option<EtlError> = None;
    let mut lost: Option<String> = None;
    let mut to_receive = count;
    while to_receive > 0 {
        let completion = match rx.recv() {
            Ok(c) => c,
            Err(_) => {
                lost = Some(format!(
                    "{} dataset(s) never reported back (worker may have panicked)",
                    to_receive
                ));
                break;
            }
        };
        to_receive -= 1;
        tracing::info!("completed: {}", completion.dataset);
        let (report, error) = completion.into_report();
        reports.push(report);
        if let Some(error) = error {
            if opts.failure_policy == FailurePolicy::Abort
                && first_failure.is_none()
                && !matches!(error, EtlError::Aborted { .. })
            {
                tracing::warn!("aborting run after failure: {}", error);
                abort.trip();
                first_failure = Some(error);
            }
        }
    }

    for h in handles {
        if let Err(e) = h.join() {
            lost.get_or_insert_with(|| format!("worker panicked: {:?}", e));
        }
    }

    let report = RunReport {
        jobs: reports,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    tracing::info!(
        "run finished: {} completed, {} failed, {} aborted in {} ms",
        report.completed().len(),
        report.failed().len(),
        report.aborted(),
        report.elapsed_ms
    );
    if let Some(source) = first_failure {
        return Err(EtlError::RunAborted {
            source: Box::new(source),
            report,
        });
    }
    if let Some(detail) = lost {
        return Err(EtlError::WorkerLost(detail));
    }
    Ok(report)
}

/// Unbounded: one thread per job.
fn spawn_per_job(
    jobs: Vec<Arc<dyn DatasetJob>>,
    transport: &Arc<dyn Transport>,
    ctx: &Arc<WorkerContext>,
    tx: &mpsc::Sender<Completion>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(jobs.len());
    for job in jobs {
        let name = job.name().to_string();
        let transport = Arc::clone(transport);
        let ctx = Arc::clone(ctx);
        let worker_tx = tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("dsetl-{}", name))
            .spawn(move || {
                let _ = worker_tx.send(run_job(job.as_ref(), transport.as_ref(), &ctx));
            });
        match spawned {
            Ok(h) => handles.push(h),
            Err(e) => {
                // Keep the one-completion-per-job count intact.
                let _ = tx.send(Completion {
                    dataset: name.clone(),
                    stats: TransferStats::default(),
                    result: Err(JobFailure {
                        phase: JobPhase::Pending,
                        error: EtlError::WorkerLost(format!(
                            "cannot start thread for {}: {}",
                            name, e
                        )),
                    }),
                });
            }
        }
    }
    handles
}

/// Bounded: `workers` threads draining a shared queue.
fn spawn_pool(
    jobs: Vec<Arc<dyn DatasetJob>>,
    workers: usize,
    transport: &Arc<dyn Transport>,
    ctx: &Arc<WorkerContext>,
    tx: &mpsc::Sender<Completion>,
) -> Vec<JoinHandle<()>> {
    let work: Queue = Arc::new(Mutex::new(jobs.into_iter().collect()));
    let mut handles = Vec::with_capacity(workers);
    for i in 0..workers {
        let work = Arc::clone(&work);
        let transport = Arc::clone(transport);
        let ctx = Arc::clone(ctx);
        let tx = tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("dsetl-worker-{}", i))
            .spawn(move || loop {
                let job = match work.lock() {
                    Ok(mut q) => q.pop_front(),
                    Err(poisoned) => poisoned.into_inner().pop_front(),
                };
                let Some(job) = job else { break };
                if tx
                    .send(run_job(job.as_ref(), transport.as_ref(), &ctx))
                    .is_err()
                {
                    break;
                }
            });
        match spawned {
            Ok(h) => handles.push(h),
            Err(e) => tracing::warn!("cannot start worker {}: {}", i, e),
        }
    }
    handles
}
