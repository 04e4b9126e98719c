//! Tests for the run subcommand and its config overrides.

use super::parse;
use crate::cli::commands::RunArgs;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use crate::cli::commands::settle;
use dsetl_core::config::{EtlConfig, FailurePolicy};
use dsetl_core::scheduler::{JobPhase, JobReport, JobStatus, RunReport};
use dsetl_core::EtlError;
use std::path::{Path, PathBuf};

#[test]
fn cli_parse_run_defaults() {
    match parse(&["dsetl", "run"]) {
        CliCommand::Run {
            catalog,
            output,
            jobs,
            fail_fast,
            only,
            report,
        } => {
            assert!(catalog.is_none());
            assert!(output.is_none());
            assert!(jobs.is_none());
            assert!(!fail_fast);
            assert!(only.is_empty());
            assert!(report.is_none());
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_all_flags() {
    match parse(&[
        "dsetl",
        "run",
        "--catalog",
        "/etc/dsetl/catalog.toml",
        "-o",
        "/data",
        "--jobs",
        "0",
        "--fail-fast",
        "--only",
        "alpha",
        "--only",
        "beta",
        "--report",
        "report.json",
    ]) {
        CliCommand::Run {
            catalog,
            output,
            jobs,
            fail_fast,
            only,
            report,
        } => {
            assert_eq!(catalog.as_deref(), Some(Path::new("/etc/dsetl/catalog.toml")));
            assert_eq!(output.as_deref(), Some(Path::new("/data")));
            assert_eq!(jobs, Some(0));
            assert!(fail_fast);
            assert_eq!(only, vec!["alpha", "beta"]);
            assert_eq!(report.as_deref(), Some(Path::new("report.json")));
        }
        _ => panic!("expected Run with flags"),
    }
}

#[test]
fn cli_parse_run_rejects_bad_jobs() {
    assert!(Cli::try_parse_from(["dsetl", "run", "--jobs", "many"]).is_err());
    assert!(Cli::try_parse_from(["dsetl", "run", "--jobs", "-1"]).is_err());
}

#[test]
fn log_stderr_is_global() {
    let cli = Cli::try_parse_from(["dsetl", "run", "--log-stderr"]).unwrap();
    assert!(cli.log_stderr);
    let cli = Cli::try_parse_from(["dsetl", "--log-stderr", "list"]).unwrap();
    assert!(cli.log_stderr);
    let cli = Cli::try_parse_from(["dsetl", "list"]).unwrap();
    assert!(!cli.log_stderr);
}

#[test]
fn run_options_use_config_without_flags() {
    let mut cfg = EtlConfig::default();
    cfg.max_concurrent_jobs = 3;
    cfg.output_root = Some(PathBuf::from("/srv/bls"));
    let opts = RunArgs::default().options(&cfg, PathBuf::from("."));
    assert_eq!(opts.output_root, PathBuf::from("/srv/bls"));
    assert_eq!(opts.max_concurrent_jobs, 3);
    assert_eq!(opts.failure_policy, FailurePolicy::Isolate);
}

#[test]
fn run_flags_override_config() {
    let mut cfg = EtlConfig::default();
    cfg.output_root = Some(PathBuf::from("/srv/bls"));
    let args = RunArgs {
        output: Some(PathBuf::from("/tmp/out")),
        jobs: Some(0),
        fail_fast: true,
        ..RunArgs::default()
    };
    let opts = args.options(&cfg, PathBuf::from("."));
    assert_eq!(opts.output_root, PathBuf::from("/tmp/out"));
    assert_eq!(opts.max_concurrent_jobs, 0);
    assert_eq!(opts.failure_policy, FailurePolicy::Abort);
}

fn verdict(name: &str, status: JobStatus) -> JobReport {
    JobReport {
        name: name.to_string(),
        status,
        files_written: 0,
        entries_skipped: 0,
        bytes_written: 0,
        elapsed_ms: 1,
        error: (status != JobStatus::Completed).then(|| format!("dataset {name}: stopped")),
        failed_at: (status != JobStatus::Completed).then_some(JobPhase::Pending),
    }
}

#[test]
fn aborted_run_still_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    let outcome = Err(EtlError::RunAborted {
        source: Box::new(EtlError::WorkerLost("alpha broke".into())),
        report: RunReport {
            jobs: vec![
                verdict("alpha", JobStatus::Failed),
                verdict("beta", JobStatus::Aborted),
            ],
            elapsed_ms: 5,
        },
    });

    let err = settle(outcome, Some(path.as_path())).unwrap_err();
    assert!(format!("{:#}", err).starts_with("run aborted: worker lost: alpha broke"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"alpha\""));
    assert!(text.contains("\"beta\""));
    assert!(text.contains("\"aborted\""));
}

#[test]
fn isolated_failures_fail_the_command() {
    let outcome = Ok(RunReport {
        jobs: vec![
            verdict("alpha", JobStatus::Completed),
            verdict("beta", JobStatus::Failed),
        ],
        elapsed_ms: 5,
    });
    let err = settle(outcome, None).unwrap_err();
    assert_eq!(err.to_string(), "1 of 2 dataset(s) failed");

    let ok = Ok(RunReport {
        jobs: vec![verdict("alpha", JobStatus::Completed)],
        elapsed_ms: 1,
    });
    assert!(settle(ok, None).is_ok());
}
