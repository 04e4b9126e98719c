//! Error taxonomy for a dataset run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::dataset::ListError;
use crate::scheduler::RunReport;
use crate::transport::TransportError;

/// Why a dataset job (or the whole run) failed.
#[derive(Debug, Error)]
pub enum EtlError {
    /// `list_files` failed for the dataset.
    #[error("dataset {dataset}: listing files failed: {source}")]
    Enumeration {
        dataset: String,
        #[source]
        source: ListError,
    },
    #[error("dataset {dataset}: cannot create directory {path}: {source}", path = .path.display())]
    DirectoryCreation {
        dataset: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The fetch never delivered a body: connect error, HTTP error status.
    #[error("dataset {dataset}: fetching {url} failed: {source}")]
    FetchInitiation {
        dataset: String,
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("dataset {dataset}: cannot open {path}: {source}", path = .path.display())]
    FileOpen {
        dataset: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The body started arriving but did not make it to disk intact.
    #[error("dataset {dataset}: copying {url} to {path} failed: {source}", path = .path.display())]
    StreamCopy {
        dataset: String,
        url: String,
        path: PathBuf,
        #[source]
        source: TransportError,
    },
    #[error("dataset {dataset}: file name {file:?} would escape the dataset directory")]
    UnsafeFileName { dataset: String, file: String },
    #[error("dataset {dataset}: aborted")]
    Aborted { dataset: String },
    #[error("worker lost: {0}")]
    WorkerLost(String),
    /// Returned by the scheduler under the `abort` policy: the first failure,
    /// plus the verdict of every job in the run.
    #[error("run aborted: {source}")]
    RunAborted {
        #[source]
        source: Box<EtlError>,
        report: RunReport,
    },
}

impl EtlError {
    /// Dataset the error belongs to, if any.
    pub fn dataset(&self) -> Option<&str> {
        match self {
            EtlError::Enumeration { dataset, .. }
            | EtlError::DirectoryCreation { dataset, .. }
            | EtlError::FetchInitiation { dataset, .. }
            | EtlError::FileOpen { dataset, .. }
            | EtlError::StreamCopy { dataset, .. }
            | EtlError::UnsafeFileName { dataset, .. }
            | EtlError::Aborted { dataset } => Some(dataset),
            EtlError::WorkerLost(_) => None,
            EtlError::RunAborted { source, .. } => source.dataset(),
        }
    }
}
