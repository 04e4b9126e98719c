//! Dataset jobs: the capability the scheduler consumes.
//!
//! A job knows its stable name (also its output directory), the base URL its
//! files hang off, and how to enumerate its files. Jobs are immutable once
//! built and are shared read-only across worker threads.

mod name;

pub use name::{is_safe_file_name, validate_dataset_name, NameError};

use std::sync::Arc;
use thiserror::Error;

use crate::catalog::index::parse_index;
use crate::control::AbortToken;
use crate::transport::{Transport, TransportError};

/// Why enumerating a dataset's files failed.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("fetching index {url}: {source}")]
    Index {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("{0}")]
    Other(String),
}

/// One named remote dataset.
///
/// `list_files` may return `""` entries: they stand for the index itself and
/// are skipped without any network or disk operation. File URLs are formed by
/// plain concatenation, so `base_url` carries its own trailing `/`.
pub trait DatasetJob: Send + Sync {
    fn name(&self) -> &str;

    fn base_url(&self) -> &str;

    /// Relative file names in download order. Same contents on every call.
    fn list_files(&self) -> Result<Vec<String>, ListError>;

    /// `list_files` for a run: jobs whose listing goes over the network stop
    /// it once `abort` trips. Listings that are already in memory ignore it.
    fn list_files_abortable(&self, _abort: &AbortToken) -> Result<Vec<String>, ListError> {
        self.list_files()
    }

    fn file_url(&self, file: &str) -> String {
        format!("{}{}", self.base_url(), file)
    }
}

/// Dataset whose files are spelled out in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDataset {
    name: String,
    base_url: String,
    files: Vec<String>,
}

impl StaticDataset {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            files,
        }
    }
}

impl DatasetJob for StaticDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_files(&self) -> Result<Vec<String>, ListError> {
        Ok(self.files.clone())
    }
}

/// Dataset whose files are scraped from the directory index at `base_url`.
pub struct IndexedDataset {
    name: String,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl IndexedDataset {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            transport,
        }
    }
}

impl DatasetJob for IndexedDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_files(&self) -> Result<Vec<String>, ListError> {
        self.list_files_abortable(&AbortToken::new())
    }

    fn list_files_abortable(&self, abort: &AbortToken) -> Result<Vec<String>, ListError> {
        let html = self
            .transport
            .fetch_text_abortable(&self.base_url, abort)
            .map_err(|source| ListError::Index {
                url: self.base_url.clone(),
                source,
            })?;
        parse_index(&html, &self.base_url).map_err(|e| ListError::Other(e.to_string()))
    }
}
