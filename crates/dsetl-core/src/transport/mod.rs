//! Transport seam: how dataset files and index pages are fetched.
//!
//! The scheduler only sees the [`Transport`] trait; [`CurlTransport`] is the
//! production implementation. Tests substitute in-memory transports.

mod easy;

pub use easy::{CurlOptions, CurlTransport};

use std::io::Write;
use thiserror::Error;

use crate::control::AbortToken;

/// Failure of a single fetch, classified so the scheduler can tell a fetch
/// that never started delivering from one cut short mid-body.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Nothing was delivered: bad URL, DNS, connect or TLS failure.
    #[error("request failed: {0}")]
    Connect(#[source] curl::Error),
    /// Server answered with a non-success status; no body was written.
    #[error("HTTP {0}")]
    Http(u32),
    /// Body was cut short after `received` bytes.
    #[error("transfer interrupted after {received} bytes: {source}")]
    Interrupted {
        received: u64,
        #[source]
        source: curl::Error,
    },
    /// The sink refused bytes (disk full, permission denied, ...).
    #[error("write to local file failed: {0}")]
    Write(#[source] std::io::Error),
    /// Stopped through the run's abort token.
    #[error("transfer aborted")]
    Aborted,
    #[error("response is not valid UTF-8: {0}")]
    Decode(#[source] std::string::FromUtf8Error),
}

impl TransportError {
    /// True when body bytes may already be in the sink.
    pub fn is_stream_failure(&self) -> bool {
        matches!(
            self,
            TransportError::Interrupted { .. } | TransportError::Write(_)
        )
    }
}

/// Fetches remote resources. Implementations must be usable from many worker
/// threads at once.
pub trait Transport: Send + Sync {
    /// GET `url` and stream the body into `sink`. Returns the number of body
    /// bytes delivered. Polls `abort` while the transfer runs.
    fn fetch(
        &self,
        url: &str,
        sink: &mut dyn Write,
        abort: &AbortToken,
    ) -> Result<u64, TransportError>;

    /// GET `url` and return the body as text (directory index pages).
    fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        self.fetch_text_abortable(url, &AbortToken::new())
    }

    /// [`fetch_text`](Transport::fetch_text) that stops once `abort` trips.
    fn fetch_text_abortable(
        &self,
        url: &str,
        abort: &AbortToken,
    ) -> Result<String, TransportError> {
        let mut body = Vec::new();
        self.fetch(url, &mut body, abort)?;
        String::from_utf8(body).map_err(TransportError::Decode)
    }
}
