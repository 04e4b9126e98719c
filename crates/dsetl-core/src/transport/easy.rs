//! libcurl easy-handle transport. One handle per transfer; each call blocks
//! the calling worker thread until the transfer completes or fails.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::time::Duration;

use super::{Transport, TransportError};
use crate::control::AbortToken;

/// Per-handle curl settings (from the `[transport]` config section).
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlOptions {
    /// Connect timeout; `None` leaves the libcurl default in place.
    pub connect_timeout: Option<Duration>,
    /// Receive buffer size in bytes; `None` = libcurl default.
    pub buffer_size: Option<usize>,
}

/// Production transport backed by the `curl` crate.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlOptions,
}

impl CurlTransport {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    fn handle(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        // HTTP >= 400 fails the transfer before any body reaches the sink.
        easy.fail_on_error(true)?;
        easy.progress(true)?;
        if let Some(timeout) = self.opts.connect_timeout {
            easy.connect_timeout(timeout)?;
        }
        if let Some(sz) = self.opts.buffer_size {
            easy.buffer_size(sz)?;
        }
        Ok(easy)
    }
}

impl Transport for CurlTransport {
    fn fetch(
        &self,
        url: &str,
        sink: &mut dyn Write,
        abort: &AbortToken,
    ) -> Result<u64, TransportError> {
        let received = Cell::new(0u64);
        let sink_error: RefCell<Option<std::io::Error>> = RefCell::new(None);

        let mut easy = self.handle(url).map_err(TransportError::Connect)?;
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match sink.write_all(data) {
                    Ok(()) => {
                        received.set(received.get() + data.len() as u64);
                        Ok(data.len())
                    }
                    Err(e) => {
                        tracing::warn!("local write failed: {}", e);
                        sink_error.borrow_mut().replace(e);
                        Ok(0) // abort transfer
                    }
                })
                .map_err(TransportError::Connect)?;
            transfer
                .progress_function(|_, _, _, _| !abort.is_tripped())
                .map_err(TransportError::Connect)?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if e.is_aborted_by_callback() && abort.is_tripped() {
                return Err(TransportError::Aborted);
            }
            if e.is_write_error() {
                if let Some(io_err) = sink_error.into_inner() {
                    return Err(TransportError::Write(io_err));
                }
            }
            if e.is_http_returned_error() {
                let code = easy.response_code().unwrap_or(0);
                return Err(TransportError::Http(code));
            }
            if received.get() > 0 || e.is_partial_file() || e.is_recv_error() {
                return Err(TransportError::Interrupted {
                    received: received.get(),
                    source: e,
                });
            }
            return Err(TransportError::Connect(e));
        }

        let code = easy.response_code().map_err(TransportError::Connect)?;
        // Non-HTTP schemes (file://) report 0.
        if code != 0 && !(200..300).contains(&code) {
            return Err(TransportError::Http(code));
        }
        Ok(received.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_is_connect_error() {
        let transport = CurlTransport::default();
        let mut sink = Vec::new();
        let err = transport
            .fetch("notascheme://", &mut sink, &AbortToken::new())
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn tripped_token_aborts_before_body() {
        // Port 9 (discard) on loopback is almost never open; either the
        // connect fails or the progress callback aborts. Neither may deliver bytes.
        let transport = CurlTransport::new(CurlOptions {
            connect_timeout: Some(Duration::from_secs(2)),
            buffer_size: None,
        });
        let abort = AbortToken::new();
        abort.trip();
        let mut sink = Vec::new();
        let err = transport
            .fetch("http://127.0.0.1:9/x", &mut sink, &abort)
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Aborted | TransportError::Connect(_)
        ));
        assert!(sink.is_empty());
    }
}
