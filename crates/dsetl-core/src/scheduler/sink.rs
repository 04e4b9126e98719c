//! Write target for one file transfer: the `.part` file is only created once
//! the transport hands over the first body bytes, so a fetch that fails
//! before delivering anything never touches the disk.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::storage::PartFile;

pub(super) struct LazyPartFile<'a> {
    final_path: &'a Path,
    buffer_bytes: usize,
    file: Option<PartFile>,
    open_error: Option<io::Error>,
}

impl<'a> LazyPartFile<'a> {
    pub(super) fn new(final_path: &'a Path, buffer_bytes: usize) -> Self {
        Self {
            final_path,
            buffer_bytes,
            file: None,
            open_error: None,
        }
    }

    fn open(&mut self) -> io::Result<&mut PartFile> {
        if self.file.is_none() {
            match PartFile::create(self.final_path, self.buffer_bytes) {
                Ok(file) => self.file = Some(file),
                Err(e) => {
                    // The transport gets a copy; this error is reported as FileOpen.
                    let copy = io::Error::new(e.kind(), e.to_string());
                    self.open_error = Some(e);
                    return Err(copy);
                }
            }
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "part file not open"))
    }

    /// Error from creating the part file, if that is what stopped the transfer.
    pub(super) fn take_open_error(&mut self) -> Option<io::Error> {
        self.open_error.take()
    }

    /// Finish a successful transfer. An empty body still produces an (empty) file.
    pub(super) fn finalize(mut self) -> Result<PathBuf, SinkError> {
        if let Some(e) = self.open_error.take() {
            return Err(SinkError::Open(e));
        }
        let opened = self.open().map(|_| ());
        if let Err(e) = opened {
            return Err(SinkError::Open(self.open_error.take().unwrap_or(e)));
        }
        match self.file.take() {
            Some(file) => file.finalize().map_err(SinkError::Finish),
            None => Err(SinkError::Finish(io::Error::new(
                io::ErrorKind::Other,
                "part file not open",
            ))),
        }
    }

    /// Remove whatever was written so far.
    pub(super) fn discard(mut self) {
        if let Some(file) = self.file.take() {
            file.discard();
        }
    }
}

impl Write for LazyPartFile<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.open()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub(super) enum SinkError {
    Open(io::Error),
    /// Flush, sync or rename failed after the body was received.
    Finish(io::Error),
}
