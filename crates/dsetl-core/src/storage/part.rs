//! Buffered `.part` writer with finalize-by-rename.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::temp_path;

/// A dataset file being written. Bytes go to `<final>.part`; `finalize`
/// renames it over `<final>`, `discard` removes it.
pub struct PartFile {
    writer: BufWriter<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
}

impl PartFile {
    /// Create or truncate `<final_path>.part` (mode 0640 on unix).
    pub fn create(final_path: &Path, buffer_bytes: usize) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        let mut options = File::options();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o640);
        }
        let file = options.open(&temp_path)?;
        Ok(PartFile {
            writer: BufWriter::with_capacity(buffer_bytes.max(1), file),
            temp_path,
            final_path: final_path.to_path_buf(),
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, sync and rename over the final path (replacing an older copy).
    pub fn finalize(self) -> io::Result<PathBuf> {
        let PartFile {
            writer,
            temp_path,
            final_path,
        } = self;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, &final_path)?;
        Ok(final_path)
    }

    /// Drop buffered bytes and remove the part file. Best effort: a missing
    /// part file is not an error.
    pub fn discard(self) {
        let PartFile {
            writer, temp_path, ..
        } = self;
        // into_parts skips the flush that dropping a BufWriter would do.
        let (file, _) = writer.into_parts();
        drop(file);
        if let Err(e) = fs::remove_file(&temp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!("could not remove {}: {}", temp_path.display(), e);
            }
        }
    }
}

impl Write for PartFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
