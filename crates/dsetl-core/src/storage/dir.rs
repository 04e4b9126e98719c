use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Create `<root>/<name>` (and any missing parents) if absent and return it.
///
/// An existing directory is success. An existing non-directory at that path is
/// an `AlreadyExists` error. New directories get mode 0750 on unix.
pub fn ensure_dataset_dir(root: &Path, name: &str) -> io::Result<PathBuf> {
    let dir = root.join(name);
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o750);
    }
    builder.create(&dir)?;
    if !fs::metadata(&dir)?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", dir.display()),
        ));
    }
    Ok(dir)
}
