//! Local file lifecycle for downloaded dataset files.
//!
//! Each dataset owns `<root>/<name>/`. Files are streamed into a `.part`
//! sibling and renamed over the final name only once the transfer finished,
//! so a failed copy never leaves a truncated file under the real name.

mod dir;
mod part;

pub use dir::ensure_dataset_dir;
pub use part::PartFile;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Default write buffer capacity for dataset files.
pub const DEFAULT_BUFFER_BYTES: usize = 64 * 1024;

/// Path for the temp file: appends `.part` to the final path (e.g. `ap.txt` → `ap.txt.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
