//! Filesystem-safety rules for dataset names and listed file names.

use thiserror::Error;

const NAME_MAX: usize = 255;

const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name is empty")]
    Empty,
    #[error("name is longer than 255 bytes")]
    TooLong,
    #[error("name contains forbidden character {0:?}")]
    ForbiddenChar(char),
    #[error("name {0:?} is reserved")]
    Reserved(String),
    #[error("name may not start or end with a space or dot")]
    EdgeSpaceOrDot,
}

/// Characters that would split or escape a path.
fn is_path_char(c: char) -> bool {
    c == '\0' || c == '/' || c == '\\' || c.is_control()
}

/// Path characters plus the ones reserved on common filesystems.
fn is_forbidden(c: char) -> bool {
    is_path_char(c) || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

/// Checks that `name` can be used verbatim as a single directory name.
///
/// - Non-empty, at most 255 bytes (Linux NAME_MAX)
/// - No NUL, `/`, `\`, `:`, `*`, `?`, `"`, `<`, `>`, `|` or control characters
/// - No leading/trailing space or dot (rules out `.` and `..`)
/// - Not a Windows device name (`CON`, `NUL`, `COM1`, ...)
pub fn validate_dataset_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.len() > NAME_MAX {
        return Err(NameError::TooLong);
    }
    if let Some(c) = name.chars().find(|c| is_forbidden(*c)) {
        return Err(NameError::ForbiddenChar(c));
    }
    if name.starts_with([' ', '.']) || name.ends_with([' ', '.']) {
        return Err(NameError::EdgeSpaceOrDot);
    }
    if RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        return Err(NameError::Reserved(name.to_string()));
    }
    Ok(())
}

/// True if a listed file name stays inside its dataset directory when joined.
///
/// Looser than [`validate_dataset_name`]: only path separators, NUL, control
/// characters and `.`/`..` are refused. Names come from the remote listing and
/// are kept verbatim, so `:` or `?` in a file name is allowed.
pub fn is_safe_file_name(file: &str) -> bool {
    !file.is_empty()
        && file != "."
        && file != ".."
        && file.len() <= NAME_MAX
        && !file.chars().any(is_path_char)
}
