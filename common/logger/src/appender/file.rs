use crate::LoggerError;
use std::path::Path;
use tracing_appender::rolling::{Builder, RollingFileAppender, Rotation};

/// Opens a single file that is never rotated, in append mode.
/// The file and its parent folders are created if needed.
pub fn never_rotated<P: AsRef<Path>>(path: P) -> Result<RollingFileAppender, LoggerError> {
    let path = path.as_ref();
    let file_name = path.file_name().and_then(|name| name.to_str()).ok_or_else(|| {
        LoggerError::LoggerConfigurationError {
            message: format!("Wrong log file path: [{}]", path.display()),
        }
    })?;
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    Builder::new()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(|err| LoggerError::LoggerConfigurationError {
            message: format!("Cannot open the log file [{}]. Err: {}", path.display(), err),
        })
}
