use crate::error::App;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use std::path::Path;

/// Rotating file log for the daemon. Keep the handle alive for as long as
/// logging is wanted.
pub fn start_file_logger(level: &str, directory: &Path) -> Result<LoggerHandle, App> {
    let handle = Logger::try_with_str(level)?
        .log_to_file(FileSpec::default().directory(directory))
        .rotate(
            Criterion::Size(1_000_000),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(3),
        )
        .duplicate_to_stderr(Duplicate::None)
        .start()?;
    Ok(handle)
}

/// Stderr log for the command line client, `RUST_LOG` wins over `level`.
pub fn start_stderr_logger(level: &str) -> Result<LoggerHandle, App> {
    let handle = Logger::try_with_env_or_str(level)?
        .log_to_stderr()
        .start()?;
    Ok(handle)
}
