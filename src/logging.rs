//! Log setup for the shell.
//!
//! The terminal belongs to the conversation, so logs only go to a file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, Result};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Send `tracing` output to `path`, filtered by `RUST_LOG`.
///
/// Keep the returned guard alive for as long as logs should be written;
/// dropping it flushes the file.
pub fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (dir, file_name) = split_log_path(path)?;
    std::fs::create_dir_all(dir)
        .map_err(|err| Error::io(format!("failed to create log directory {}", dir.display()), err))?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| Error::configuration(format!("logging is already initialized: {err}")))?;
    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path.file_name().ok_or_else(|| {
        Error::configuration(format!("log file {} has no file name", path.display()))
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_bare_file_names() {
        let (dir, name) = split_log_path(Path::new("chat_app.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "chat_app.log");
    }

    #[test]
    fn splits_nested_paths() {
        let (dir, name) = split_log_path(Path::new("/var/log/seu-blusa/chat.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log/seu-blusa"));
        assert_eq!(name, "chat.log");
    }

    #[test]
    fn rejects_paths_without_file_name() {
        assert!(split_log_path(Path::new("/")).is_err());
        assert!(split_log_path(Path::new("logs/..")).is_err());
    }
}
