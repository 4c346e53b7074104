use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_FILE: &str = "./logs/inventory.log";

/// `--log-file` wins over `LOG_FILE_PATH`, which wins over the default.
pub fn log_file_path(from_cli: Option<&Path>) -> PathBuf {
    from_cli
        .map(Path::to_path_buf)
        .or_else(|| env::var_os("LOG_FILE_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Directory and file name for the appender. A bare file name lands in the
/// working directory.
fn split_log_path(path: &Path) -> (PathBuf, OsString) {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("inventory.log"));
    (directory, file_name)
}

/// Log to stdout and to `log_file`. `TRACING_LEVEL` sets the filter;
/// without it the level is `info`, or `debug` when `verbose`.
pub fn init_logger(log_file: &Path, verbose: bool) -> WorkerGuard {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| default_level.to_string());

    let (directory, file_name) = split_log_path(log_file);
    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(console::Term::stdout().is_term()),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(EnvFilter::new(filter))
        .init();

    debug!("Logging to stdout and {}", log_file.display());

    guard
}
