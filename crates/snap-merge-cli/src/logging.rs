use std::env;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Console output is quiet unless `verbose`; the log file always records `info`.
/// `TRACING_LEVEL` and `FILE_TRACING_LEVEL` override either filter.
pub fn init_logger(verbose: bool) -> impl Drop {
    let stdout_filter = stdout_directive(verbose, env::var("TRACING_LEVEL").ok());
    let file_filter = file_directive(env::var("FILE_TRACING_LEVEL").ok());

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/snap-merge.log".to_string());

    let file_appender = tracing_appender::rolling::never("./", log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true)
                .with_filter(EnvFilter::new(stdout_filter)),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(EnvFilter::new(file_filter)),
        )
        .init();

    debug!("Tracing is configured for stdout and file logging.");

    guard
}

fn stdout_directive(verbose: bool, from_env: Option<String>) -> String {
    from_env.unwrap_or_else(|| if verbose { "debug" } else { "warn" }.to_string())
}

fn file_directive(from_env: Option<String>) -> String {
    from_env.unwrap_or_else(|| "info".to_string())
}
