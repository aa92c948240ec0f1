use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Initialize logging with both stdout and file output.
/// Returns a guard that must be held for the lifetime of the application
/// to ensure log messages are flushed.
pub fn init_logging(
    log_dir: &Path,
    default_directive: &str,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = rolling::never(log_dir, "semconflict.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .try_init()?;

    Ok(guard)
}

/// Stdout-only variant for embedders that do not keep a log directory.
pub fn init_stdout_logging(default_directive: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .try_init()?;
    Ok(())
}

/// Install the subscriber described by `settings`. The guard is `None` when
/// no log directory is configured.
pub fn init_from_settings(
    settings: &LoggingSettings,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    match &settings.log_dir {
        Some(dir) => init_logging(dir, &settings.filter).map(Some),
        None => init_stdout_logging(&settings.filter).map(|_| None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global subscriber can be installed once per process, so this is
    // the only test that touches it.
    #[test]
    fn test_file_logging_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let settings = LoggingSettings {
            filter: "debug".into(),
            log_dir: Some(log_dir.clone()),
        };

        let guard = init_from_settings(&settings).unwrap();
        assert!(guard.is_some());
        assert!(log_dir.is_dir());
        tracing::info!("logging initialised");

        assert!(init_stdout_logging("info").is_err());
    }
}
