use crate::config::env::{LogFormat, LogSettings};
use crate::utils::rolling::RollingFileWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const FALLBACK_LOG_FILE: &str = "./processor.log";

/// Maps `APP_LOG_LEVEL` spellings (including Python-style names) to a filter directive.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        _ => "info",
    }
}

fn build_filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&settings.level)))
}

fn open_log_file(settings: &LogSettings) -> (Option<(RollingFileWriter, PathBuf)>, Option<String>) {
    match RollingFileWriter::open(&settings.file, settings.max_bytes, settings.backup_count) {
        Ok(writer) => (Some((writer, settings.file.clone())), None),
        Err(primary) => {
            let fallback = Path::new(FALLBACK_LOG_FILE);
            match RollingFileWriter::open(fallback, settings.max_bytes, settings.backup_count) {
                Ok(writer) => (
                    Some((writer, fallback.to_path_buf())),
                    Some(format!("{:#}; using {}", primary, fallback.display())),
                ),
                Err(e) => (None, Some(format!("{:#}; {:#}", primary, e))),
            }
        }
    }
}

/// Console plus rotating file output. Returns the log file actually in use.
pub fn init_logger(settings: &LogSettings) -> Option<PathBuf> {
    let console = match settings.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_target(false)
            .json()
            .with_filter(build_filter(settings))
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .compact()
            .with_filter(build_filter(settings))
            .boxed(),
    };

    let (file, file_problem) = open_log_file(settings);
    let active_path = file.as_ref().map(|(_, path)| path.clone());
    let file_layer = file.map(|(writer, _)| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_filter(build_filter(settings))
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    match (&active_path, file_problem) {
        (Some(_), Some(problem)) => tracing::warn!("Log file fallback: {}", problem),
        (None, Some(problem)) => {
            tracing::warn!("Failed to set up file logging ({}). Continuing with console only.", problem)
        }
        _ => {}
    }

    tracing::debug!(
        file = ?active_path,
        max_bytes = settings.max_bytes,
        backups = settings.backup_count,
        level = %settings.level,
        "Logging initialized"
    );

    active_path
}
