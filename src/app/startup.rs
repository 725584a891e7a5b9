use crate::adapters::KafkaPublisher;
use crate::app::exit::ExitStatus;
use crate::config::env::BrokerSettings;
use crate::config::paths::FolderPaths;
use crate::config::PipelineConfig;
use crate::core::driver::PipelineDriver;
use crate::core::relocate::ensure_dir;
use crate::domain::model::RunReport;
use crate::utils::error::IngestError;
use crate::utils::validation::Validate;
use std::future::Future;
use std::path::Path;

fn log_startup_failure(what: &str, e: &IngestError) {
    tracing::error!("❌ {}: {} (Category: {:?})", what, e, e.category());
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
}

/// Loads and validates everything the run needs, in startup order.
///
/// Each failure maps to its own [`ExitStatus`]; nothing is published or moved
/// before all of these checks pass.
pub fn prepare<L>(config_path: &Path, lookup: L) -> Result<PipelineConfig, ExitStatus>
where
    L: Fn(&str) -> Option<String>,
{
    tracing::info!("📁 Loading configuration from {}", config_path.display());
    let paths = FolderPaths::from_file(config_path, &lookup).map_err(|e| {
        log_startup_failure("Failed to load config", &e);
        ExitStatus::ConfigLoad
    })?;

    tracing::info!(
        "Paths: input={} archive={} error={}",
        paths.input_folder.display(),
        paths.archive_folder.display(),
        paths.error_folder.display()
    );

    if !paths.input_folder.is_dir() {
        tracing::error!(
            "Input folder '{}' is missing or not a directory. Exiting.",
            paths.input_folder.display()
        );
        return Err(ExitStatus::InputFolderMissing);
    }

    for folder in [&paths.archive_folder, &paths.error_folder] {
        if let Err(e) = ensure_dir(folder) {
            tracing::error!("Cannot create folder '{}': {}", folder.display(), e);
            return Err(ExitStatus::PrepareFolders);
        }
    }

    let broker = BrokerSettings::from_lookup(&lookup).map_err(|e| {
        tracing::error!(
            "Required Kafka environment variables missing. Ensure KAFKA_BROKER and KAFKA_TOPIC are set."
        );
        log_startup_failure("Invalid broker settings", &e);
        ExitStatus::BrokerSettings
    })?;

    let config = PipelineConfig::new(paths, broker);
    config.validate().map_err(|e| {
        log_startup_failure("Invalid broker settings", &e);
        ExitStatus::BrokerSettings
    })?;

    Ok(config)
}

/// Full run: startup checks, broker connection, then the pipeline driver.
pub async fn run<L, F>(config_path: &Path, lookup: L, shutdown: F) -> ExitStatus
where
    L: Fn(&str) -> Option<String>,
    F: Future<Output = ()>,
{
    let config = match prepare(config_path, lookup) {
        Ok(config) => config,
        Err(status) => return status,
    };

    let publisher = match KafkaPublisher::open(&config.broker).await {
        Ok(publisher) => publisher,
        Err(e) => {
            log_startup_failure("Could not initialize Kafka producer", &e);
            return ExitStatus::BrokerConnection;
        }
    };

    match PipelineDriver::new(&config, publisher).run(shutdown).await {
        Ok(report) if report.interrupted => {
            tracing::warn!("Interrupted by user. Exiting.");
            log_summary(&report);
            ExitStatus::Interrupted
        }
        Ok(report) => {
            log_summary(&report);
            ExitStatus::Success
        }
        Err(e) => {
            tracing::error!(
                "Could not list input folder '{}': {}",
                config.input_folder.display(),
                e
            );
            ExitStatus::ListInputFolder
        }
    }
}

fn log_summary(report: &RunReport) {
    tracing::info!(
        "✅ Run finished: {} file(s) published, {} faulted, {} line(s) acknowledged",
        report.published(),
        report.faulted(),
        report.lines_sent()
    );
    for file in report.files.iter().filter(|f| f.relocated_to.is_none()) {
        tracing::warn!("'{}' could not be relocated and is still in the input folder", file.file_name);
    }
}
