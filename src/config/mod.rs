pub mod cli;
pub mod env;
pub mod paths;

use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use env::BrokerSettings;
use paths::FolderPaths;
use std::path::PathBuf;

pub const DEFAULT_PROGRESS_INTERVAL: usize = 500;

/// Everything the pipeline needs for one run. Built once, then only borrowed.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_folder: PathBuf,
    pub archive_folder: PathBuf,
    pub error_folder: PathBuf,
    pub broker: BrokerSettings,
    pub progress_interval: usize,
}

impl PipelineConfig {
    pub fn new(paths: FolderPaths, broker: BrokerSettings) -> Self {
        Self {
            input_folder: paths.input_folder,
            archive_folder: paths.archive_folder,
            error_folder: paths.error_folder,
            broker,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn topic(&self) -> &str {
        &self.broker.topic
    }
}

impl Validate for BrokerSettings {
    fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            return Err(crate::utils::error::IngestError::MissingConfigError {
                field: "KAFKA_BROKER".to_string(),
            });
        }
        for address in &self.addresses {
            validation::validate_broker_address("KAFKA_BROKER", address)?;
        }
        validation::validate_non_empty_string("KAFKA_TOPIC", &self.topic)?;
        validation::validate_non_empty_string("KAFKA_CLIENT_ID", &self.client_id)?;
        validation::validate_timeout("KAFKA_ACK_TIMEOUT_SECS", self.ack_timeout)?;
        validation::validate_timeout("KAFKA_FLUSH_TIMEOUT_SECS", self.flush_timeout)?;
        validation::validate_timeout("KAFKA_CONNECT_TIMEOUT_SECS", self.connect_timeout)?;
        Ok(())
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("paths.input_folder", &self.input_folder)?;
        validation::validate_path("paths.archive_folder", &self.archive_folder)?;
        validation::validate_path("paths.error_folder", &self.error_folder)?;
        validation::validate_positive_number("progress_interval", self.progress_interval, 1)?;
        self.broker.validate()
    }
}
