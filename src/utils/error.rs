use rdkafka::error::KafkaError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Broker connection failed: {message}")]
    ConnectionError { message: String },

    #[error("Broker did not acknowledge message within {timeout:?}")]
    PublishTimeout { timeout: Duration },

    #[error("Broker rejected message: {source}")]
    PublishError {
        #[source]
        source: KafkaError,
    },

    #[error("Flush failed: {message}")]
    FlushError { message: String },

    #[error("Failed to read {}: {source}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list {}: {source}", .path.display())]
    ListError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to relocate {}: {source}", .path.display())]
    RelocationError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write error record {}: {source}", .path.display())]
    ReportingError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Broker,
    Filesystem,
}

impl IngestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::ConnectionError { .. }
            | Self::PublishTimeout { .. }
            | Self::PublishError { .. }
            | Self::FlushError { .. } => ErrorCategory::Broker,
            Self::ReadError { .. }
            | Self::ListError { .. }
            | Self::RelocationError { .. }
            | Self::ReportingError { .. } => ErrorCategory::Filesystem,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigError { .. } => "Check that the config file exists and has a [paths] section",
            Self::MissingConfigError { .. } => "Set the missing value in the config file or environment",
            Self::InvalidConfigValueError { .. } => "Correct the value and restart",
            Self::ConnectionError { .. } => "Verify KAFKA_BROKER addresses are reachable from this host",
            Self::PublishTimeout { .. } | Self::PublishError { .. } | Self::FlushError { .. } => {
                "Inspect broker health, then move the file from the error folder back to the input folder"
            }
            Self::ReadError { .. } | Self::ListError { .. } => {
                "Check file permissions on the input folder"
            }
            Self::RelocationError { .. } | Self::ReportingError { .. } => {
                "Check free space and permissions on the archive and error folders"
            }
        }
    }

    /// Message plus every `source()` below it, one per line.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            detail.push_str("\n  caused by: ");
            detail.push_str(&err.to_string());
            source = err.source();
        }
        detail
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_includes_source_chain() {
        let err = IngestError::RelocationError {
            path: PathBuf::from("/in/a.csv"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        let detail = err.detail();
        assert!(detail.starts_with("Failed to relocate /in/a.csv: denied"));
        assert!(detail.contains("caused by: denied"));
        assert_eq!(err.category(), ErrorCategory::Filesystem);
    }

    #[test]
    fn test_publish_timeout_is_broker_category() {
        let err = IngestError::PublishTimeout {
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.category(), ErrorCategory::Broker);
        assert_eq!(err.detail(), "Broker did not acknowledge message within 10s");
    }
}
