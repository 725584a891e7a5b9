use crate::utils::error::{IngestError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CLIENT_ID: &str = "csv-producer";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_LOG_FILE: &str = "/var/log/csv_kafka_streamer/processor.log";
pub const DEFAULT_LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_LOG_BACKUP_COUNT: usize = 5;
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Broker connection parameters taken from `KAFKA_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub addresses: Vec<String>,
    pub topic: String,
    pub client_id: String,
    pub ack_timeout: Duration,
    pub flush_timeout: Duration,
    pub connect_timeout: Duration,
}

impl BrokerSettings {
    /// Reads settings through `lookup` so callers (and tests) can supply their own environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let brokers = required(&lookup, "KAFKA_BROKER")?;
        let addresses: Vec<String> = brokers
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect();
        if addresses.is_empty() {
            return Err(IngestError::MissingConfigError {
                field: "KAFKA_BROKER".to_string(),
            });
        }

        let topic = required(&lookup, "KAFKA_TOPIC")?;
        let client_id = lookup("KAFKA_CLIENT_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());

        Ok(Self {
            addresses,
            topic,
            client_id,
            ack_timeout: timeout_secs(&lookup, "KAFKA_ACK_TIMEOUT_SECS")?,
            flush_timeout: timeout_secs(&lookup, "KAFKA_FLUSH_TIMEOUT_SECS")?,
            connect_timeout: timeout_secs(&lookup, "KAFKA_CONNECT_TIMEOUT_SECS")?,
        })
    }

    pub fn bootstrap_servers(&self) -> String {
        self.addresses.join(",")
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IngestError::MissingConfigError {
            field: key.to_string(),
        })
}

fn timeout_secs<F>(lookup: &F, key: &str) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| IngestError::InvalidConfigValueError {
                field: key.to_string(),
                value: raw.clone(),
                reason: format!("Expected whole seconds: {}", e),
            }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging destination and rotation, from `APP_LOG_*`. Bad numbers fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub file: PathBuf,
    pub level: String,
    pub max_bytes: u64,
    pub backup_count: usize,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
            level: DEFAULT_LOG_LEVEL.to_string(),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            backup_count: DEFAULT_LOG_BACKUP_COUNT,
            format: LogFormat::Text,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            file: lookup("APP_LOG_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.file),
            level: lookup("APP_LOG_LEVEL")
                .map(|v| v.trim().to_ascii_uppercase())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.level),
            max_bytes: lookup("APP_LOG_MAX_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_bytes),
            backup_count: lookup("APP_LOG_BACKUP_COUNT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.backup_count),
            format: match lookup("APP_LOG_FORMAT").as_deref().map(str::trim) {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => defaults.format,
            },
        }
    }
}
