use crate::utils::error::{IngestError, Result};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &Path) -> Result<()> {
    let raw = path.to_string_lossy();
    if raw.trim().is_empty() {
        return Err(IngestError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if raw.contains('\0') {
        return Err(IngestError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(IngestError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(IngestError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_timeout(field_name: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(IngestError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: format!("{:?}", value),
            reason: "Timeout must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Accepts `host:port` with an explicit numeric port.
pub fn validate_broker_address(field_name: &str, address: &str) -> Result<()> {
    let invalid = |reason: String| IngestError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: address.to_string(),
        reason,
    };

    if address.contains("://") {
        return Err(invalid("Broker address must be host:port without a scheme".to_string()));
    }

    match Url::parse(&format!("kafka://{}", address)) {
        Ok(url) => {
            if url.host_str().map_or(true, str::is_empty) {
                return Err(invalid("Missing host".to_string()));
            }
            if url.port().is_none() {
                return Err(invalid("Missing port".to_string()));
            }
            if url.path() != "" && url.path() != "/" {
                return Err(invalid("Unexpected path component".to_string()));
            }
            Ok(())
        }
        Err(e) => Err(invalid(format!("Invalid address format: {}", e))),
    }
}
