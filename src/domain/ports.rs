use crate::domain::model::PublishReceipt;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Sink for file lines. The driver owns exactly one for the whole run.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Resolves only once the broker acknowledged this message, or fails.
    async fn publish_line(&self, topic: &str, payload: &[u8]) -> Result<PublishReceipt>;

    /// Waits for every submitted message to be resolved within `timeout`.
    async fn flush(&self, timeout: Duration) -> Result<()>;

    /// Best-effort flush and teardown. Never fails; problems are logged.
    async fn close(&self);
}
