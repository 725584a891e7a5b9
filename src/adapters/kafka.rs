//! Kafka implementation of [`Publisher`] on top of rdkafka's `FutureProducer`.

use crate::config::env::BrokerSettings;
use crate::domain::model::PublishReceipt;
use crate::domain::ports::Publisher;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct KafkaPublisher {
    producer: FutureProducer,
    ack_timeout: Duration,
    flush_timeout: Duration,
    closed: AtomicBool,
}

impl KafkaPublisher {
    /// Builds the producer and checks that at least one broker answers a metadata request.
    pub async fn open(settings: &BrokerSettings) -> Result<Self> {
        if settings.addresses.is_empty() {
            return Err(IngestError::ConnectionError {
                message: "no broker addresses configured".to_string(),
            });
        }
        if settings.topic.trim().is_empty() {
            return Err(IngestError::ConnectionError {
                message: "no topic configured".to_string(),
            });
        }

        tracing::info!(
            "Initializing Kafka producer for topic '{}' on broker(s) '{}'",
            settings.topic,
            settings.bootstrap_servers()
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", settings.bootstrap_servers())
            .set("client.id", &settings.client_id)
            .set("linger.ms", "5")
            .set("max.in.flight.requests.per.connection", "5")
            .set("message.timeout.ms", settings.ack_timeout.as_millis().to_string())
            .create()
            .map_err(|e| IngestError::ConnectionError {
                message: format!("could not create producer: {}", e),
            })?;

        let probe = producer.clone();
        let topic = settings.topic.clone();
        let connect_timeout = settings.connect_timeout;
        let metadata = tokio::task::spawn_blocking(move || {
            probe
                .client()
                .fetch_metadata(Some(topic.as_str()), Timeout::After(connect_timeout))
                .map(|m| m.brokers().len())
        })
        .await
        .map_err(|e| IngestError::ConnectionError {
            message: format!("metadata probe aborted: {}", e),
        })?;

        let brokers = metadata.map_err(|e| IngestError::ConnectionError {
            message: format!(
                "no broker reachable at '{}' within {:?}: {}",
                settings.bootstrap_servers(),
                connect_timeout,
                e
            ),
        })?;
        tracing::info!("Connected to Kafka cluster ({} broker(s) advertised)", brokers);

        Ok(Self {
            producer,
            ack_timeout: settings.ack_timeout,
            flush_timeout: settings.flush_timeout,
            closed: AtomicBool::new(false),
        })
    }
}

fn is_timeout(err: &KafkaError) -> bool {
    matches!(
        err,
        KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut)
    )
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish_line(&self, topic: &str, payload: &[u8]) -> Result<PublishReceipt> {
        let record: FutureRecord<'_, (), [u8]> = FutureRecord::to(topic).payload(payload);
        let delivery = tokio::time::timeout(
            self.ack_timeout,
            self.producer.send(record, Timeout::After(self.ack_timeout)),
        )
        .await;

        match delivery {
            Ok(Ok((partition, offset))) => {
                tracing::debug!(
                    "Sent message to Kafka: topic={} partition={} offset={}",
                    topic,
                    partition,
                    offset
                );
                Ok(PublishReceipt {
                    topic: topic.to_string(),
                    partition,
                    offset,
                })
            }
            Ok(Err((err, _message))) if is_timeout(&err) => Err(IngestError::PublishTimeout {
                timeout: self.ack_timeout,
            }),
            Ok(Err((err, _message))) => {
                let preview = String::from_utf8_lossy(&payload[..payload.len().min(80)]);
                tracing::error!("Failed to send line starting: {:.80} ({})", preview, err);
                Err(IngestError::PublishError { source: err })
            }
            Err(_) => Err(IngestError::PublishTimeout {
                timeout: self.ack_timeout,
            }),
        }
    }

    async fn flush(&self, timeout: Duration) -> Result<()> {
        // librdkafka's flush blocks the calling thread
        let producer = self.producer.clone();
        let outcome = tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| IngestError::FlushError {
                message: format!("flush task aborted: {}", e),
            })?;

        match outcome {
            Ok(()) => {
                tracing::debug!("Kafka producer flushed");
                Ok(())
            }
            Err(e) => Err(IngestError::FlushError {
                message: format!(
                    "{} message(s) still pending after {:?}: {}",
                    self.producer.in_flight_count(),
                    timeout,
                    e
                ),
            }),
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.flush(self.flush_timeout).await {
            tracing::warn!("Flush during close failed: {}", e);
        }
        tracing::info!("Kafka producer closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(addresses: &[&str], topic: &str) -> BrokerSettings {
        BrokerSettings {
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
            topic: topic.to_string(),
            client_id: "csv-producer".to_string(),
            ack_timeout: Duration::from_secs(1),
            flush_timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_open_rejects_empty_addresses() {
        let err = KafkaPublisher::open(&settings(&[], "lines")).await.err().unwrap();
        assert!(matches!(err, IngestError::ConnectionError { .. }));
    }

    #[tokio::test]
    async fn test_open_rejects_empty_topic() {
        let err = KafkaPublisher::open(&settings(&["localhost:9092"], " "))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::ConnectionError { .. }));
    }

    #[tokio::test]
    async fn test_open_fails_when_no_broker_answers() {
        let err = KafkaPublisher::open(&settings(&["127.0.0.1:1"], "lines"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::ConnectionError { .. }));
    }

    #[test]
    fn test_timeout_classification() {
        assert!(is_timeout(&KafkaError::MessageProduction(
            RDKafkaErrorCode::MessageTimedOut
        )));
        assert!(!is_timeout(&KafkaError::MessageProduction(
            RDKafkaErrorCode::MessageSizeTooLarge
        )));
    }
}
