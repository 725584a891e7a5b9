// Adapters layer: concrete implementations of domain ports for external systems.

pub mod kafka;

pub use kafka::KafkaPublisher;
