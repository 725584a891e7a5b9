pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::KafkaPublisher;
pub use app::ExitStatus;
pub use config::{cli::CliArgs, PipelineConfig};
pub use crate::core::driver::PipelineDriver;
pub use domain::ports::Publisher;
pub use utils::error::{IngestError, Result};
