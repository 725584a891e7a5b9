use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "csv-kafka-streamer")]
#[command(about = "Publish every line of dropped .csv files to a Kafka topic, then archive them")]
pub struct CliArgs {
    /// Path to the TOML file holding the [paths] section
    #[arg(short, long, env = "APP_CONFIG_PATH", default_value = "config.toml")]
    pub config: PathBuf,

    /// Log at debug level regardless of APP_LOG_LEVEL
    #[arg(short, long)]
    pub verbose: bool,
}
