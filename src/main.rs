use clap::Parser;
use csv_kafka_streamer::app::startup;
use csv_kafka_streamer::config::env::LogSettings;
use csv_kafka_streamer::utils::logger;
use csv_kafka_streamer::CliArgs;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // 初始化日誌
    let mut log_settings = LogSettings::from_env();
    if args.verbose {
        log_settings.level = "DEBUG".to_string();
    }
    logger::init_logger(&log_settings);

    tracing::info!("🚀 Starting csv-kafka-streamer");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for interrupt signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let status = startup::run(&args.config, |key| std::env::var(key).ok(), shutdown).await;
    tracing::info!("Exiting with status {}", status.code());
    status.into()
}
