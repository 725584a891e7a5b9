use anyhow::Result;
use async_trait::async_trait;
use csv_kafka_streamer::app::startup;
use csv_kafka_streamer::domain::model::PublishReceipt;
use csv_kafka_streamer::{IngestError, PipelineDriver, Publisher};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Records payloads; rejects the n-th publish attempt (1-based) if asked to.
#[derive(Clone, Default)]
struct RecordingPublisher {
    messages: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    attempts: Arc<Mutex<usize>>,
    reject_attempt: Option<usize>,
    closes: Arc<Mutex<usize>>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish_line(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> csv_kafka_streamer::Result<PublishReceipt> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if self.reject_attempt == Some(attempt) {
            return Err(IngestError::PublishTimeout {
                timeout: Duration::from_secs(10),
            });
        }
        let mut messages = self.messages.lock().unwrap();
        messages.push((topic.to_string(), payload.to_vec()));
        Ok(PublishReceipt {
            topic: topic.to_string(),
            partition: 0,
            offset: messages.len() as i64 - 1,
        })
    }

    async fn flush(&self, _timeout: Duration) -> csv_kafka_streamer::Result<()> {
        Ok(())
    }

    async fn close(&self) {
        *self.closes.lock().unwrap() += 1;
    }
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Writes config.toml for `root`, creates `root/in`, and runs the startup checks.
fn prepared(root: &TempDir) -> Result<csv_kafka_streamer::PipelineConfig> {
    let input = root.path().join("in");
    std::fs::create_dir_all(&input)?;
    let as_toml = |p: &Path| p.to_string_lossy().replace('\\', "/");
    let config_path = root.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "[paths]\ninput_folder = \"{}\"\narchive_folder = \"{}\"\nerror_folder = \"{}\"\n",
            as_toml(&input),
            as_toml(&root.path().join("archive")),
            as_toml(&root.path().join("error")),
        ),
    )?;

    let vars: HashMap<&str, &str> = [("KAFKA_BROKER", "localhost:9092"), ("KAFKA_TOPIC", "csv-lines")]
        .into_iter()
        .collect();
    startup::prepare(&config_path, |k| vars.get(k).map(|v| v.to_string()))
        .map_err(|status| anyhow::anyhow!("startup failed with exit code {}", status.code()))
}

#[tokio::test]
async fn test_uppercase_csv_is_published_and_archived() -> Result<()> {
    let root = TempDir::new()?;
    let config = prepared(&root)?;
    std::fs::write(config.input_folder.join("a.CSV"), "1,2,3\n4,5,6\n")?;
    let publisher = RecordingPublisher::default();

    let report = PipelineDriver::new(&config, publisher.clone())
        .run(std::future::pending())
        .await?;

    let messages = publisher.messages.lock().unwrap().clone();
    assert_eq!(
        messages,
        vec![
            ("csv-lines".to_string(), b"1,2,3".to_vec()),
            ("csv-lines".to_string(), b"4,5,6".to_vec()),
        ]
    );
    assert_eq!(list(&config.archive_folder), vec!["a.CSV"]);
    assert!(list(&config.error_folder).is_empty());
    assert_eq!(report.published(), 1);
    assert_eq!(*publisher.closes.lock().unwrap(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rejection_on_line_two_quarantines_file() -> Result<()> {
    let root = TempDir::new()?;
    let config = prepared(&root)?;
    std::fs::write(config.input_folder.join("b.csv"), "r1\nr2\nr3\n")?;
    let publisher = RecordingPublisher {
        reject_attempt: Some(2),
        ..Default::default()
    };

    let report = PipelineDriver::new(&config, publisher.clone())
        .run(std::future::pending())
        .await?;

    assert_eq!(report.faulted(), 1);
    assert!(list(&config.archive_folder).is_empty());

    let error_files = list(&config.error_folder);
    assert_eq!(error_files.len(), 2);
    assert!(error_files.contains(&"b.csv".to_string()));
    let log_name = error_files
        .iter()
        .find(|n| n.starts_with("error_b.csv_") && n.ends_with(".log"))
        .expect("error log written");
    let log = std::fs::read_to_string(config.error_folder.join(log_name))?;
    assert!(log.contains("lines_processed_before_fault: 1"));
    Ok(())
}

#[tokio::test]
async fn test_many_lines_keep_file_order() -> Result<()> {
    let root = TempDir::new()?;
    let config = prepared(&root)?;
    let content: String = (0..1_234).map(|i| format!("{},row-{}\n", i, i)).collect();
    std::fs::write(config.input_folder.join("big.csv"), content)?;
    let publisher = RecordingPublisher::default();

    let report = PipelineDriver::new(&config, publisher.clone())
        .run(std::future::pending())
        .await?;

    let messages = publisher.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 1_234);
    assert_eq!(report.lines_sent(), 1_234);
    for (i, (_, payload)) in messages.iter().enumerate() {
        assert_eq!(payload, format!("{},row-{}", i, i).as_bytes());
    }
    Ok(())
}

#[tokio::test]
async fn test_repeated_name_across_runs_is_not_overwritten() -> Result<()> {
    let root = TempDir::new()?;
    let config = prepared(&root)?;

    std::fs::write(config.input_folder.join("a.csv"), "first\n")?;
    PipelineDriver::new(&config, RecordingPublisher::default())
        .run(std::future::pending())
        .await?;

    std::fs::write(config.input_folder.join("a.csv"), "second\n")?;
    PipelineDriver::new(&config, RecordingPublisher::default())
        .run(std::future::pending())
        .await?;

    let archived = list(&config.archive_folder);
    assert_eq!(archived.len(), 2);
    let contents: Vec<String> = archived
        .iter()
        .map(|n| std::fs::read_to_string(config.archive_folder.join(n)).unwrap())
        .collect();
    assert!(contents.contains(&"first\n".to_string()));
    assert!(contents.contains(&"second\n".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_empty_input_folder_is_a_clean_run() -> Result<()> {
    let root = TempDir::new()?;
    let config = prepared(&root)?;
    std::fs::write(config.input_folder.join("readme.md"), "ignore me\n")?;
    let publisher = RecordingPublisher::default();

    let report = PipelineDriver::new(&config, publisher.clone())
        .run(std::future::pending())
        .await?;

    assert!(report.files.is_empty());
    assert!(!report.interrupted);
    assert_eq!(*publisher.closes.lock().unwrap(), 1);
    assert_eq!(list(&config.input_folder), vec!["readme.md"]);
    Ok(())
}
