use crate::config::PipelineConfig;
use crate::core::discovery::discover_candidates;
use crate::core::{relocate, report};
use crate::domain::model::{CandidateFile, FileReport, FileStatus, ProcessingOutcome, RunReport};
use crate::domain::ports::Publisher;
use crate::utils::error::{IngestError, Result};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Streams every eligible file through one publisher, then archives or quarantines it.
///
/// Per file: `Discovered -> Streaming -> {Succeeded | Faulted} -> Relocated -> Done`.
/// A faulted file never stops the files after it. The publisher is closed exactly
/// once when [`PipelineDriver::run`] returns, whichever way it returns.
pub struct PipelineDriver<'a, P: Publisher> {
    config: &'a PipelineConfig,
    publisher: P,
}

impl<'a, P: Publisher> PipelineDriver<'a, P> {
    pub fn new(config: &'a PipelineConfig, publisher: P) -> Self {
        Self { config, publisher }
    }

    /// Processes the input folder snapshot until done or until `shutdown` resolves.
    ///
    /// When `shutdown` fires, the file being streamed is abandoned where it is (any
    /// pending publish is dropped) and the report comes back with `interrupted` set.
    /// Only a failure to list the input folder is returned as `Err`.
    pub async fn run<F>(self, shutdown: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        let candidates = match discover_candidates(&self.config.input_folder) {
            Ok(candidates) => candidates,
            Err(e) => {
                self.publisher.close().await;
                return Err(e);
            }
        };

        if candidates.is_empty() {
            tracing::info!("No .csv files to process in input folder. Exiting normally.");
        }

        let mut run_report = RunReport::default();
        tokio::pin!(shutdown);

        for file in &candidates {
            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::warn!("Interrupted by user; '{}' left in the input folder", file.name);
                    run_report.interrupted = true;
                    break;
                }
                outcome = self.process_file(file) => outcome,
            };
            run_report.files.push(self.settle(file, outcome));
        }

        self.publisher.close().await;
        Ok(run_report)
    }

    /// Streaming phase for one file. Never touches the file's location.
    pub async fn process_file(&self, file: &CandidateFile) -> ProcessingOutcome {
        tracing::info!("Start processing file: {}", file.name);
        let mut lines_sent = 0u64;
        match self.stream_lines(file, &mut lines_sent).await {
            Ok(()) => {
                tracing::info!(
                    "Finished processing {}; total lines={}",
                    file.path.display(),
                    lines_sent
                );
                ProcessingOutcome::Success { lines_sent }
            }
            Err(cause) => ProcessingOutcome::Failure {
                lines_sent_before_fault: lines_sent,
                cause,
            },
        }
    }

    // lines_sent only ever counts acknowledged publishes
    async fn stream_lines(&self, file: &CandidateFile, lines_sent: &mut u64) -> Result<()> {
        let read_error = |source| IngestError::ReadError {
            path: file.path.clone(),
            source,
        };

        let handle = tokio::fs::File::open(&file.path).await.map_err(read_error)?;
        let mut reader = BufReader::new(handle);
        let mut buf = Vec::new();
        let progress_interval = self.config.progress_interval.max(1) as u64;

        while read_line(&mut reader, &mut buf).await.map_err(read_error)? {
            if buf.is_empty() {
                continue;
            }
            let line = String::from_utf8_lossy(&buf);

            let receipt = self
                .publisher
                .publish_line(self.config.topic(), line.as_bytes())
                .await?;
            *lines_sent += 1;
            tracing::trace!(
                partition = receipt.partition,
                offset = receipt.offset,
                "line {} acknowledged",
                lines_sent
            );

            if *lines_sent % progress_interval == 0 {
                tracing::info!("Processed {} lines from {}", lines_sent, file.path.display());
            }
        }

        self.publisher.flush(self.config.broker.flush_timeout).await
    }

    /// Relocation phase: archive on success; error record plus quarantine on failure.
    ///
    /// A published file that cannot be archived is quarantined like a faulted one so
    /// it never stays in the input folder to be sent again.
    fn settle(&self, file: &CandidateFile, outcome: ProcessingOutcome) -> FileReport {
        match outcome {
            ProcessingOutcome::Success { lines_sent } => {
                match relocate::move_file(&file.path, &self.config.archive_folder) {
                    Ok(dest) => {
                        tracing::info!(
                            "Successfully processed '{}' (lines={}). Moved to archive '{}'",
                            file.name,
                            lines_sent,
                            dest.display()
                        );
                        FileReport {
                            file_name: file.name.clone(),
                            status: FileStatus::Published,
                            lines_sent,
                            relocated_to: Some(dest),
                            error_log: None,
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            "Published '{}' (lines={}) but could not archive it: {}",
                            file.name,
                            lines_sent,
                            e
                        );
                        self.quarantine(file, lines_sent, e)
                    }
                }
            }
            ProcessingOutcome::Failure {
                lines_sent_before_fault,
                cause,
            } => {
                tracing::error!(
                    "Processing failed for '{}' after {} line(s): {}",
                    file.name,
                    lines_sent_before_fault,
                    cause
                );
                self.quarantine(file, lines_sent_before_fault, cause)
            }
        }
    }

    fn quarantine(&self, file: &CandidateFile, lines_sent: u64, cause: IngestError) -> FileReport {
        let error_log = match report::write_error_log(
            &self.config.error_folder,
            &file.path.to_string_lossy(),
            &cause,
            lines_sent,
        ) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!("Failed to write detailed error log: {}", e);
                None
            }
        };

        // quarantine even when the error record could not be written
        let relocated_to = match relocate::move_file(&file.path, &self.config.error_folder) {
            Ok(dest) => Some(dest),
            Err(e) => {
                tracing::error!("Failed to move file '{}' to error folder: {}", file.name, e);
                None
            }
        };

        tracing::error!(
            "Moved '{}' to error folder '{}'. Error log: {}",
            file.name,
            display_or(&relocated_to, "(failed to move)"),
            display_or(&error_log, "(failed to write detailed log)")
        );

        FileReport {
            file_name: file.name.clone(),
            status: FileStatus::Faulted,
            lines_sent,
            relocated_to,
            error_log,
        }
    }
}

fn display_or(path: &Option<std::path::PathBuf>, fallback: &str) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// Reads one line ended by `\n`, `\r\n` or a lone `\r` into `buf`, without the terminator.
///
/// Returns `false` once the input is exhausted and nothing was read.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(!buf.is_empty());
        }

        match available.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(end) => {
                let carriage_return = available[end] == b'\r';
                buf.extend_from_slice(&available[..end]);
                reader.consume(end + 1);
                if carriage_return && reader.fill_buf().await?.first() == Some(&b'\n') {
                    reader.consume(1);
                }
                return Ok(true);
            }
            None => {
                let taken = available.len();
                buf.extend_from_slice(available);
                reader.consume(taken);
            }
        }
    }
}
