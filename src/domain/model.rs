use crate::utils::error::IngestError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// UTC stamp used for collision suffixes and error artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub name: String,
    pub extension: String,
}

impl CandidateFile {
    /// Returns `None` unless the extension is `csv` in any letter case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if !extension.eq_ignore_ascii_case("csv") {
            return None;
        }
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            path: path.to_path_buf(),
            name,
            extension: extension.to_string(),
        })
    }
}

#[derive(Debug)]
pub enum ProcessingOutcome {
    Success {
        lines_sent: u64,
    },
    Failure {
        lines_sent_before_fault: u64,
        cause: IngestError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub original_filename: String,
    pub lines_processed_before_fault: u64,
    pub cause_detail: String,
}

impl ErrorRecord {
    /// `error_<basename>_<timestamp>.log`
    pub fn artifact_name(&self) -> String {
        let base_name = Path::new(&self.original_filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.original_filename.clone());
        format!("error_{}_{}.log", base_name, format_timestamp(self.timestamp))
    }

    pub fn render(&self) -> String {
        format!(
            "timestamp_utc: {}\noriginal_filename: {}\nlines_processed_before_fault: {}\n\ncause:\n{}\n",
            format_timestamp(self.timestamp),
            self.original_filename,
            self.lines_processed_before_fault,
            self.cause_detail
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Published,
    Faulted,
}

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub status: FileStatus,
    pub lines_sent: u64,
    /// `None` when relocation itself failed and the file is still in the input folder.
    pub relocated_to: Option<PathBuf>,
    pub error_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub interrupted: bool,
}

impl RunReport {
    pub fn published(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Published)
            .count()
    }

    pub fn faulted(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Faulted)
            .count()
    }

    pub fn lines_sent(&self) -> u64 {
        self.files.iter().map(|f| f.lines_sent).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_candidate_extension_is_case_insensitive() {
        let upper = CandidateFile::from_path(Path::new("/in/a.CSV")).unwrap();
        assert_eq!(upper.name, "a.CSV");
        assert_eq!(upper.extension, "CSV");

        assert!(CandidateFile::from_path(Path::new("/in/b.Csv")).is_some());
        assert!(CandidateFile::from_path(Path::new("/in/c.tsv")).is_none());
        assert!(CandidateFile::from_path(Path::new("/in/csv")).is_none());
        assert!(CandidateFile::from_path(Path::new("/in/d.csv.bak")).is_none());
    }

    #[test]
    fn test_error_record_render() {
        let record = ErrorRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap(),
            original_filename: "/in/b.csv".to_string(),
            lines_processed_before_fault: 1,
            cause_detail: "Broker did not acknowledge message within 10s".to_string(),
        };

        assert_eq!(record.artifact_name(), "error_b.csv_20240309T070501.log");
        let text = record.render();
        assert!(text.starts_with("timestamp_utc: 20240309T070501\n"));
        assert!(text.contains("original_filename: /in/b.csv\n"));
        assert!(text.contains("lines_processed_before_fault: 1\n"));
        assert!(text.ends_with("cause:\nBroker did not acknowledge message within 10s\n"));
    }
}
