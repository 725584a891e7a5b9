use crate::core::relocate::ensure_dir;
use crate::domain::model::ErrorRecord;
use crate::utils::error::{IngestError, Result};
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes a diagnostic artifact for a failed file into `error_folder`.
pub fn write_error_log(
    error_folder: &Path,
    original_filename: &str,
    cause: &IngestError,
    lines_processed_before_fault: u64,
) -> Result<PathBuf> {
    let record = ErrorRecord {
        timestamp: Utc::now(),
        original_filename: original_filename.to_string(),
        lines_processed_before_fault,
        cause_detail: cause.detail(),
    };
    write_record(error_folder, &record)
}

pub fn write_record(error_folder: &Path, record: &ErrorRecord) -> Result<PathBuf> {
    let reporting_error = |path: &Path, source| IngestError::ReportingError {
        path: path.to_path_buf(),
        source,
    };

    ensure_dir(error_folder).map_err(|e| reporting_error(error_folder, e))?;

    let (path, mut file) = create_unique(error_folder, &record.artifact_name())
        .map_err(|e| reporting_error(error_folder, e))?;
    file.write_all(record.render().as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| reporting_error(&path, e))?;

    tracing::debug!("Wrote detailed error log at {}", path.display());
    Ok(path)
}

// artifacts are never overwritten; a second failure in the same second gets `.1`, `.2`, ...
fn create_unique(folder: &Path, name: &str) -> io::Result<(PathBuf, File)> {
    let mut candidate = folder.join(name);
    let mut attempt = 0u32;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < 1000 => {
                attempt += 1;
                candidate = folder.join(format!("{}.{}", name, attempt));
            }
            Err(e) => return Err(e),
        }
    }
}
