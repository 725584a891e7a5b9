use crate::domain::model::format_timestamp;
use crate::utils::error::{IngestError, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
const CROSS_DEVICE_ERROR: i32 = 18; // EXDEV
#[cfg(windows)]
const CROSS_DEVICE_ERROR: i32 = 17; // ERROR_NOT_SAME_DEVICE
#[cfg(not(any(unix, windows)))]
const CROSS_DEVICE_ERROR: i32 = -1;

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Moves `source` into `destination_dir`, returning where it ended up.
pub fn move_file(source: &Path, destination_dir: &Path) -> Result<PathBuf> {
    move_file_at(source, destination_dir, Utc::now())
}

/// Like [`move_file`], with the collision timestamp supplied by the caller.
///
/// A taken name gets `_<YYYYMMDDTHHMMSS>` inserted before the extension. If that
/// name is taken too the move fails instead of overwriting anything.
pub fn move_file_at(source: &Path, destination_dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    let relocation_error = |source_err| IngestError::RelocationError {
        path: source.to_path_buf(),
        source: source_err,
    };

    ensure_dir(destination_dir).map_err(relocation_error)?;

    let file_name = source.file_name().ok_or_else(|| {
        relocation_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "source has no file name",
        ))
    })?;

    let mut destination = destination_dir.join(file_name);
    if destination.exists() {
        destination = destination_dir.join(timestamped_name(source, now));
        if destination.exists() {
            return Err(relocation_error(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", destination.display()),
            )));
        }
    }

    match fs::rename(source, &destination) {
        Ok(()) => Ok(destination),
        Err(e) if e.raw_os_error() == Some(CROSS_DEVICE_ERROR) => {
            copy_then_delete(source, &destination).map_err(relocation_error)?;
            Ok(destination)
        }
        Err(e) => Err(relocation_error(e)),
    }
}

fn timestamped_name(source: &Path, now: DateTime<Utc>) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = format_timestamp(now);
    match source.extension() {
        Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_{}", stem, stamp),
    }
}

fn copy_then_delete(source: &Path, destination: &Path) -> io::Result<()> {
    if let Err(e) = fs::copy(source, destination) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    fs::remove_file(source).map_err(|e| {
        tracing::error!(
            "Copied {} to {} but could not remove the original: {}",
            source.display(),
            destination.display(),
            e
        );
        e
    })
}
