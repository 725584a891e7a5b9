//! Size-based rotating log file, shared between tracing layers.
//!
//! `processor.log` is the live file; on rotation it becomes `processor.log.1`,
//! older backups shift up by one and the one past `backup_count` is removed.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: Option<File>,
    current_size: u64,
}

impl RotatingFile {
    fn open(path: PathBuf, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut rotating = Self {
            path,
            max_bytes,
            backup_count,
            file: None,
            current_size: 0,
        };
        let (file, size) = rotating.open_current()?;
        rotating.file = Some(file);
        rotating.current_size = size;
        Ok(rotating)
    }

    fn open_current(&self) -> io::Result<(File, u64)> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let size = file.metadata()?.len();
        Ok((file, size))
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    // max_bytes == 0 or backup_count == 0 disables rotation
    fn should_rotate(&self, incoming: usize) -> bool {
        self.max_bytes > 0
            && self.backup_count > 0
            && self.current_size > 0
            && self.current_size + incoming as u64 > self.max_bytes
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for idx in (1..self.backup_count).rev() {
            let src = self.backup_path(idx);
            if src.exists() {
                fs::rename(&src, self.backup_path(idx + 1))?;
            }
        }

        if self.path.exists() {
            fs::rename(&self.path, self.backup_path(1))?;
        }

        let (file, size) = self.open_current()?;
        self.file = Some(file);
        self.current_size = size;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let bytes = file.write(buf)?;
        self.current_size += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Cloneable handle implementing `MakeWriter` over one rotating file.
#[derive(Clone)]
pub struct RollingFileWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl RollingFileWriter {
    pub fn open(path: &Path, max_bytes: u64, backup_count: usize) -> Result<Self> {
        let file = RotatingFile::open(path.to_path_buf(), max_bytes, backup_count)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }
}

pub struct RollingFileWriterGuard {
    inner: Arc<Mutex<RotatingFile>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RollingFileWriter {
    type Writer = RollingFileWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RollingFileWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for RollingFileWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_rotates_when_size_exceeded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("processor.log");
        let writer = RollingFileWriter::open(&path, 10, 2).unwrap();

        for chunk in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            writer.make_writer().write_all(chunk.as_bytes()).unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "dddddddd\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("logs/processor.log.1")).unwrap(),
            "cccccccc\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("logs/processor.log.2")).unwrap(),
            "bbbbbbbb\n"
        );
        assert!(!dir.path().join("logs/processor.log.3").exists());
    }

    #[test]
    fn test_zero_backups_never_rotates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processor.log");
        let writer = RollingFileWriter::open(&path, 4, 0).unwrap();

        writer.make_writer().write_all(b"first\n").unwrap();
        writer.make_writer().write_all(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert!(!dir.path().join("processor.log.1").exists());
    }
}
