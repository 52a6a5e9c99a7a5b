//! Write-Ahead Log (WAL) for dose log persistence.
//!
//! Dose logs are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access.
//!
//! Locks are taken on a sidecar `<wal>.lock` file rather than the WAL
//! itself. [`retain_logs`] renames a new file over the WAL, and a lock held
//! on the replaced inode would not exclude writers that open the new one.

use crate::{DoseLog, Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Path of the sidecar lock file guarding `path`
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

/// Open the sidecar lock for `path` and take it shared or exclusive
///
/// The lock is released when the returned file is dropped.
fn lock_wal(path: &Path, exclusive: bool) -> Result<File> {
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    if exclusive {
        lock.lock_exclusive()?;
    } else {
        lock.lock_shared()?;
    }
    Ok(lock)
}

/// Dose log sink trait for persisting logs
pub trait LogSink {
    fn append(&mut self, log: &DoseLog) -> Result<()>;
}

/// JSONL-based dose log sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl LogSink for JsonlSink {
    fn append(&mut self, log: &DoseLog) -> Result<()> {
        self.ensure_parent_dir()?;

        // Open the WAL only after locking so a concurrent rewrite can't
        // leave us appending to the replaced file
        let lock = lock_wal(&self.path, true)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(log)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        lock.unlock()?;

        tracing::debug!("Appended dose log {} to WAL", log.id);
        Ok(())
    }
}

/// Read all dose logs from a WAL file
pub fn read_logs(path: &Path) -> Result<Vec<DoseLog>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let lock = lock_wal(path, false)?;
    let logs = read_unlocked(path)?;
    lock.unlock()?;

    tracing::debug!("Read {} dose logs from WAL", logs.len());
    Ok(logs)
}

fn read_unlocked(path: &Path) -> Result<Vec<DoseLog>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let reader = BufReader::new(&file);
    let mut logs = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<DoseLog>(&line) {
            Ok(log) => logs.push(log),
            Err(e) => {
                // Skip the bad line, keep the rest of the history
                tracing::warn!("Failed to parse dose log at line {}: {}", line_num + 1, e);
            }
        }
    }

    Ok(logs)
}

/// Keep only the logs matching `keep`, atomically rewriting the WAL
///
/// The exclusive lock is held from the read until the new file is in
/// place, so appends made meanwhile wait and land in the new file.
/// Returns the number of logs removed. The WAL is not rewritten when
/// nothing is removed.
pub fn retain_logs<F>(path: &Path, mut keep: F) -> Result<usize>
where
    F: FnMut(&DoseLog) -> bool,
{
    let parent = path
        .parent()
        .ok_or_else(|| Error::Other(format!("WAL path {:?} has no parent", path)))?;
    std::fs::create_dir_all(parent)?;

    let lock = lock_wal(path, true)?;

    let logs = read_unlocked(path)?;
    let before = logs.len();
    let kept: Vec<DoseLog> = logs.into_iter().filter(|log| keep(log)).collect();
    let removed = before - kept.len();

    if removed > 0 {
        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            for log in &kept {
                serde_json::to_writer(&mut writer, log)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!("Rewrote WAL with {} dose logs", kept.len());
    }

    lock.unlock()?;
    Ok(removed)
}
