//! Lock file management for single-instance enforcement.
//!
//! The lock lives at `$XDG_RUNTIME_DIR/houselights.lock` and holds the PID of the
//! running daemon, which `reload` and `stop` use to find it.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::common::utils;

pub fn get_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("houselights.lock")
}

/// Held for the lifetime of the daemon. The lock is released when the file is closed.
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    /// Unlock and remove the lock file.
    pub fn release(self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Try to become the single running instance.
///
/// Returns `Ok(None)` when another live instance holds the lock. A lock left behind
/// by a dead process is taken over.
pub fn acquire_lock() -> Result<Option<LockFile>> {
    acquire_lock_at(get_lock_path())
}

pub fn acquire_lock_at(path: PathBuf) -> Result<Option<LockFile>> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .with_context(|| format!("Failed to open lock file {}", path.display()))?;

    if file.try_lock_exclusive().is_err() {
        if let Some(pid) = read_lock_pid(&path)
            && utils::is_process_running(pid)
        {
            return Ok(None);
        }
        // Stale lock: holder is gone but the lock is still held by something else
        anyhow::bail!(
            "Lock file {} is held but no running instance was found",
            path.display()
        );
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()?;

    Ok(Some(LockFile { file, path }))
}

fn read_lock_pid(path: &PathBuf) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()?
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
}

/// PID of the running instance, if there is one.
pub fn read_running_pid() -> Option<u32> {
    let pid = read_lock_pid(&get_lock_path())?;
    utils::is_process_running(pid).then_some(pid)
}
