//! Advisory lock that keeps two sync passes from overlapping.
//!
//! The lock is a file created with `create_new`, so only one process can
//! hold it. It carries an owner token (pid, random id, start time); only the
//! holder whose token is still in the file removes it on drop. A running
//! pass calls [`PassLock::refresh`] between entries, so a lock file that has
//! not been touched for [`STALE_AFTER`] belongs to a crashed pass and is
//! replaced.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::SyncError;

pub const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
pub struct PassLock {
    path: PathBuf,
    token: String,
}

impl PassLock {
    pub fn acquire(path: &Path) -> Result<Self, SyncError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SyncError::Lock)?;
        }

        match Self::create(path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Self::take_over_stale(path)
            }
            Err(e) => Err(SyncError::Lock(e)),
        }
    }

    fn take_over_stale(path: &Path) -> Result<Self, SyncError> {
        let busy = || SyncError::AlreadyRunning(path.to_path_buf());

        let Some(stale_token) = read_token(path) else {
            // Released between our attempt and now.
            return Self::create(path).map_err(|e| lock_error(path, e));
        };
        if !is_stale(path) {
            return Err(busy());
        }
        // Another process may have replaced the stale file in the meantime.
        if read_token(path).as_deref() != Some(stale_token.as_str()) {
            return Err(busy());
        }

        tracing::warn!(path = %path.display(), holder = %stale_token, "replacing stale sync lock");
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SyncError::Lock(e)),
        }
        Self::create(path).map_err(|e| lock_error(path, e))
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let token = format!(
            "{} {} {}",
            std::process::id(),
            uuid::Uuid::new_v4(),
            chrono::Utc::now().to_rfc3339()
        );
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(file, "{token}")?;
        Ok(Self {
            path: path.to_path_buf(),
            token,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the lock file still carries this holder's token.
    pub fn is_held(&self) -> bool {
        read_token(&self.path).as_deref() == Some(self.token.as_str())
    }

    /// Touch the lock file so a long pass is not mistaken for a crashed one.
    pub fn refresh(&self) {
        if !self.is_held() {
            tracing::warn!(path = %self.path.display(), "sync lock was taken over by another pass");
            return;
        }
        let touched = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .and_then(|file| file.set_modified(SystemTime::now()));
        if let Err(e) = touched {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to refresh sync lock");
        }
    }
}

impl Drop for PassLock {
    fn drop(&mut self) {
        if !self.is_held() {
            tracing::warn!(path = %self.path.display(), "sync lock no longer ours, leaving it");
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release sync lock");
        }
    }
}

fn read_token(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| content.trim_end().to_string())
}

fn lock_error(path: &Path, e: std::io::Error) -> SyncError {
    if e.kind() == std::io::ErrorKind::AlreadyExists {
        SyncError::AlreadyRunning(path.to_path_buf())
    } else {
        SyncError::Lock(e)
    }
}

fn is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age > STALE_AFTER)
}
