//! Advisory lock on the shared repository
//!
//! Both workspaces share one git directory, so the lock file lives there and
//! serializes every sync regardless of which working tree it starts from.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fslock::LockFile;

use crate::error::{LabError, Result};

/// Lock file name inside the common git directory
pub const LOCK_FILE: &str = "skill-lab.lock";

const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// RAII guard for the repository lock
///
/// Released on drop. The file itself is left in place so that every process
/// locks the same inode.
#[derive(Debug)]
pub struct RepoGuard {
    lock: LockFile,
    lock_path: PathBuf,
}

impl RepoGuard {
    /// Acquire the lock, waiting up to `timeout`
    pub fn acquire(git_dir: &Path, timeout: Duration) -> Result<Self> {
        let lock_path = git_dir.join(LOCK_FILE);
        let mut lock = LockFile::open(&lock_path).map_err(|e| LabError::io_at(&lock_path, &e))?;

        let deadline = Instant::now() + timeout;
        loop {
            if lock.try_lock().map_err(|e| LabError::io_at(&lock_path, &e))? {
                tracing::debug!(path = %lock_path.display(), "repository lock acquired");
                return Ok(Self { lock, lock_path });
            }
            if Instant::now() >= deadline {
                return Err(LabError::OperationTimedOut {
                    operation: "Waiting for the repository lock".to_string(),
                    timeout,
                });
            }
            thread::sleep(RETRY_INTERVAL);
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for RepoGuard {
    fn drop(&mut self) {
        let _ = self.lock.unlock();
    }
}
