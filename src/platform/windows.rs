//! Directory symlinks and junctions on Windows
//!
//! A directory symlink needs Developer Mode or elevation. When that is
//! refused the adapter falls back to an NTFS junction via `mklink /J`, which
//! any user may create. Both are reparse points, so detection looks at the
//! file attributes rather than trusting `is_dir()`.

use std::fs;
use std::os::windows::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use super::{LinkAdapter, commit_staged, prepare_alias_location, staging_path};
use crate::error::{LabError, Result};
use crate::process;

const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;

/// ERROR_PRIVILEGE_NOT_HELD
const PRIVILEGE_NOT_HELD: i32 = 1314;

#[derive(Debug, Clone, Copy)]
pub struct WindowsLinks {
    timeout: Duration,
}

impl WindowsLinks {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn create_junction(&self, path: &Path, target: &Path) -> Result<()> {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg("mklink").arg("/J").arg(path).arg(target);
        process::run(cmd, self.timeout).map_err(|e| match e {
            LabError::CommandFailed { stderr, .. } => LabError::PlatformUnsupported {
                reason: format!("mklink /J failed: {stderr}"),
            },
            other => other,
        })
    }
}

impl LinkAdapter for WindowsLinks {
    fn name(&self) -> &'static str {
        "junction"
    }

    fn alias_target(&self, path: &Path) -> Result<Option<PathBuf>> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LabError::io_at(path, &e)),
        };
        let reparse = metadata.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0;
        if !metadata.file_type().is_symlink() && !reparse {
            return Ok(None);
        }
        fs::read_link(path)
            .map(Some)
            .map_err(|e| LabError::io_at(path, &e))
    }

    fn create_alias(&self, path: &Path, target: &Path) -> Result<()> {
        prepare_alias_location(path)?;
        let staging = staging_path(path)?;
        let _ = fs::remove_dir(&staging);

        match std::os::windows::fs::symlink_dir(target, &staging) {
            Ok(()) => {}
            Err(e)
                if e.raw_os_error() == Some(PRIVILEGE_NOT_HELD)
                    || e.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                tracing::debug!("symlink privilege missing, falling back to junction");
                self.create_junction(&staging, target)?;
            }
            Err(e) => return Err(LabError::io_at(path, &e)),
        }

        if let Err(e) = commit_staged(&staging, path) {
            let _ = fs::remove_dir(&staging);
            return Err(e);
        }
        tracing::debug!(link = %path.display(), target = %target.display(), "created alias");
        Ok(())
    }

    fn remove_alias(&self, path: &Path) -> Result<()> {
        if self.alias_target(path)?.is_none() {
            return Err(LabError::NotAnAlias {
                path: path.display().to_string(),
            });
        }
        // Directory reparse points are removed with remove_dir; the target is untouched
        fs::remove_dir(path)
            .or_else(|_| fs::remove_file(path))
            .map_err(|e| LabError::io_at(path, &e))
    }
}
