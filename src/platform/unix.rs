//! Symbolic links on Unix hosts

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use super::{LinkAdapter, commit_staged, prepare_alias_location, staging_path};
use crate::error::{LabError, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct UnixLinks;

impl LinkAdapter for UnixLinks {
    fn name(&self) -> &'static str {
        "symlink"
    }

    fn alias_target(&self, path: &Path) -> Result<Option<PathBuf>> {
        match fs::symlink_metadata(path) {
            Ok(m) if m.file_type().is_symlink() => fs::read_link(path)
                .map(Some)
                .map_err(|e| LabError::io_at(path, &e)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LabError::io_at(path, &e)),
        }
    }

    fn create_alias(&self, path: &Path, target: &Path) -> Result<()> {
        prepare_alias_location(path)?;
        let staging = staging_path(path)?;
        let _ = fs::remove_file(&staging);

        symlink(target, &staging).map_err(|e| LabError::io_at(path, &e))?;
        if let Err(e) = commit_staged(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        tracing::debug!(link = %path.display(), target = %target.display(), "created symlink");
        Ok(())
    }

    fn remove_alias(&self, path: &Path) -> Result<()> {
        if self.alias_target(path)?.is_none() {
            return Err(LabError::NotAnAlias {
                path: path.display().to_string(),
            });
        }
        fs::remove_file(path).map_err(|e| LabError::io_at(path, &e))?;
        tracing::debug!(link = %path.display(), "removed symlink");
        Ok(())
    }
}
