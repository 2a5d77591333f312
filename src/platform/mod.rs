//! Directory aliases (symbolic links and junctions)
//!
//! [`LinkAdapter`] is the one seam between the lab and the host filesystem's
//! link primitives. An implementation is picked once by [`native`] and passed
//! by reference to every component that needs it.
//!
//! Aliases are created under a temporary sibling name and renamed into place,
//! so a concurrent [`LinkAdapter::classify`] sees either nothing or a finished
//! alias.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::{LabError, Result};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::UnixLinks;
#[cfg(windows)]
pub use windows::WindowsLinks;

/// What currently occupies a path that should hold an alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AliasState {
    Absent,
    RealDirectory,
    /// A regular file (or other non-directory entry) is in the way
    RealFile,
    /// Alias resolving to the expected target
    ManagedAlias { target: PathBuf },
    /// Alias resolving anywhere else, including dangling aliases
    ForeignAlias { target: PathBuf },
}

impl AliasState {
    pub fn is_alias(&self) -> bool {
        matches!(
            self,
            AliasState::ManagedAlias { .. } | AliasState::ForeignAlias { .. }
        )
    }
}

/// Platform capability for creating, removing and inspecting aliases
pub trait LinkAdapter {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Raw target of the alias at `path`, or `None` when `path` is not an alias
    fn alias_target(&self, path: &Path) -> Result<Option<PathBuf>>;

    /// Create an alias at `path` resolving to `target`
    ///
    /// Fails with `PathOccupied` if anything already exists at `path`.
    fn create_alias(&self, path: &Path, target: &Path) -> Result<()>;

    /// Remove the alias at `path` without touching what it points to
    fn remove_alias(&self, path: &Path) -> Result<()>;

    /// Classify `path` relative to the target it is expected to alias
    fn classify(&self, path: &Path, expected: &Path) -> Result<AliasState> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AliasState::Absent),
            Err(e) => return Err(LabError::io_at(path, &e)),
        };

        if let Some(raw) = self.alias_target(path)? {
            let target = resolve_relative(path, &raw);
            let state = if same_location(&target, expected) {
                AliasState::ManagedAlias { target }
            } else {
                AliasState::ForeignAlias { target }
            };
            return Ok(state);
        }

        if metadata.is_dir() {
            Ok(AliasState::RealDirectory)
        } else {
            Ok(AliasState::RealFile)
        }
    }
}

/// Adapter for hosts without any directory alias primitive
#[derive(Debug, Default)]
pub struct UnsupportedLinks;

impl LinkAdapter for UnsupportedLinks {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn alias_target(&self, _path: &Path) -> Result<Option<PathBuf>> {
        Ok(None)
    }

    fn create_alias(&self, _path: &Path, _target: &Path) -> Result<()> {
        Err(LabError::PlatformUnsupported {
            reason: std::env::consts::OS.to_string(),
        })
    }

    fn remove_alias(&self, path: &Path) -> Result<()> {
        Err(LabError::NotAnAlias {
            path: path.display().to_string(),
        })
    }
}

/// Select the adapter for the running platform
///
/// `command_timeout` bounds helper processes some platforms need.
#[allow(unused_variables)]
pub fn native(command_timeout: Duration) -> Box<dyn LinkAdapter> {
    #[cfg(unix)]
    {
        Box::new(UnixLinks)
    }
    #[cfg(windows)]
    {
        Box::new(WindowsLinks::new(command_timeout))
    }
    #[cfg(not(any(unix, windows)))]
    {
        Box::new(UnsupportedLinks)
    }
}

/// Whether two paths name the same location
///
/// Existing paths are compared canonically; otherwise both are compared
/// after lexical normalization.
pub fn same_location(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => normalize(a) == normalize(b),
    }
}

/// Remove `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn resolve_relative(link: &Path, raw: &Path) -> PathBuf {
    if raw.is_absolute() {
        return raw.to_path_buf();
    }
    match link.parent() {
        Some(parent) => normalize(&parent.join(raw)),
        None => raw.to_path_buf(),
    }
}

/// Sibling path used while an alias is being created
pub(crate) fn staging_path(path: &Path) -> Result<PathBuf> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Err(LabError::InvalidProjectPath {
            path: path.display().to_string(),
        });
    };
    Ok(parent.join(format!(
        ".{}.{}.tmp",
        name.to_string_lossy(),
        std::process::id()
    )))
}

/// Check `path` is free and its parent exists
pub(crate) fn prepare_alias_location(path: &Path) -> Result<()> {
    if fs::symlink_metadata(path).is_ok() {
        return Err(LabError::PathOccupied {
            path: path.display().to_string(),
        });
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| LabError::io_at(parent, &e))?;
    }
    Ok(())
}

/// Move a freshly created alias from its staging name to its final name
pub(crate) fn commit_staged(staging: &Path, path: &Path) -> Result<()> {
    if fs::symlink_metadata(path).is_ok() {
        return Err(LabError::PathOccupied {
            path: path.display().to_string(),
        });
    }
    fs::rename(staging, path).map_err(|e| LabError::io_at(path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_lexical() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_same_location_existing_and_missing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("dir");
        fs::create_dir(&dir).unwrap();
        assert!(same_location(&dir, &temp.path().join("dir/../dir")));
        assert!(same_location(
            &temp.path().join("gone"),
            &temp.path().join("x/../gone")
        ));
        assert!(!same_location(&dir, &temp.path().join("other")));
    }

    #[test]
    fn test_staging_path_is_sibling() {
        let staging = staging_path(Path::new("/p/.claude/skills")).unwrap();
        assert_eq!(staging.parent(), Some(Path::new("/p/.claude")));
        assert!(
            staging
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(".skills.")
        );
    }

    #[test]
    fn test_unsupported_adapter() {
        let temp = TempDir::new().unwrap();
        let adapter = UnsupportedLinks;
        let err = adapter
            .create_alias(&temp.path().join("a"), temp.path())
            .unwrap_err();
        assert!(matches!(err, LabError::PlatformUnsupported { .. }));
        assert_eq!(
            adapter.classify(temp.path(), temp.path()).unwrap(),
            AliasState::RealDirectory
        );
    }

    #[cfg(unix)]
    mod native_links {
        use super::*;

        fn setup() -> (TempDir, PathBuf, PathBuf) {
            let temp = TempDir::new().unwrap();
            let target = temp.path().join("target");
            fs::create_dir(&target).unwrap();
            let link = temp.path().join("nested/link");
            (temp, target, link)
        }

        #[test]
        fn test_classify_absent() {
            let (_temp, target, link) = setup();
            let adapter = native(Duration::from_secs(5));
            assert_eq!(adapter.classify(&link, &target).unwrap(), AliasState::Absent);
        }

        #[test]
        fn test_create_then_classify_managed() {
            let (_temp, target, link) = setup();
            let adapter = native(Duration::from_secs(5));
            adapter.create_alias(&link, &target).unwrap();
            assert!(matches!(
                adapter.classify(&link, &target).unwrap(),
                AliasState::ManagedAlias { .. }
            ));
            // no staging leftovers next to the link
            let leftovers: Vec<_> = fs::read_dir(link.parent().unwrap())
                .unwrap()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
                .collect();
            assert!(leftovers.is_empty());
        }

        #[test]
        fn test_classify_foreign_and_dangling() {
            let (temp, target, link) = setup();
            let elsewhere = temp.path().join("elsewhere");
            fs::create_dir(&elsewhere).unwrap();
            let adapter = native(Duration::from_secs(5));
            adapter.create_alias(&link, &elsewhere).unwrap();
            assert_eq!(
                adapter.classify(&link, &target).unwrap(),
                AliasState::ForeignAlias { target: elsewhere.clone() }
            );

            fs::remove_dir(&elsewhere).unwrap();
            assert!(matches!(
                adapter.classify(&link, &target).unwrap(),
                AliasState::ForeignAlias { .. }
            ));
        }

        #[test]
        fn test_relative_alias_is_resolved() {
            let (temp, target, _) = setup();
            let link = temp.path().join("rel");
            std::os::unix::fs::symlink("target", &link).unwrap();
            let adapter = native(Duration::from_secs(5));
            assert!(matches!(
                adapter.classify(&link, &target).unwrap(),
                AliasState::ManagedAlias { .. }
            ));
        }

        #[test]
        fn test_real_directory_and_file() {
            let (temp, target, _) = setup();
            let file = temp.path().join("file");
            fs::write(&file, "x").unwrap();
            let adapter = native(Duration::from_secs(5));
            assert_eq!(
                adapter.classify(&target, &target).unwrap(),
                AliasState::RealDirectory
            );
            assert_eq!(adapter.classify(&file, &target).unwrap(), AliasState::RealFile);
        }

        #[test]
        fn test_create_refuses_occupied_path() {
            let (_temp, target, link) = setup();
            fs::create_dir_all(&link).unwrap();
            let adapter = native(Duration::from_secs(5));
            let err = adapter.create_alias(&link, &target).unwrap_err();
            assert!(matches!(err, LabError::PathOccupied { .. }));
            assert!(link.is_dir());
        }

        #[test]
        fn test_remove_alias_keeps_target() {
            let (_temp, target, link) = setup();
            fs::write(target.join("keep.txt"), "data").unwrap();
            let adapter = native(Duration::from_secs(5));
            adapter.create_alias(&link, &target).unwrap();
            adapter.remove_alias(&link).unwrap();
            assert!(fs::symlink_metadata(&link).is_err());
            assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "data");
        }

        #[test]
        fn test_remove_real_directory_is_refused() {
            let (_temp, target, _) = setup();
            let adapter = native(Duration::from_secs(5));
            let err = adapter.remove_alias(&target).unwrap_err();
            assert!(matches!(err, LabError::NotAnAlias { .. }));
            assert!(target.is_dir());
        }
    }
}
