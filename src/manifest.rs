//! Package manifests
//!
//! A package is a directory holding a `SKILL.md` whose YAML frontmatter names
//! it and describes it. Keys other than `name` and `description` are kept as
//! opaque YAML values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{LabError, Result};

/// Directory names that are never packages
const NOT_PACKAGES: &[&str] = &["__pycache__", "node_modules"];

/// A parsed package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// One directory found while enumerating a workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageEntry {
    Valid(Package),
    ManifestError {
        directory: String,
        path: PathBuf,
        reason: String,
    },
}

impl PackageEntry {
    pub fn package(&self) -> Option<&Package> {
        match self {
            PackageEntry::Valid(p) => Some(p),
            PackageEntry::ManifestError { .. } => None,
        }
    }
}

#[derive(Deserialize)]
struct Frontmatter {
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// Split `content` into its YAML frontmatter and body
///
/// Returns `None` when the first line is not `---` or the block is never
/// closed.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim() != "---" {
        return None;
    }
    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim() == "---" {
            let yaml = &content[start..offset];
            let body = &content[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parse manifest text for the package living at `dir`
pub fn parse_manifest(content: &str, dir: &Path) -> std::result::Result<Package, String> {
    let (yaml, _) = split_frontmatter(content).ok_or("missing '---' frontmatter block")?;
    let frontmatter: Frontmatter = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;

    let name = frontmatter
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or("frontmatter has no 'name'")?;

    Ok(Package {
        name,
        description: frontmatter.description.unwrap_or_default().trim().to_string(),
        path: dir.to_path_buf(),
        extra: frontmatter.extra,
    })
}

/// Load the package in `dir`
pub fn load_package(dir: &Path, manifest_name: &str) -> Result<Package> {
    let manifest = dir.join(manifest_name);
    let content = fs::read_to_string(&manifest).map_err(|e| LabError::ManifestInvalid {
        path: manifest.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_manifest(&content, dir).map_err(|reason| LabError::ManifestInvalid {
        path: manifest.display().to_string(),
        reason,
    })
}

/// Whether a top-level directory name can hold a package
pub fn is_candidate_dir(name: &str) -> bool {
    !name.starts_with('.') && !NOT_PACKAGES.contains(&name)
}

/// Enumerate the package directories directly under `root`, sorted by name
pub fn list_packages(root: &Path, manifest_name: &str) -> Result<Vec<PackageEntry>> {
    let read = fs::read_dir(root).map_err(|e| LabError::io_at(root, &e))?;
    let mut dirs: Vec<(String, PathBuf)> = Vec::new();
    for entry in read {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_candidate_dir(&name) || !entry.path().is_dir() {
            continue;
        }
        dirs.push((name, entry.path()));
    }
    dirs.sort();

    Ok(dirs
        .into_iter()
        .map(|(directory, path)| match load_package(&path, manifest_name) {
            Ok(package) => PackageEntry::Valid(package),
            Err(err) => {
                tracing::debug!(%directory, %err, "package manifest unusable");
                let reason = match err {
                    LabError::ManifestInvalid { reason, .. } => reason,
                    other => other.to_string(),
                };
                PackageEntry::ManifestError {
                    directory,
                    path,
                    reason,
                }
            }
        })
        .collect())
}

/// Only the packages whose manifests parsed
pub fn valid_packages(entries: &[PackageEntry]) -> Vec<Package> {
    entries
        .iter()
        .filter_map(PackageEntry::package)
        .cloned()
        .collect()
}
