//! Project file inventory

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::{DirEntry, WalkDir};
use wax::{CandidatePath, Glob, Pattern};

use crate::config::ScanConfig;
use crate::error::{LabError, Result};

use super::catalog;

const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    ".claude",
    "dist",
    "build",
    "target",
    "out",
    ".next",
    ".nuxt",
    ".cache",
];

const IGNORED_EXTENSIONS: &[&str] = &[
    ".exe", ".dll", ".so", ".dylib", ".jpg", ".jpeg", ".png", ".gif", ".ico", ".svg", ".mp3",
    ".mp4", ".wav", ".avi", ".zip", ".tar", ".gz", ".rar", ".lock", ".log",
];

/// What a project is made of
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectInventory {
    pub root: PathBuf,
    /// Lowercased extension with its leading dot mapped to file count
    pub extensions: BTreeMap<String, usize>,
    /// Ecosystem marker file names seen anywhere in the scan
    pub markers: BTreeSet<String>,
    pub total_files: usize,
    /// The walk stopped at `max_files`
    pub truncated: bool,
}

impl ProjectInventory {
    /// Build an inventory from known counts without touching the filesystem
    pub fn from_counts<'a>(
        extensions: impl IntoIterator<Item = (&'a str, usize)>,
        markers: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let extensions: BTreeMap<String, usize> = extensions
            .into_iter()
            .map(|(ext, count)| (normalize_extension(ext), count))
            .collect();
        Self {
            root: PathBuf::new(),
            total_files: extensions.values().sum(),
            extensions,
            markers: markers.into_iter().map(str::to_string).collect(),
            truncated: false,
        }
    }

    /// Extensions ordered by count, most frequent first
    pub fn ranked_extensions(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .extensions
            .iter()
            .map(|(ext, count)| (ext.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Walk `root` and count file extensions
///
/// Version-control, editor, build-output and environment directories are
/// pruned along with every hidden entry.
#[tracing::instrument(skip(scan))]
pub fn scan(root: &Path, scan: &ScanConfig) -> Result<ProjectInventory> {
    if !root.is_dir() {
        return Err(LabError::InvalidProjectPath {
            path: root.display().to_string(),
        });
    }

    let globs = scan
        .ignore
        .iter()
        .map(|pattern| {
            Glob::new(pattern).map_err(|err| LabError::ConfigInvalid {
                message: format!("scan ignore pattern '{pattern}': {err}"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let ignored = |entry: &DirEntry| -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if is_hidden(&name) {
            return true;
        }
        if entry.file_type().is_dir() && IGNORED_DIRS.contains(&&*name) {
            return true;
        }
        let rel = relative(root, entry.path());
        let candidate = CandidatePath::from(rel.as_str());
        globs.iter().any(|glob| glob.matched(&candidate).is_some())
    };

    let mut inventory = ProjectInventory {
        root: root.to_path_buf(),
        ..ProjectInventory::default()
    };

    let walker = WalkDir::new(root)
        .max_depth(scan.max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !ignored(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(%err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if inventory.total_files >= scan.max_files {
            inventory.truncated = true;
            break;
        }

        let name = entry.file_name().to_string_lossy();
        if catalog::is_marker(&name) {
            inventory.markers.insert(name.to_string());
        }

        let Some(ext) = entry.path().extension() else {
            continue;
        };
        let ext = normalize_extension(&ext.to_string_lossy());
        if IGNORED_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        *inventory.extensions.entry(ext).or_insert(0) += 1;
        inventory.total_files += 1;
    }

    tracing::debug!(
        files = inventory.total_files,
        extensions = inventory.extensions.len(),
        truncated = inventory.truncated,
        "scanned project"
    );
    Ok(inventory)
}
