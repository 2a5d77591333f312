//! Read-only view of the whole environment

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::LabConfig;
use crate::error::Result;
use crate::git::{self, ChangeKind};
use crate::installer;
use crate::manifest::{self, PackageEntry};
use crate::platform::{AliasState, LinkAdapter};
use crate::workspace::{self, WorkspaceHealth, WorkspaceKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentReport {
    pub stable: WorkspaceHealth,
    pub experimental: WorkspaceHealth,
    pub global_link: GlobalLinkReport,
    pub working_copy: WorkingCopy,
    pub packages: Vec<PackageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalLinkReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub state: AliasState,
}

/// Experimental's working tree relative to its last commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkingCopy {
    Missing,
    Unreadable {
        message: String,
    },
    Status {
        branch: Option<String>,
        clean: bool,
        /// Tracked paths with staged or unstaged differences
        modified: Vec<String>,
        /// Top-level directories that git does not track yet
        untracked_packages: Vec<String>,
        /// Untracked files directly under the root
        untracked_files: Vec<String>,
    },
}

pub struct StatusInspector<'a> {
    config: &'a LabConfig,
    links: &'a dyn LinkAdapter,
}

impl<'a> StatusInspector<'a> {
    pub fn new(config: &'a LabConfig, links: &'a dyn LinkAdapter) -> Self {
        Self { config, links }
    }

    #[tracing::instrument(skip(self))]
    pub fn inspect(&self) -> Result<EnvironmentReport> {
        let stable = workspace::check_health(self.config, WorkspaceKind::Stable);
        let experimental = workspace::check_health(self.config, WorkspaceKind::Experimental);

        let global_link = GlobalLinkReport {
            path: self.config.global_link.clone(),
            state: self
                .links
                .classify(&self.config.global_link, &self.config.stable_root)?,
        };

        let working_copy = if experimental.exists {
            self.working_copy()
        } else {
            WorkingCopy::Missing
        };

        let packages = if experimental.exists {
            manifest::list_packages(&self.config.experimental_root, &self.config.package_manifest)?
        } else {
            Vec::new()
        };

        Ok(EnvironmentReport {
            stable,
            experimental,
            global_link,
            working_copy,
            packages,
        })
    }

    fn working_copy(&self) -> WorkingCopy {
        let root = &self.config.experimental_root;
        let result = git::open_at(root).and_then(|repo| {
            let branch = git::head_branch(&repo);
            git::changes(&repo).map(|changes| (branch, changes))
        });
        let (branch, changes) = match result {
            Ok(v) => v,
            Err(err) => {
                return WorkingCopy::Unreadable {
                    message: err.to_string(),
                };
            }
        };

        let mut modified = Vec::new();
        let mut untracked_packages = BTreeSet::new();
        let mut untracked_files = Vec::new();
        for change in &changes {
            if !change.untracked {
                modified.push(change.path.clone());
                continue;
            }
            debug_assert_eq!(change.kind, ChangeKind::Added);
            match change.path.split_once('/') {
                Some((top, _)) => {
                    untracked_packages.insert(top.to_string());
                }
                None => untracked_files.push(change.path.clone()),
            }
        }

        WorkingCopy::Status {
            branch,
            clean: changes.is_empty(),
            modified,
            untracked_packages: untracked_packages.into_iter().collect(),
            untracked_files,
        }
    }
}

/// Variables that point tools at the experimental environment
///
/// Ordered for stable output.
pub fn environment_variables(config: &LabConfig) -> Vec<(&'static str, String)> {
    let env_dir = config.env_dir(&config.experimental_root);
    vec![
        (
            "EXPERIMENTAL_PYTHON",
            installer::python_in(&env_dir).display().to_string(),
        ),
        (
            "EXPERIMENTAL_PIP",
            installer::pip_in(&env_dir).display().to_string(),
        ),
        ("EXPERIMENTAL_VENV", env_dir.display().to_string()),
        (
            "EXPERIMENTAL_PATH",
            config.experimental_root.display().to_string(),
        ),
        ("STABLE_PATH", config.stable_root.display().to_string()),
    ]
}
