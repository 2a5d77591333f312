//! Stable and experimental workspaces
//!
//! Stable is an ordinary repository on the primary branch. Experimental is a
//! linked worktree of the same repository on the secondary branch, so both
//! directories always share one commit graph.
//!
//! [`Provisioner::provision`] converges the filesystem towards that layout.
//! Each step checks before it acts, so running it again after success only
//! reports [`StepStatus::AlreadySatisfied`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::LabConfig;
use crate::error::{ErrorKind, LabError, Result};
use crate::git;
use crate::installer::DependencyInstaller;
use crate::platform::{AliasState, LinkAdapter};

const README: &str = "# Skills\n\n\
Stable skills workspace managed by skill-lab.\n\n\
Develop in the experimental workspace and run `skill-lab sync` to promote changes here.\n";

const RESTORE_MESSAGE: &str = "Restore packages from backup during worktree conversion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceKind {
    Stable,
    Experimental,
}

impl WorkspaceKind {
    pub fn label(self) -> &'static str {
        match self {
            WorkspaceKind::Stable => "Stable",
            WorkspaceKind::Experimental => "Experimental",
        }
    }

    pub fn root(self, config: &LabConfig) -> &Path {
        match self {
            WorkspaceKind::Stable => &config.stable_root,
            WorkspaceKind::Experimental => &config.experimental_root,
        }
    }

    pub fn expected_branch(self, config: &LabConfig) -> &str {
        match self {
            WorkspaceKind::Stable => &config.primary_branch,
            WorkspaceKind::Experimental => &config.secondary_branch,
        }
    }
}

/// Read-only health flags of one workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceHealth {
    pub kind: WorkspaceKind,
    pub root: PathBuf,
    pub exists: bool,
    pub is_repository: bool,
    /// Experimental only: linked worktree of stable's repository
    pub shares_history: bool,
    pub branch: Option<String>,
    pub on_expected_branch: bool,
    pub has_environment: bool,
}

impl WorkspaceHealth {
    pub fn is_healthy(&self) -> bool {
        self.exists && self.is_repository && self.shares_history && self.on_expected_branch
    }
}

/// Inspect a workspace without changing anything
pub fn check_health(config: &LabConfig, kind: WorkspaceKind) -> WorkspaceHealth {
    let root = kind.root(config);
    let exists = root.is_dir();
    let repo = if exists { git::open_at(root).ok() } else { None };
    let branch = repo.as_ref().and_then(git::head_branch);

    let shares_history = match (kind, &repo) {
        (WorkspaceKind::Stable, Some(r)) => !r.is_worktree(),
        (WorkspaceKind::Experimental, Some(r)) => git::open_at(&config.stable_root)
            .map(|stable| git::shares_history(&stable, r))
            .unwrap_or(false),
        (_, None) => false,
    };

    WorkspaceHealth {
        kind,
        root: root.to_path_buf(),
        exists,
        is_repository: repo.is_some(),
        shares_history,
        on_expected_branch: branch.as_deref() == Some(kind.expected_branch(config)),
        branch,
        has_environment: config.env_dir(root).is_dir(),
    }
}

/// Provisioning steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    StableRepository,
    ExperimentalWorktree,
    GlobalLink,
    Environments,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::StableRepository,
        Step::ExperimentalWorktree,
        Step::GlobalLink,
        Step::Environments,
    ];

    pub fn describe(self) -> &'static str {
        match self {
            Step::StableRepository => "stable repository",
            Step::ExperimentalWorktree => "experimental worktree",
            Step::GlobalLink => "global link",
            Step::Environments => "dependency environments",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    AlreadySatisfied,
    Applied { detail: String },
    Skipped { reason: String },
    Failed { kind: ErrorKind, message: String },
    /// An earlier step failed
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: Step,
    #[serde(flatten)]
    pub status: StepStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub steps: Vec<StepReport>,
}

impl ProvisionReport {
    pub fn status_of(&self, step: Step) -> Option<&StepStatus> {
        self.steps.iter().find(|s| s.step == step).map(|s| &s.status)
    }

    pub fn failure(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|s| matches!(s.status, StepStatus::Failed { .. }))
    }

    /// Nothing left to do: no step applied, skipped or failed
    pub fn is_converged(&self) -> bool {
        self.steps
            .iter()
            .all(|s| s.status == StepStatus::AlreadySatisfied)
    }

    pub fn succeeded(&self) -> bool {
        self.failure().is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    /// Back up and convert an experimental directory that is not a worktree
    pub adopt_existing: bool,
    pub skip_environments: bool,
}

/// Converges both workspaces, the global link and the environments
pub struct Provisioner<'a> {
    config: &'a LabConfig,
    links: &'a dyn LinkAdapter,
    installer: &'a dyn DependencyInstaller,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        config: &'a LabConfig,
        links: &'a dyn LinkAdapter,
        installer: &'a dyn DependencyInstaller,
    ) -> Self {
        Self {
            config,
            links,
            installer,
        }
    }

    /// Run every step in order, stopping at the first failure
    #[tracing::instrument(skip(self))]
    pub fn provision(&self, options: ProvisionOptions) -> ProvisionReport {
        let mut report = ProvisionReport::default();
        let mut failed = false;

        for step in Step::ALL {
            let status = if failed {
                StepStatus::NotAttempted
            } else {
                match self.run_step(step, options) {
                    Ok(status) => status,
                    Err(err) => {
                        tracing::warn!(step = step.describe(), %err, "provisioning step failed");
                        failed = true;
                        StepStatus::Failed {
                            kind: err.kind(),
                            message: err.to_string(),
                        }
                    }
                }
            };
            tracing::debug!(step = step.describe(), ?status);
            report.steps.push(StepReport { step, status });
        }

        report
    }

    fn run_step(&self, step: Step, options: ProvisionOptions) -> Result<StepStatus> {
        match step {
            Step::StableRepository => self.ensure_stable(),
            Step::ExperimentalWorktree => self.ensure_experimental(options.adopt_existing),
            Step::GlobalLink => self.ensure_global_link(),
            Step::Environments if options.skip_environments => Ok(StepStatus::Skipped {
                reason: "environment creation disabled".to_string(),
            }),
            Step::Environments => self.ensure_environments(),
        }
    }

    fn ensure_stable(&self) -> Result<StepStatus> {
        let root = &self.config.stable_root;
        let primary = &self.config.primary_branch;

        match fs::symlink_metadata(root) {
            Ok(meta) if !meta.is_dir() => {
                return Err(LabError::PathOccupied {
                    path: root.display().to_string(),
                });
            }
            Ok(_) => {}
            Err(_) => fs::create_dir_all(root).map_err(|e| LabError::io_at(root, &e))?,
        }

        if let Ok(repo) = git::open_at(root) {
            if repo.is_worktree() {
                return Err(LabError::ConfigInvalid {
                    message: format!("{} is a linked worktree, not a repository", root.display()),
                });
            }
            let branch = git::head_branch(&repo).unwrap_or_default();
            if git::has_commits(&repo) {
                if &branch != primary {
                    return Err(LabError::UnexpectedBranch {
                        workspace: WorkspaceKind::Stable.label().to_string(),
                        expected: primary.clone(),
                        actual: branch,
                    });
                }
                return Ok(StepStatus::AlreadySatisfied);
            }
            // Repository without history: give it the initial commit
            if &branch != primary {
                repo.set_head(&format!("refs/heads/{primary}"))?;
            }
            self.write_seed_files(root)?;
            git::commit_all(&repo, "Initial commit")?;
            return Ok(StepStatus::Applied {
                detail: format!("created initial commit on {primary}"),
            });
        }

        let repo = git::init(root, primary)?;
        self.write_seed_files(root)?;
        git::commit_all(&repo, "Initial commit")?;
        tracing::info!(root = %root.display(), "initialized stable repository");
        Ok(StepStatus::Applied {
            detail: format!("initialized repository on {primary}"),
        })
    }

    fn write_seed_files(&self, root: &Path) -> Result<()> {
        let readme = root.join("README.md");
        if !readme.exists() {
            fs::write(&readme, README).map_err(|e| LabError::io_at(&readme, &e))?;
        }
        let gitignore = root.join(".gitignore");
        if !gitignore.exists() {
            let content = format!(
                "{}/\n__pycache__/\n*.pyc\n.DS_Store\n",
                self.config.env_dir_name
            );
            fs::write(&gitignore, content).map_err(|e| LabError::io_at(&gitignore, &e))?;
        }
        Ok(())
    }

    fn ensure_experimental(&self, adopt_existing: bool) -> Result<StepStatus> {
        let root = &self.config.experimental_root;
        let secondary = &self.config.secondary_branch;
        let stable = git::open_at(&self.config.stable_root)?;

        let created_branch =
            git::ensure_branch(&stable, secondary, &self.config.primary_branch)?;

        if fs::symlink_metadata(root).is_ok() {
            if let Ok(existing) = git::open_at(root) {
                if git::shares_history(&stable, &existing) {
                    let branch = git::head_branch(&existing).unwrap_or_default();
                    if &branch != secondary {
                        return Err(LabError::UnexpectedBranch {
                            workspace: WorkspaceKind::Experimental.label().to_string(),
                            expected: secondary.clone(),
                            actual: branch,
                        });
                    }
                    return Ok(if created_branch {
                        StepStatus::Applied {
                            detail: format!("created branch {secondary}"),
                        }
                    } else {
                        StepStatus::AlreadySatisfied
                    });
                }
            }

            if is_empty_dir(root) {
                fs::remove_dir(root).map_err(|e| LabError::io_at(root, &e))?;
            } else if adopt_existing {
                return self.adopt(&stable, root);
            } else {
                return Err(LabError::ExperimentalOccupied {
                    path: root.display().to_string(),
                });
            }
        }

        git::prune_stale_worktrees(&stable)?;
        if let Some(parent) = root.parent() {
            fs::create_dir_all(parent).map_err(|e| LabError::io_at(parent, &e))?;
        }
        git::add_worktree(&stable, root, secondary)?;
        Ok(StepStatus::Applied {
            detail: format!("created worktree on {secondary}"),
        })
    }

    /// Move `root` aside, create the worktree and copy packages back in
    ///
    /// If the worktree cannot be created the original directory is moved back.
    /// Failures after that point name the backup in the error.
    fn adopt(&self, stable: &git2::Repository, root: &Path) -> Result<StepStatus> {
        let backup = backup_path(root)?;
        fs::rename(root, &backup).map_err(|e| LabError::io_at(root, &e))?;
        tracing::info!(backup = %backup.display(), "moved existing experimental directory aside");

        let worktree = match git::prune_stale_worktrees(stable)
            .and_then(|_| git::add_worktree(stable, root, &self.config.secondary_branch))
        {
            Ok(worktree) => worktree,
            Err(err) => return Err(restore_backup(root, &backup, err)),
        };

        let restored = self
            .restore_packages(&worktree, &backup, root)
            .map_err(|err| LabError::AdoptIncomplete {
                path: root.display().to_string(),
                backup: backup.display().to_string(),
                reason: err.to_string(),
            })?;

        Ok(StepStatus::Applied {
            detail: format!(
                "converted to worktree (backup at {}, restored {} package(s){})",
                backup.display(),
                restored.len(),
                if restored.is_empty() {
                    String::new()
                } else {
                    format!(": {}", restored.join(", "))
                }
            ),
        })
    }

    /// Copy every package directory from `backup` into the new worktree
    fn restore_packages(
        &self,
        worktree: &git2::Repository,
        backup: &Path,
        root: &Path,
    ) -> Result<Vec<String>> {
        let mut restored = Vec::new();
        for entry in fs::read_dir(backup).map_err(|e| LabError::io_at(backup, &e))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let source = entry.path();
            if !crate::manifest::is_candidate_dir(&name)
                || !source.join(&self.config.package_manifest).is_file()
            {
                continue;
            }
            let dest = root.join(&name);
            if dest.exists() {
                continue;
            }
            copy_tree(&source, &dest)?;
            restored.push(name);
        }

        if !restored.is_empty() {
            git::commit_all(worktree, RESTORE_MESSAGE)?;
        }
        restored.sort();
        Ok(restored)
    }

    fn ensure_global_link(&self) -> Result<StepStatus> {
        let link = &self.config.global_link;
        let stable = &self.config.stable_root;
        match self.links.classify(link, stable)? {
            AliasState::Absent => {
                self.links.create_alias(link, stable)?;
                tracing::info!(link = %link.display(), "created global link");
                Ok(StepStatus::Applied {
                    detail: format!("{} -> {}", link.display(), stable.display()),
                })
            }
            AliasState::ManagedAlias { .. } => Ok(StepStatus::AlreadySatisfied),
            AliasState::ForeignAlias { target } => Err(LabError::GlobalLinkForeign {
                path: link.display().to_string(),
                target: target.display().to_string(),
            }),
            AliasState::RealDirectory | AliasState::RealFile => Err(LabError::GlobalLinkBlocked {
                path: link.display().to_string(),
            }),
        }
    }

    fn ensure_environments(&self) -> Result<StepStatus> {
        let mut created = Vec::new();
        for kind in [WorkspaceKind::Stable, WorkspaceKind::Experimental] {
            let env_dir = self.config.env_dir(kind.root(self.config));
            if env_dir.is_dir() {
                continue;
            }
            self.installer.create_environment(&env_dir)?;
            created.push(kind.label().to_lowercase());
        }
        if created.is_empty() {
            Ok(StepStatus::AlreadySatisfied)
        } else {
            Ok(StepStatus::Applied {
                detail: format!("created {} environment(s)", created.join(" and ")),
            })
        }
    }
}

/// Put the backed-up directory back after a failed conversion
fn restore_backup(root: &Path, backup: &Path, cause: LabError) -> LabError {
    if is_empty_dir(root) {
        let _ = fs::remove_dir(root);
    }
    match fs::rename(backup, root) {
        Ok(()) => {
            tracing::warn!(
                root = %root.display(),
                %cause,
                "worktree conversion failed, original directory restored"
            );
            cause
        }
        Err(e) => LabError::AdoptIncomplete {
            path: root.display().to_string(),
            backup: backup.display().to_string(),
            reason: format!("{cause}; moving the backup back failed: {e}"),
        },
    }
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_none())
}

fn backup_path(root: &Path) -> Result<PathBuf> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LabError::ConfigInvalid {
            message: format!("{} has no directory name", root.display()),
        })?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut candidate = root.with_file_name(format!("{name}_backup_{stamp}"));
    let mut n = 1;
    while candidate.exists() {
        candidate = root.with_file_name(format!("{name}_backup_{stamp}_{n}"));
        n += 1;
    }
    Ok(candidate)
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| LabError::Io {
            message: e.to_string(),
        })?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| LabError::io_at(&target, &e))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| LabError::io_at(&target, &e))?;
        }
    }
    Ok(())
}
