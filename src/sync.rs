//! Promote experimental work into stable
//!
//! One sync holds the repository lock from the status check through the
//! dependency reconciliation:
//!
//! 1. collect the experimental working tree's changes; none means `NoChanges`
//! 2. stage and commit everything on the secondary branch
//! 3. merge the secondary branch into stable (fast-forward when possible)
//! 4. on a clean merge, reconcile stable's dependency manifest and hand it to
//!    the installer once
//!
//! When no message is given the commit message is generated from the change
//! set:
//!
//! ```text
//! Sync from experimental: packages +A ~M -R, files +a ~m -r
//! ```
//!
//! where packages are the top-level directories that contain changes (added,
//! modified, removed) and files are counted individually.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;
use serde::Serialize;

use crate::config::LabConfig;
use crate::error::{ErrorKind, LabError, Result};
use crate::git::{self, Change, ChangeKind, MergeOutcome};
use crate::installer::DependencyInstaller;
use crate::lock::RepoGuard;
use crate::requirements::{self, DependencyChange};
use crate::workspace::WorkspaceKind;

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub message: Option<String>,
    /// Merge into stable after committing
    pub promote: bool,
    /// Run the installer for reconciled dependencies
    pub install: bool,
}

impl SyncOptions {
    pub fn new(message: Option<String>) -> Self {
        Self {
            message,
            promote: true,
            install: true,
        }
    }
}

/// Added/modified/removed counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
}

impl Counts {
    fn bump(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Added => self.added += 1,
            ChangeKind::Modified => self.modified += 1,
            ChangeKind::Removed => self.removed += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub packages: Counts,
    pub files: Counts,
}

impl ChangeSummary {
    /// Default commit message for this change set
    pub fn message(&self) -> String {
        let p = self.packages;
        let f = self.files;
        format!(
            "Sync from experimental: packages +{} ~{} -{}, files +{} ~{} -{}",
            p.added, p.modified, p.removed, f.added, f.modified, f.removed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeKind {
    FastForward,
    MergeCommit,
    /// Stable already contained the commit
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Promotion {
    /// The caller asked not to merge
    Skipped,
    /// Committed, but the merge could not run
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstallStatus {
    /// No dependency differed
    NotNeeded,
    Skipped,
    Installed,
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    /// Stable's manifest, when either workspace declares one
    pub manifest: Option<PathBuf>,
    pub changes: Vec<DependencyChange>,
    /// Stable's manifest file was rewritten
    pub rewritten: bool,
    /// Commit on the primary branch recording the rewrite
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub install: InstallStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SyncResult {
    NoChanges,
    Committed {
        commit: String,
        summary: ChangeSummary,
        promotion: Promotion,
    },
    CommittedAndMerged {
        commit: String,
        summary: ChangeSummary,
        merge: MergeKind,
        /// Id of stable's new tip
        stable_head: String,
        dependencies: DependencyReport,
    },
    MergeConflict {
        commit: String,
        summary: ChangeSummary,
        conflicts: Vec<String>,
    },
}

impl SyncResult {
    pub fn commit(&self) -> Option<&str> {
        match self {
            SyncResult::NoChanges => None,
            SyncResult::Committed { commit, .. }
            | SyncResult::CommittedAndMerged { commit, .. }
            | SyncResult::MergeConflict { commit, .. } => Some(commit),
        }
    }
}

pub struct SyncEngine<'a> {
    config: &'a LabConfig,
    installer: &'a dyn DependencyInstaller,
}

impl<'a> SyncEngine<'a> {
    pub fn new(config: &'a LabConfig, installer: &'a dyn DependencyInstaller) -> Self {
        Self { config, installer }
    }

    #[tracing::instrument(skip(self))]
    pub fn sync(&self, options: &SyncOptions) -> Result<SyncResult> {
        let experimental = self.open(WorkspaceKind::Experimental)?;
        let stable = if options.promote {
            Some(self.open(WorkspaceKind::Stable)?)
        } else {
            None
        };

        let _guard = RepoGuard::acquire(experimental.commondir(), self.config.lock_timeout)?;

        let changes = git::changes(&experimental)?;
        if changes.is_empty() {
            tracing::info!("experimental has no changes");
            return Ok(SyncResult::NoChanges);
        }

        let summary = summarize(&experimental, &self.config.experimental_root, &changes);
        let message = options
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map_or_else(|| summary.message(), ToString::to_string);

        let commit_oid = git::commit_all(&experimental, &message)?;
        let commit = commit_oid.to_string();

        let Some(stable) = stable else {
            return Ok(SyncResult::Committed {
                commit,
                summary,
                promotion: Promotion::Skipped,
            });
        };

        // From here on the commit exists; failures are reported, not raised
        match self.promote(&stable, commit_oid, &message, options) {
            Ok(Promoted::Conflicts(conflicts)) => Ok(SyncResult::MergeConflict {
                commit,
                summary,
                conflicts,
            }),
            Ok(Promoted::Merged {
                merge,
                stable_head,
                dependencies,
            }) => Ok(SyncResult::CommittedAndMerged {
                commit,
                summary,
                merge,
                stable_head,
                dependencies,
            }),
            Err(err) => {
                tracing::warn!(%err, "commit kept but promotion failed");
                Ok(SyncResult::Committed {
                    commit,
                    summary,
                    promotion: Promotion::Failed {
                        kind: err.kind(),
                        message: err.to_string(),
                    },
                })
            }
        }
    }

    /// Open a workspace and check it is on its expected branch
    fn open(&self, kind: WorkspaceKind) -> Result<Repository> {
        let root = kind.root(self.config);
        if !root.is_dir() {
            return Err(LabError::WorkspaceMissing {
                workspace: kind.label().to_string(),
                path: root.display().to_string(),
            });
        }
        let repo = git::open_at(root)?;
        let expected = kind.expected_branch(self.config);
        let actual = git::head_branch(&repo).unwrap_or_default();
        if actual != expected {
            return Err(LabError::UnexpectedBranch {
                workspace: kind.label().to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(repo)
    }

    fn promote(
        &self,
        stable: &Repository,
        theirs: git2::Oid,
        message: &str,
        options: &SyncOptions,
    ) -> Result<Promoted> {
        let stable_manifest = self.config.stable_root.join(&self.config.requirements_file);
        let before = read_optional(&stable_manifest)?;

        let subject = message.lines().next().unwrap_or_default();
        let merge_message = format!("Merge {}: {}", self.config.secondary_branch, subject);
        let (merge, mut stable_head) = match git::merge_into_head(stable, theirs, &merge_message)? {
            MergeOutcome::Conflicts(conflicts) => {
                tracing::warn!(?conflicts, "merge into stable blocked");
                return Ok(Promoted::Conflicts(conflicts));
            }
            MergeOutcome::UpToDate => (MergeKind::UpToDate, head_id(stable)?),
            MergeOutcome::FastForward(oid) => (MergeKind::FastForward, oid.to_string()),
            MergeOutcome::Merged(oid) => (MergeKind::MergeCommit, oid.to_string()),
        };
        tracing::info!(?merge, head = %stable_head, "merged into stable");

        let dependencies =
            self.reconcile_dependencies(stable, &stable_manifest, before.as_deref(), options)?;
        if let Some(commit) = &dependencies.commit {
            stable_head.clone_from(commit);
        }
        Ok(Promoted::Merged {
            merge,
            stable_head,
            dependencies,
        })
    }

    /// Compare experimental's manifest with stable's pre-merge manifest
    ///
    /// The merge usually brings the manifest over already; the pre-merge copy
    /// is what tells which entries still need installing. Stable's file is
    /// rewritten, and committed on its own, only when its post-merge content
    /// still differs.
    fn reconcile_dependencies(
        &self,
        stable: &Repository,
        stable_manifest: &Path,
        before_merge: Option<&str>,
        options: &SyncOptions,
    ) -> Result<DependencyReport> {
        let exp_manifest = self
            .config
            .experimental_root
            .join(&self.config.requirements_file);
        let Some(wanted) = read_optional(&exp_manifest)? else {
            return Ok(DependencyReport {
                manifest: None,
                changes: Vec::new(),
                rewritten: false,
                commit: None,
                install: InstallStatus::NotNeeded,
            });
        };

        let to_install = requirements::reconcile(before_merge.unwrap_or_default(), &wanted);
        let current = read_optional(stable_manifest)?.unwrap_or_default();
        let target = requirements::reconcile(&current, &wanted);
        let rewritten = !target.is_empty();
        let commit = if rewritten {
            write_atomic(stable_manifest, &target.content)?;
            let message = format!("Reconcile dependencies from {}", self.config.secondary_branch);
            let oid = git::commit_paths(
                stable,
                &[Path::new(&self.config.requirements_file)],
                &message,
            )?;
            tracing::info!(
                path = %stable_manifest.display(),
                commit = %oid,
                "rewrote stable dependency manifest"
            );
            Some(oid.to_string())
        } else {
            None
        };

        let install = if to_install.is_empty() && !rewritten {
            InstallStatus::NotNeeded
        } else if !options.install {
            InstallStatus::Skipped
        } else {
            self.install(stable_manifest)
        };

        let mut changes = to_install.changes;
        for change in target.changes {
            let key = requirements::normalize_name(&change.name);
            if !changes
                .iter()
                .any(|c| requirements::normalize_name(&c.name) == key)
            {
                changes.push(change);
            }
        }

        Ok(DependencyReport {
            manifest: Some(stable_manifest.to_path_buf()),
            changes,
            rewritten,
            commit,
            install,
        })
    }

    fn install(&self, manifest: &Path) -> InstallStatus {
        let env_dir = self.config.env_dir(&self.config.stable_root);
        let result = if env_dir.is_dir() {
            Ok(())
        } else {
            self.installer.create_environment(&env_dir)
        }
        .and_then(|()| self.installer.install(&env_dir, manifest));

        match result {
            Ok(()) => InstallStatus::Installed,
            Err(err) => {
                tracing::warn!(%err, "dependency installation failed");
                InstallStatus::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        }
    }
}

enum Promoted {
    Conflicts(Vec<String>),
    Merged {
        merge: MergeKind,
        stable_head: String,
        dependencies: DependencyReport,
    },
}

/// Count files and top-level package directories touched by `changes`
pub fn summarize(repo: &Repository, root: &Path, changes: &[Change]) -> ChangeSummary {
    let mut summary = ChangeSummary::default();
    let mut packages: BTreeSet<&str> = BTreeSet::new();

    for change in changes {
        summary.files.bump(change.kind);
        if let Some((top, _)) = change.path.split_once('/') {
            packages.insert(top);
        }
    }

    for top in packages {
        let existed = git::head_contains(repo, top);
        let exists = root.join(top).is_dir();
        let kind = match (existed, exists) {
            (false, _) => ChangeKind::Added,
            (true, false) => ChangeKind::Removed,
            (true, true) => ChangeKind::Modified,
        };
        summary.packages.bump(kind);
    }
    summary
}

fn head_id(repo: &Repository) -> Result<String> {
    Ok(repo
        .head()?
        .target()
        .map(|oid| oid.to_string())
        .unwrap_or_default())
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(LabError::io_at(path, &e)),
    }
}

/// Replace `path` with `content` via a temp file in the same directory
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    use std::io::Write;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| LabError::io_at(dir, &e))?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| LabError::io_at(path, &e.error))?;
    Ok(())
}
