//! Git plumbing shared by the provisioner, sync engine and inspector
//!
//! All operations run in-process through `git2`; no `git` binary is needed.

use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, CheckoutNotificationType, ErrorCode, IndexAddOption, Object, Oid, Repository,
    RepositoryInitOptions, Signature, Status, StatusOptions, WorktreeAddOptions,
};
use serde::Serialize;

use crate::error::{LabError, Result};
use crate::platform;

/// Committer identity written into the repository's local config
pub const AUTHOR_NAME: &str = "Skill Lab";
pub const AUTHOR_EMAIL: &str = "skill-lab@local.dev";

/// Kind of change in a working copy relative to its last commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One changed path (forward slashes, relative to the working tree root)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
    /// Present in the working tree but not in the index
    pub untracked: bool,
}

/// Outcome of merging a branch tip into the checked-out branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    UpToDate,
    FastForward(Oid),
    Merged(Oid),
    /// Nothing was written; the paths that blocked the merge
    Conflicts(Vec<String>),
}

/// Open the repository whose working tree is exactly `root`
pub fn open_at(root: &Path) -> Result<Repository> {
    let repo = Repository::open(root).map_err(|e| LabError::Git {
        message: format!("Failed to open repository at {}: {}", root.display(), e.message()),
    })?;
    match repo.workdir() {
        Some(workdir) if platform::same_location(workdir, root) => Ok(repo),
        _ => Err(LabError::Git {
            message: format!("{} is not the root of a working tree", root.display()),
        }),
    }
}

/// Initialize a repository with `branch` as its unborn HEAD
pub fn init(root: &Path, branch: &str) -> Result<Repository> {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(branch);
    let repo = Repository::init_opts(root, &opts)?;
    set_identity(&repo)?;
    Ok(repo)
}

/// Write the lab's committer identity into the local config
pub fn set_identity(repo: &Repository) -> Result<()> {
    let mut config = repo.config()?.open_level(git2::ConfigLevel::Local)?;
    config.set_str("user.name", AUTHOR_NAME)?;
    config.set_str("user.email", AUTHOR_EMAIL)?;
    Ok(())
}

/// Configured signature, falling back to the lab identity
pub fn signature(repo: &Repository) -> Result<Signature<'static>> {
    match repo.signature() {
        Ok(sig) => Ok(sig.to_owned()),
        Err(_) => Ok(Signature::now(AUTHOR_NAME, AUTHOR_EMAIL)?),
    }
}

/// Name of the branch HEAD points at, even when it is unborn
pub fn head_branch(repo: &Repository) -> Option<String> {
    let head = repo.find_reference("HEAD").ok()?;
    let target = head.symbolic_target()?;
    target.strip_prefix("refs/heads/").map(ToString::to_string)
}

/// Whether HEAD has at least one commit
pub fn has_commits(repo: &Repository) -> bool {
    repo.head().ok().and_then(|h| h.target()).is_some()
}

pub fn branch_tip(repo: &Repository, branch: &str) -> Result<Option<Oid>> {
    match repo.find_branch(branch, BranchType::Local) {
        Ok(b) => Ok(b.get().target()),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Create `branch` at `from`'s tip unless it already exists
///
/// Returns true when the branch was created.
pub fn ensure_branch(repo: &Repository, branch: &str, from: &str) -> Result<bool> {
    if branch_tip(repo, branch)?.is_some() {
        return Ok(false);
    }
    let base = repo
        .find_branch(from, BranchType::Local)?
        .get()
        .peel_to_commit()?;
    repo.branch(branch, &base, false)?;
    tracing::info!(branch, from, "created branch");
    Ok(true)
}

/// Drop registrations whose working directories no longer exist
pub fn prune_stale_worktrees(repo: &Repository) -> Result<Vec<String>> {
    let mut pruned = Vec::new();
    for name in repo.worktrees()?.iter().flatten() {
        let wt = repo.find_worktree(name)?;
        if wt.validate().is_err() && wt.is_prunable(None)? {
            wt.prune(None)?;
            pruned.push(name.to_string());
        }
    }
    if !pruned.is_empty() {
        tracing::info!(?pruned, "pruned stale worktrees");
    }
    Ok(pruned)
}

/// Add a linked working tree at `path` checked out on `branch`
pub fn add_worktree(repo: &Repository, path: &Path, branch: &str) -> Result<Repository> {
    let name = worktree_name(path);
    let reference = repo.find_branch(branch, BranchType::Local)?.into_reference();
    let mut opts = WorktreeAddOptions::new();
    opts.reference(Some(&reference));
    let wt = repo.worktree(&name, path, Some(&opts))?;
    tracing::info!(name, path = %path.display(), branch, "added worktree");
    Ok(Repository::open_from_worktree(&wt)?)
}

fn worktree_name(path: &Path) -> String {
    let raw = path
        .file_name()
        .map_or_else(|| "experimental".to_string(), |n| n.to_string_lossy().into_owned());
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

/// Whether `candidate` is a linked worktree sharing `repo`'s history
pub fn shares_history(repo: &Repository, candidate: &Repository) -> bool {
    candidate.is_worktree() && platform::same_location(candidate.commondir(), repo.commondir())
}

/// Every difference between the working tree (plus index) and HEAD
pub fn changes(repo: &Repository) -> Result<Vec<Change>> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .renames_head_to_index(false);

    let statuses = repo.statuses(Some(&mut opts))?;
    let mut out = Vec::new();
    for entry in statuses.iter() {
        let status = entry.status();
        if status.is_ignored() {
            continue;
        }
        let Some(path) = entry.path() else { continue };
        let untracked = status.is_wt_new();
        let kind = if status.intersects(Status::INDEX_NEW | Status::WT_NEW) {
            ChangeKind::Added
        } else if status.intersects(Status::INDEX_DELETED | Status::WT_DELETED) {
            ChangeKind::Removed
        } else {
            ChangeKind::Modified
        };
        out.push(Change {
            path: path.replace('\\', "/"),
            kind,
            untracked,
        });
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

/// Stage everything under the working tree and commit it on HEAD
pub fn commit_all(repo: &Repository, message: &str) -> Result<Oid> {
    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"].iter(), None)?;
    commit_index(repo, &mut index, message)
}

/// Stage only `paths` (relative to the working tree root) and commit on HEAD
///
/// Other modifications in the working tree stay uncommitted.
pub fn commit_paths(repo: &Repository, paths: &[&Path], message: &str) -> Result<Oid> {
    let mut index = repo.index()?;
    for path in paths {
        index.add_path(path)?;
    }
    commit_index(repo, &mut index, message)
}

fn commit_index(repo: &Repository, index: &mut git2::Index, message: &str) -> Result<Oid> {
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let sig = signature(repo)?;
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
        Err(e) => return Err(e.into()),
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
    tracing::info!(commit = %oid, "committed");
    Ok(oid)
}

/// Whether `path` (relative, forward slashes) exists in HEAD's tree
pub fn head_contains(repo: &Repository, path: &str) -> bool {
    repo.head()
        .and_then(|h| h.peel_to_tree())
        .and_then(|t| t.get_path(Path::new(path)).map(|_| ()))
        .is_ok()
}

/// Merge commit `theirs` into the checked-out branch of `repo`
///
/// The merge is computed in memory first. Conflicting content or local
/// modifications that the checkout would overwrite are reported as
/// [`MergeOutcome::Conflicts`] before anything in the working tree, the
/// index or the branch ref changes.
pub fn merge_into_head(repo: &Repository, theirs: Oid, message: &str) -> Result<MergeOutcome> {
    let annotated = repo.find_annotated_commit(theirs)?;
    let (analysis, _) = repo.merge_analysis(&[&annotated])?;
    if analysis.is_up_to_date() {
        return Ok(MergeOutcome::UpToDate);
    }

    let head = repo.head()?;
    let ref_name = head.name().map(ToString::to_string).ok_or_else(|| LabError::Git {
        message: "HEAD is not a valid UTF-8 reference".to_string(),
    })?;
    let their_commit = repo.find_commit(theirs)?;

    if analysis.is_fast_forward() {
        if let Some(conflicts) = checkout_safely(repo, their_commit.as_object())? {
            return Ok(MergeOutcome::Conflicts(conflicts));
        }
        repo.find_reference(&ref_name)?
            .set_target(theirs, &format!("fast-forward: {message}"))?;
        return Ok(MergeOutcome::FastForward(theirs));
    }

    let ours = head.peel_to_commit()?;
    let mut index = repo.merge_commits(&ours, &their_commit, None)?;
    if index.has_conflicts() {
        return Ok(MergeOutcome::Conflicts(index_conflicts(&index)?));
    }

    let tree = repo.find_tree(index.write_tree_to(repo)?)?;
    let sig = signature(repo)?;
    let merge_oid = repo.commit(None, &sig, &sig, message, &tree, &[&ours, &their_commit])?;
    let merge_commit = repo.find_commit(merge_oid)?;

    if let Some(conflicts) = checkout_safely(repo, merge_commit.as_object())? {
        return Ok(MergeOutcome::Conflicts(conflicts));
    }
    repo.find_reference(&ref_name)?.set_target(merge_oid, message)?;
    Ok(MergeOutcome::Merged(merge_oid))
}

fn index_conflicts(index: &git2::Index) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    for conflict in index.conflicts()? {
        let conflict = conflict?;
        if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
            paths.push(String::from_utf8_lossy(&entry.path).into_owned());
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Safe checkout that reports blocking paths instead of failing
fn checkout_safely(repo: &Repository, target: &Object<'_>) -> Result<Option<Vec<String>>> {
    let mut blocked: Vec<String> = Vec::new();
    let result = {
        let mut builder = CheckoutBuilder::new();
        builder.safe();
        builder.notify_on(CheckoutNotificationType::CONFLICT);
        builder.notify(|_, path, _, _, _| {
            if let Some(p) = path {
                blocked.push(p.to_string_lossy().replace('\\', "/"));
            }
            true
        });
        repo.checkout_tree(target, Some(&mut builder))
    };

    match result {
        Ok(()) => Ok(None),
        Err(e) if e.code() == ErrorCode::Conflict || !blocked.is_empty() => {
            blocked.sort();
            blocked.dedup();
            tracing::warn!(?blocked, "checkout blocked by local changes");
            Ok(Some(blocked))
        }
        Err(e) => Err(e.into()),
    }
}

/// Short form of a commit id for display
pub fn short_id(oid: &str) -> &str {
    oid.get(..7).unwrap_or(oid)
}
