//! Commit-and-promote through the CLI

mod common;

use predicates::prelude::*;

use common::TestLab;

#[test]
fn test_sync_without_changes() {
    let lab = TestLab::new();
    lab.setup();
    lab.cmd()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync"));
}

#[test]
fn test_sync_promotes_new_package() {
    let lab = TestLab::new();
    lab.setup();
    lab.add_package("pdf-helper", "Extract text and metadata from PDF files");

    lab.cmd()
        .args(["sync", "-m", "Add pdf-helper"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Committed"))
        .stdout(predicate::str::contains("Stable now at"));

    assert!(lab.stable.join("pdf-helper/SKILL.md").is_file());
    let repo = git2::Repository::open(&lab.stable).unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.summary(), Some("Add pdf-helper"));

    lab.cmd()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync"));
}

#[test]
fn test_sync_default_message_summarizes_changes() {
    let lab = TestLab::new();
    lab.setup();
    lab.add_package("one", "First");
    lab.add_package("two", "Second");

    let value = lab.json(&["sync"]);
    assert_eq!(value["result"], "committed_and_merged");
    assert_eq!(value["merge"], "fast_forward");
    assert_eq!(value["summary"]["packages"]["added"], 2);

    let repo = git2::Repository::open(&lab.experimental).unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert!(
        head.summary()
            .unwrap()
            .starts_with("Sync from experimental: packages +2")
    );
}

#[test]
fn test_sync_no_promote_leaves_stable() {
    let lab = TestLab::new();
    lab.setup();
    lab.add_package("draft", "Work in progress");

    let value = lab.json(&["sync", "--no-promote"]);
    assert_eq!(value["result"], "committed");
    assert_eq!(value["promotion"]["status"], "skipped");
    assert!(!lab.stable.join("draft").exists());

    // nothing new to commit, so stable waits for the next change
    lab.cmd()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync"));
    assert!(!lab.stable.join("draft").exists());
}

#[test]
fn test_sync_conflict_leaves_stable_untouched() {
    let lab = TestLab::new();
    lab.setup();
    lab.commit_in_stable("README.md", "stable edit\n", "Edit README on stable");
    lab.write(&lab.experimental, "README.md", "experimental edit\n");

    lab.cmd()
        .args(["sync", "-m", "Edit README"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("conflicts"))
        .stdout(predicate::str::contains("README.md"));

    assert_eq!(lab.read(&lab.stable, "README.md"), "stable edit\n");
    let repo = git2::Repository::open(&lab.stable).unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.summary(), Some("Edit README on stable"));

    // the commit on experimental was kept
    let exp = git2::Repository::open(&lab.experimental).unwrap();
    let exp_head = exp.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(exp_head.summary(), Some("Edit README"));
}

#[test]
fn test_sync_merges_diverged_branches() {
    let lab = TestLab::new();
    lab.setup();
    lab.commit_in_stable("NOTES.md", "stable only\n", "Add notes on stable");
    lab.add_package("pdf-helper", "PDF tools");

    let value = lab.json(&["sync", "-m", "Add pdf-helper"]);
    assert_eq!(value["result"], "committed_and_merged");
    assert_eq!(value["merge"], "merge_commit");
    assert!(lab.stable.join("pdf-helper/SKILL.md").is_file());
    assert!(lab.stable.join("NOTES.md").is_file());
}

#[test]
fn test_sync_reconciles_requirements_without_installing() {
    let lab = TestLab::new();
    lab.setup();
    lab.write(&lab.experimental, "requirements.txt", "requests>=2.0\n");
    lab.cmd().args(["sync", "--no-install"]).assert().success();

    lab.write(
        &lab.experimental,
        "requirements.txt",
        "requests>=2.31\npandas\n",
    );
    let value = lab.json(&["sync", "--no-install"]);
    assert_eq!(value["result"], "committed_and_merged");
    let changes = value["dependencies"]["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(value["dependencies"]["install"]["status"], "skipped");
    assert_eq!(
        lab.read(&lab.stable, "requirements.txt"),
        "requests>=2.31\npandas\n"
    );
}

#[test]
fn test_sync_install_failure_is_reported() {
    let lab = TestLab::new();
    lab.setup();
    lab.write(&lab.experimental, "requirements.txt", "requests\n");

    // the configured interpreter does not exist
    let value = lab.json(&["sync"]);
    assert_eq!(value["result"], "committed_and_merged");
    assert_eq!(value["dependencies"]["install"]["status"], "failed");
    assert_eq!(value["dependencies"]["install"]["kind"], "environment");
    assert!(lab.stable.join("requirements.txt").is_file());
}

#[test]
fn test_sync_commits_reconciled_manifest_on_stable() {
    let lab = TestLab::new();
    lab.setup();
    lab.write(&lab.experimental, "requirements.txt", "requests==2.0\n");
    lab.cmd().args(["sync", "--no-install"]).assert().success();

    lab.commit_in_stable("requirements.txt", "requests==2.5\n", "Pin requests on stable");
    lab.add_package("pdf-helper", "PDF tools");

    let value = lab.json(&["sync", "--no-install"]);
    assert_eq!(value["result"], "committed_and_merged");
    assert_eq!(value["merge"], "merge_commit");
    assert_eq!(value["dependencies"]["rewritten"], true);
    assert_eq!(value["stable_head"], value["dependencies"]["commit"]);

    assert_eq!(lab.read(&lab.stable, "requirements.txt"), "requests==2.0\n");
    let repo = git2::Repository::open(&lab.stable).unwrap();
    let statuses = repo.statuses(None).unwrap();
    let dirty: Vec<String> = statuses
        .iter()
        .filter(|entry| !entry.status().is_ignored())
        .filter_map(|entry| entry.path().map(ToString::to_string))
        .collect();
    assert!(dirty.is_empty(), "stable has uncommitted changes: {dirty:?}");
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.summary(), Some("Reconcile dependencies from dev"));
}
