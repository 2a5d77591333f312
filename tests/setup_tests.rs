//! Provisioning and status through the CLI

mod common;

use predicates::prelude::*;

use common::TestLab;

#[test]
fn test_setup_creates_both_workspaces() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["setup", "--no-env"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stable repository"))
        .stdout(predicate::str::contains("experimental worktree"))
        .stdout(predicate::str::contains("skipped"));

    assert!(lab.stable.join(".git").is_dir());
    // a linked worktree has a .git file pointing back at stable
    assert!(lab.experimental.join(".git").is_file());
    assert!(lab.stable.join("README.md").is_file());
    assert!(lab.experimental.join("README.md").is_file());
}

#[cfg(unix)]
#[test]
fn test_setup_links_global_to_stable() {
    let lab = TestLab::new();
    lab.setup();
    let target = std::fs::read_link(&lab.global_link).unwrap();
    assert_eq!(target, lab.stable);
}

#[test]
fn test_setup_is_idempotent() {
    let lab = TestLab::new();
    lab.setup();
    let value = lab.json(&["setup", "--no-env"]);
    let steps = value["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 4);
    for step in &steps[..3] {
        assert_eq!(step["status"], "already_satisfied", "{step}");
    }
    assert_eq!(steps[3]["status"], "skipped");
}

#[test]
fn test_setup_refuses_occupied_experimental() {
    let lab = TestLab::new();
    lab.write(&lab.experimental, "my-skill/SKILL.md", "---\nname: my-skill\n---\n");

    lab.cmd()
        .args(["setup", "--no-env"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("experimental worktree"));
    assert!(lab.experimental.join("my-skill/SKILL.md").is_file());
    assert!(!lab.experimental.join(".git").exists());
}

#[test]
fn test_setup_adopt_keeps_backup_and_packages() {
    let lab = TestLab::new();
    lab.write(
        &lab.experimental,
        "my-skill/SKILL.md",
        "---\nname: my-skill\ndescription: Mine\n---\n",
    );

    lab.cmd()
        .args(["setup", "--no-env", "--adopt"])
        .assert()
        .success();

    assert!(lab.experimental.join(".git").is_file());
    assert!(lab.experimental.join("my-skill/SKILL.md").is_file());
    let backups: Vec<_> = std::fs::read_dir(lab.temp.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("skills-experimental_backup_")
        })
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].path().join("my-skill/SKILL.md").is_file());
}

#[test]
fn test_status_before_setup() {
    let lab = TestLab::new();
    lab.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stable missing"));
}

#[test]
fn test_status_json_after_setup() {
    let lab = TestLab::new();
    lab.setup();
    lab.add_package("pdf-helper", "Extract text from PDF files");

    let value = lab.json(&["status"]);
    assert_eq!(value["stable"]["is_repository"], true);
    assert_eq!(value["stable"]["branch"], "main");
    assert_eq!(value["experimental"]["branch"], "dev");
    assert_eq!(value["experimental"]["shares_history"], true);
    assert_eq!(value["working_copy"]["state"], "status");
    assert_eq!(value["working_copy"]["clean"], false);
    assert_eq!(
        value["working_copy"]["untracked_packages"],
        serde_json::json!(["pdf-helper"])
    );
    assert_eq!(value["packages"][0]["name"], "pdf-helper");
    if cfg!(unix) {
        assert_eq!(value["global_link"]["state"], "managed_alias");
    }
}

#[test]
fn test_skills_lists_packages() {
    let lab = TestLab::new();
    lab.setup();
    lab.add_package("pdf-helper", "Extract text from PDF files");
    lab.write(&lab.experimental, "broken/SKILL.md", "no frontmatter here");

    lab.cmd()
        .arg("skills")
        .assert()
        .success()
        .stdout(predicate::str::contains("pdf-helper"))
        .stdout(predicate::str::contains("Extract text from PDF files"))
        .stdout(predicate::str::contains("broken"));
}
