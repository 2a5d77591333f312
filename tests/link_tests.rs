//! Project linking through the CLI

mod common;

use predicates::prelude::*;

use common::TestLab;

#[test]
fn test_link_requires_experimental() {
    let lab = TestLab::new();
    lab.cmd()
        .arg("link")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Experimental workspace not found"));
}

#[test]
fn test_link_missing_project() {
    let lab = TestLab::new();
    lab.setup();
    let missing = lab.temp.path().join("nope");
    lab.cmd()
        .arg("link")
        .arg(&missing)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Project path is not an existing directory",
        ));
}

#[test]
fn test_check_unlinked_project() {
    let lab = TestLab::new();
    lab.setup();
    let value = lab.json(&["check"]);
    assert_eq!(value["status"], "unlinked");
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_link_check_unlink_cycle() {
        let lab = TestLab::new();
        lab.setup();
        let link = lab.project.join(".claude/skills");

        lab.cmd()
            .arg("link")
            .assert()
            .success()
            .stdout(predicate::str::contains("Linked to experimental"));
        assert_eq!(std::fs::read_link(&link).unwrap(), lab.experimental);

        lab.cmd()
            .arg("link")
            .assert()
            .success()
            .stdout(predicate::str::contains("Already linked"));

        let value = lab.json(&["check"]);
        assert_eq!(value["status"], "linked_to_experimental");

        lab.cmd()
            .arg("unlink")
            .assert()
            .success()
            .stdout(predicate::str::contains("Unlinked"));
        assert!(std::fs::symlink_metadata(&link).is_err());
        assert!(lab.experimental.is_dir());
    }

    #[test]
    fn test_link_explicit_path_from_elsewhere() {
        let lab = TestLab::new();
        lab.setup();
        let other = lab.temp.path().join("other-project");
        std::fs::create_dir_all(&other).unwrap();

        let value = lab.json(&["link", other.to_str().unwrap()]);
        assert_eq!(value["outcome"], "created");
        assert!(
            std::fs::symlink_metadata(other.join(".claude/skills"))
                .unwrap()
                .file_type()
                .is_symlink()
        );
    }

    #[test]
    fn test_foreign_link_is_a_conflict() {
        let lab = TestLab::new();
        lab.setup();
        let vendor = lab.temp.path().join("vendor-skills");
        std::fs::create_dir_all(&vendor).unwrap();
        std::fs::create_dir_all(lab.project.join(".claude")).unwrap();
        let link = lab.project.join(".claude/skills");
        symlink(&vendor, &link).unwrap();

        lab.cmd()
            .arg("link")
            .assert()
            .code(2)
            .stdout(predicate::str::contains("already points elsewhere"));
        assert_eq!(std::fs::read_link(&link).unwrap(), vendor);

        // not a terminal, so no prompt: left in place
        lab.cmd()
            .arg("unlink")
            .assert()
            .code(2)
            .stdout(predicate::str::contains("pass --yes"));
        assert!(std::fs::symlink_metadata(&link).is_ok());

        lab.cmd().args(["unlink", "--yes"]).assert().success();
        assert!(std::fs::symlink_metadata(&link).is_err());
        assert!(vendor.is_dir());
    }

    #[test]
    fn test_real_directory_blocks_link() {
        let lab = TestLab::new();
        lab.setup();
        lab.write(&lab.project, ".claude/skills/local/SKILL.md", "local");

        lab.cmd().arg("link").assert().code(2);
        assert!(lab.project.join(".claude/skills/local/SKILL.md").is_file());

        let value = lab.json(&["check"]);
        assert_eq!(value["status"], "occupied");
    }
}
