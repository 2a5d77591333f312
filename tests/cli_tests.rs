//! CLI integration tests using the real skill-lab binary

mod common;

use predicates::prelude::*;

use common::TestLab;

#[test]
fn test_help_output() {
    let lab = TestLab::new();
    lab.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("link"))
        .stdout(predicate::str::contains("detect"));
}

#[test]
fn test_version_output() {
    let lab = TestLab::new();
    lab.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skill-lab"));
}

#[test]
fn test_completions_bash() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skill-lab"));
}

#[test]
fn test_completions_unknown_shell() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["completions", "tcsh"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown shell: tcsh"));
}

#[test]
fn test_env_exports() {
    let lab = TestLab::new();
    lab.cmd()
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains("export EXPERIMENTAL_PYTHON="))
        .stdout(predicate::str::contains("export EXPERIMENTAL_VENV="))
        .stdout(predicate::str::contains(format!(
            "export STABLE_PATH={}",
            lab.stable.display()
        )));
}

#[test]
fn test_env_json() {
    let lab = TestLab::new();
    let value = lab.json(&["env"]);
    assert_eq!(
        value["EXPERIMENTAL_PATH"].as_str(),
        Some(lab.experimental.to_str().unwrap())
    );
    assert!(
        value["EXPERIMENTAL_VENV"]
            .as_str()
            .unwrap()
            .ends_with(".venv")
    );
}

#[test]
fn test_relative_root_is_rejected() {
    let lab = TestLab::new();
    lab.cmd()
        .args(["--stable", "relative/stable", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_unknown_config_key_is_rejected() {
    let lab = TestLab::new();
    std::fs::write(&lab.config_file, "stabel: /tmp/typo\n").unwrap();
    lab.cmd()
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stabel"));
}

#[test]
fn test_json_error_goes_to_stdout() {
    let lab = TestLab::new();
    let value = lab.json(&["skills"]);
    assert_eq!(value["error"]["kind"], "precondition");
    assert!(
        value["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Experimental workspace not found")
    );
}
