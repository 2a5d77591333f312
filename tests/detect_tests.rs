//! Project scanning and package matching through the CLI

mod common;

use predicates::prelude::*;

use common::TestLab;

fn populate_project(lab: &TestLab) {
    for i in 0..5 {
        lab.write(&lab.project, &format!("docs/report{i}.pdf"), "");
    }
    for i in 0..12 {
        lab.write(&lab.project, &format!("src/module{i}.py"), "");
    }
    for i in 0..3 {
        lab.write(&lab.project, &format!("notes{i}.md"), "");
    }
    lab.write(&lab.project, "node_modules/left-pad/index.js", "");
    lab.write(&lab.project, ".venv/lib/site.py", "");
}

#[test]
fn test_scan_reports_extension_counts() {
    let lab = TestLab::new();
    populate_project(&lab);

    let value = lab.json(&["scan"]);
    assert_eq!(value["extensions"][".py"], 12);
    assert_eq!(value["extensions"][".pdf"], 5);
    assert_eq!(value["extensions"][".md"], 3);
    assert!(value["extensions"].get(".js").is_none());
    assert_eq!(value["total_files"], 20);
    assert_eq!(value["truncated"], false);
}

#[test]
fn test_scan_text_output_ranks_by_count() {
    let lab = TestLab::new();
    populate_project(&lab);

    let output = lab.cmd().arg("scan").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let py = stdout.find(".py").unwrap();
    let pdf = stdout.find(".pdf").unwrap();
    let md = stdout.find(".md").unwrap();
    assert!(py < pdf && pdf < md, "{stdout}");
}

#[test]
fn test_detect_ranks_packages() {
    let lab = TestLab::new();
    lab.setup();
    lab.add_package("pdf-helper", "Extract text and metadata from PDF files");
    lab.add_package("code-reviewer", "Review Python and JavaScript code");
    lab.add_package("slides", "Build presentation decks");
    populate_project(&lab);

    let value = lab.json(&["detect"]);
    let matches = value["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["package"], "pdf-helper");
    assert_eq!(matches[0]["rule"], "direct");
    assert_eq!(matches[0]["confidence"], 0.9);
    assert_eq!(matches[1]["package"], "code-reviewer");
    assert_eq!(matches[1]["rule"], "semantic");
    assert_eq!(value["recommendation"], "prompt");
    assert_eq!(value["unmatched_extensions"], serde_json::json!([".md"]));
    assert_eq!(value["packages"], 3);
}

#[test]
fn test_detect_text_output() {
    let lab = TestLab::new();
    lab.setup();
    lab.add_package("pdf-helper", "Extract text and metadata from PDF files");
    populate_project(&lab);

    lab.cmd()
        .arg("detect")
        .assert()
        .success()
        .stdout(predicate::str::contains("pdf-helper"))
        .stdout(predicate::str::contains("skill-lab link"));
}

#[test]
fn test_detect_nothing_matches() {
    let lab = TestLab::new();
    lab.setup();
    lab.add_package("slides", "Build presentation decks");
    lab.write(&lab.project, "main.go", "");

    let value = lab.json(&["detect"]);
    assert_eq!(value["matches"], serde_json::json!([]));
    assert_eq!(value["recommendation"], "none");
}

#[test]
fn test_detect_requires_experimental() {
    let lab = TestLab::new();
    lab.cmd()
        .arg("detect")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Experimental workspace not found"));
}
