//! Common test utilities for skill-lab integration tests

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Stable, experimental, global link and one project inside a temp dir
#[allow(dead_code)]
pub struct TestLab {
    /// Temporary directory
    pub temp: TempDir,
    pub stable: PathBuf,
    pub experimental: PathBuf,
    pub global_link: PathBuf,
    pub project: PathBuf,
    pub config_file: PathBuf,
}

#[allow(dead_code)]
impl TestLab {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        let project = root.join("project");
        std::fs::create_dir_all(&project).expect("Failed to create project directory");

        // python that cannot exist so no test depends on a real interpreter
        let config_file = root.join("config.yaml");
        std::fs::write(
            &config_file,
            "python: skill-lab-test-missing-python\ntimeout_secs: 10\nlock_timeout_secs: 5\n",
        )
        .expect("Failed to write config file");

        Self {
            stable: root.join("skills-stable"),
            experimental: root.join("skills-experimental"),
            global_link: root.join("home/.claude/skills"),
            project,
            config_file,
            temp,
        }
    }

    /// The binary with every path pointed into this lab
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("skill-lab").expect("binary should build");
        cmd.env("SKILL_LAB_CONFIG", &self.config_file)
            .env("SKILL_LAB_STABLE", &self.stable)
            .env("SKILL_LAB_EXPERIMENTAL", &self.experimental)
            .env("SKILL_LAB_GLOBAL_LINK", &self.global_link)
            .env_remove("RUST_LOG")
            .current_dir(&self.project);
        cmd
    }

    /// Provision everything except dependency environments
    pub fn setup(&self) {
        self.cmd().args(["setup", "--no-env"]).assert().success();
    }

    pub fn write(&self, base: &Path, rel: &str, content: &str) {
        let path = base.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
    }

    /// Add a package directory with a manifest to experimental
    pub fn add_package(&self, name: &str, description: &str) {
        self.write(
            &self.experimental,
            &format!("{name}/SKILL.md"),
            &format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n"),
        );
    }

    /// Commit a file directly on stable's branch
    pub fn commit_in_stable(&self, rel: &str, content: &str, message: &str) {
        self.write(&self.stable, rel, content);
        let repo = git2::Repository::open(&self.stable).expect("stable repository");
        let mut index = repo.index().expect("index");
        index.add_path(Path::new(rel)).expect("add path");
        index.write().expect("write index");
        let tree = repo
            .find_tree(index.write_tree().expect("write tree"))
            .expect("tree");
        let sig = repo.signature().expect("signature");
        let parent = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .expect("head commit");
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
            .expect("commit");
    }

    pub fn read(&self, base: &Path, rel: &str) -> String {
        std::fs::read_to_string(base.join(rel)).expect("Failed to read file")
    }

    /// Parse a command's stdout as JSON
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().args(args).arg("--json").output().expect("run");
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
    }
}

impl Default for TestLab {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lab_paths_are_inside_temp() {
        let lab = TestLab::new();
        assert!(lab.project.is_dir());
        assert!(lab.stable.starts_with(lab.temp.path()));
        assert!(!lab.stable.exists());
    }
}
