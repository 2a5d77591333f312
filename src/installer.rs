//! Isolated dependency environments
//!
//! The lab never installs anything itself. It asks a [`DependencyInstaller`]
//! to create an environment directory or to install one manifest into one,
//! and the default [`PythonInstaller`] shells out to `python -m venv` and
//! `pip install -r` under the configured timeout.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::Result;
use crate::process;

/// Creates environments and installs dependency manifests into them
pub trait DependencyInstaller {
    fn create_environment(&self, env_dir: &Path) -> Result<()>;

    /// Install every entry of `manifest` into `env_dir` in one invocation
    fn install(&self, env_dir: &Path, manifest: &Path) -> Result<()>;
}

/// `venv` + `pip` backed installer
#[derive(Debug, Clone)]
pub struct PythonInstaller {
    python: String,
    timeout: Duration,
}

impl PythonInstaller {
    pub fn new(python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python: python.into(),
            timeout,
        }
    }
}

impl DependencyInstaller for PythonInstaller {
    #[tracing::instrument(skip(self))]
    fn create_environment(&self, env_dir: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.python);
        cmd.arg("-m").arg("venv").arg(env_dir);
        process::run(cmd, self.timeout)
    }

    #[tracing::instrument(skip(self))]
    fn install(&self, env_dir: &Path, manifest: &Path) -> Result<()> {
        let mut cmd = Command::new(python_in(env_dir));
        cmd.args(["-m", "pip", "install", "--disable-pip-version-check", "-r"])
            .arg(manifest);
        process::run(cmd, self.timeout)
    }
}

fn bin_dir(env_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        env_dir.join("Scripts")
    } else {
        env_dir.join("bin")
    }
}

/// Interpreter inside an environment
pub fn python_in(env_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        bin_dir(env_dir).join("python.exe")
    } else {
        bin_dir(env_dir).join("python")
    }
}

/// Package installer inside an environment
pub fn pip_in(env_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        bin_dir(env_dir).join("pip.exe")
    } else {
        bin_dir(env_dir).join("pip")
    }
}
