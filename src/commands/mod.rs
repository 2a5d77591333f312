//! Command implementations for the skill-lab CLI

pub mod completions;
pub mod detect;
pub mod env;
pub mod link;
pub mod setup;
pub mod skills;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::cli::Cli;
use crate::config::LabConfig;
use crate::error::{LabError, Result};
use crate::installer::PythonInstaller;
use crate::platform::{self, LinkAdapter};

/// How a command finished, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Finished, but part of the work failed
    Failed,
    /// Stopped on something that needs a human decision
    Conflict,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Failed => 1,
            Outcome::Conflict => 2,
        }
    }
}

/// Resolved configuration plus output preferences
pub struct Context {
    pub config: LabConfig,
    pub json: bool,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let config = LabConfig::load(&cli.overrides())?;
        tracing::debug!(
            stable = %config.stable_root.display(),
            experimental = %config.experimental_root.display(),
            "configuration loaded"
        );
        Ok(Self {
            config,
            json: cli.json,
        })
    }

    pub fn links(&self) -> Box<dyn LinkAdapter> {
        platform::native(self.config.command_timeout)
    }

    pub fn installer(&self) -> PythonInstaller {
        PythonInstaller::new(self.config.python.clone(), self.config.command_timeout)
    }

    /// Spinner for long operations; hidden for JSON or unattended output
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.json || !console::user_attended_stderr() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve a project argument, defaulting to the current directory
pub fn project_path(path: Option<PathBuf>) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path,
        None => std::env::current_dir().map_err(|e| LabError::Io {
            message: format!("Failed to get current directory: {e}"),
        })?,
    };
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|e| LabError::Io {
        message: format!("Failed to get current directory: {e}"),
    })?;
    Ok(platform::normalize(&cwd.join(path)))
}

pub(crate) fn success(text: &str) -> String {
    format!("{} {text}", Style::new().green().bold().apply_to("✓"))
}

pub(crate) fn warning(text: &str) -> String {
    format!("{} {text}", Style::new().yellow().bold().apply_to("!"))
}

pub(crate) fn failure(text: &str) -> String {
    format!("{} {text}", Style::new().red().bold().apply_to("✗"))
}

pub(crate) fn label(text: &str) -> String {
    Style::new().bold().apply_to(text).to_string()
}

pub(crate) fn dim(path: &Path) -> String {
    Style::new().dim().apply_to(path.display()).to_string()
}
