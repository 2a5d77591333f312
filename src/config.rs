//! Lab configuration
//!
//! All paths and tunables are gathered into one [`LabConfig`] value that is
//! passed into every component. Nothing below this module reads the process
//! environment or the current directory.
//!
//! Resolution order: explicit overrides > YAML file > built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LabError, Result};

/// Config file name under the platform config directory
pub const CONFIG_DIR: &str = "skill-lab";

/// Config file name
pub const CONFIG_FILE: &str = "config.yaml";

/// Package manifest file name
pub const PACKAGE_MANIFEST: &str = "SKILL.md";

/// Dependency manifest file name
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Default stable workspace directory name (under the desktop)
const STABLE_DIR: &str = "skills-stable";

/// Default experimental workspace directory name (under the desktop)
const EXPERIMENTAL_DIR: &str = "skills-experimental";

/// Scanner limits and extra ignore patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub max_depth: usize,
    pub max_files: usize,
    /// Glob patterns matched against project-relative paths
    pub ignore: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_files: 1000,
            ignore: Vec::new(),
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabConfig {
    pub stable_root: PathBuf,
    pub experimental_root: PathBuf,
    pub global_link: PathBuf,
    pub primary_branch: String,
    pub secondary_branch: String,
    /// Name of the isolated dependency environment dir inside each workspace
    pub env_dir_name: String,
    pub requirements_file: String,
    pub package_manifest: String,
    /// Project link location relative to a project root
    pub project_link: PathBuf,
    pub python: String,
    pub command_timeout: Duration,
    pub lock_timeout: Duration,
    pub scan: ScanConfig,
}

/// On-disk shape of the config file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    stable: Option<PathBuf>,
    experimental: Option<PathBuf>,
    global_link: Option<PathBuf>,
    primary_branch: Option<String>,
    secondary_branch: Option<String>,
    env_dir: Option<String>,
    python: Option<String>,
    timeout_secs: Option<u64>,
    lock_timeout_secs: Option<u64>,
    scan: Option<ScanConfig>,
}

/// Values supplied by the caller that win over the file
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub stable: Option<PathBuf>,
    pub experimental: Option<PathBuf>,
    pub global_link: Option<PathBuf>,
}

impl LabConfig {
    /// Build a configuration rooted at explicit paths with default tunables
    pub fn with_roots(stable_root: PathBuf, experimental_root: PathBuf, global_link: PathBuf) -> Self {
        Self {
            stable_root,
            experimental_root,
            global_link,
            primary_branch: "main".to_string(),
            secondary_branch: "dev".to_string(),
            env_dir_name: ".venv".to_string(),
            requirements_file: REQUIREMENTS_FILE.to_string(),
            package_manifest: PACKAGE_MANIFEST.to_string(),
            project_link: PathBuf::from(".claude").join("skills"),
            python: default_python().to_string(),
            command_timeout: Duration::from_secs(60),
            lock_timeout: Duration::from_secs(10),
            scan: ScanConfig::default(),
        }
    }

    /// Defaults under the user's home and desktop directories
    pub fn platform_default() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| LabError::ConfigInvalid {
            message: "Could not determine home directory".to_string(),
        })?;
        let desktop = dirs::desktop_dir().unwrap_or_else(|| home.join("Desktop"));
        Ok(Self::with_roots(
            desktop.join(STABLE_DIR),
            desktop.join(EXPERIMENTAL_DIR),
            home.join(".claude").join("skills"),
        ))
    }

    /// Resolve the configuration from defaults, an optional file and overrides
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = Self::platform_default()?;

        let file = match &overrides.config_file {
            Some(path) => Some(read_config_file(path)?),
            None => match default_config_path() {
                Some(path) if path.is_file() => Some(read_config_file(&path)?),
                _ => None,
            },
        };
        if let Some(file) = file {
            config.apply_file(file);
        }

        if let Some(path) = &overrides.stable {
            config.stable_root.clone_from(path);
        }
        if let Some(path) = &overrides.experimental {
            config.experimental_root.clone_from(path);
        }
        if let Some(path) = &overrides.global_link {
            config.global_link.clone_from(path);
        }

        config.validate()?;
        tracing::debug!(?config, "resolved configuration");
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.stable {
            self.stable_root = v;
        }
        if let Some(v) = file.experimental {
            self.experimental_root = v;
        }
        if let Some(v) = file.global_link {
            self.global_link = v;
        }
        if let Some(v) = file.primary_branch {
            self.primary_branch = v;
        }
        if let Some(v) = file.secondary_branch {
            self.secondary_branch = v;
        }
        if let Some(v) = file.env_dir {
            self.env_dir_name = v;
        }
        if let Some(v) = file.python {
            self.python = v;
        }
        if let Some(v) = file.timeout_secs {
            self.command_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.lock_timeout_secs {
            self.lock_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.scan {
            self.scan = v;
        }
    }

    /// Reject configurations that would make paths ambiguous
    pub fn validate(&self) -> Result<()> {
        for (label, path) in [
            ("stable", &self.stable_root),
            ("experimental", &self.experimental_root),
            ("global_link", &self.global_link),
        ] {
            if !path.is_absolute() {
                return Err(LabError::ConfigInvalid {
                    message: format!("{label} path must be absolute: {}", path.display()),
                });
            }
        }
        if self.stable_root.starts_with(&self.experimental_root)
            || self.experimental_root.starts_with(&self.stable_root)
        {
            return Err(LabError::ConfigInvalid {
                message: "stable and experimental must be separate, non-nested directories"
                    .to_string(),
            });
        }
        if self.primary_branch == self.secondary_branch {
            return Err(LabError::ConfigInvalid {
                message: "primary and secondary branch must differ".to_string(),
            });
        }
        if self.project_link.is_absolute() {
            return Err(LabError::ConfigInvalid {
                message: "project link must be relative to the project".to_string(),
            });
        }
        Ok(())
    }

    /// Environment directory of a workspace root
    pub fn env_dir(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.env_dir_name)
    }
}

/// Default location of the config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path).map_err(|e| LabError::ConfigReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&content).map_err(|e| LabError::ConfigReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn default_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}
