//! Error types for skill-lab
//!
//! Uses `thiserror` for error definitions and `miette` for diagnostics.
//! Every variant belongs to one [`ErrorKind`] so callers can render
//! messages consistently without matching on individual variants.

use std::path::Path;
use std::time::Duration;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// Broad classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid or missing input; nothing was changed
    Precondition,
    /// Something is in the way and needs a human decision
    Conflict,
    /// The host cannot perform the operation (tools, permissions, platform)
    Environment,
    /// An external process or lock did not finish in time
    Timeout,
}

/// Main error type for skill-lab operations
#[derive(Error, Diagnostic, Debug)]
pub enum LabError {
    // Precondition errors
    #[error("Project path is not an existing directory: {path}")]
    #[diagnostic(
        code(skill_lab::precondition::invalid_project_path),
        help("Pass the root directory of an existing project")
    )]
    InvalidProjectPath { path: String },

    #[error("{workspace} workspace not found at: {path}")]
    #[diagnostic(
        code(skill_lab::precondition::workspace_missing),
        help("Run 'skill-lab setup' to provision both workspaces")
    )]
    WorkspaceMissing { workspace: String, path: String },

    #[error("{workspace} workspace is on '{actual}', expected branch '{expected}'")]
    #[diagnostic(
        code(skill_lab::precondition::unexpected_branch),
        help("Check out the expected branch in that workspace and retry")
    )]
    UnexpectedBranch {
        workspace: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(skill_lab::precondition::config_invalid))]
    ConfigInvalid { message: String },

    #[error("Unknown shell: {shell}")]
    #[diagnostic(
        code(skill_lab::precondition::unknown_shell),
        help("Supported shells: bash, elvish, fish, powershell, zsh")
    )]
    UnknownShell { shell: String },

    #[error("Failed to read configuration file: {path}: {reason}")]
    #[diagnostic(code(skill_lab::precondition::config_read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Invalid package manifest at {path}: {reason}")]
    #[diagnostic(
        code(skill_lab::precondition::manifest_invalid),
        help("A package manifest starts with a YAML block between '---' lines that sets 'name'")
    )]
    ManifestInvalid { path: String, reason: String },

    #[error("Not an alias: {path}")]
    #[diagnostic(code(skill_lab::precondition::not_an_alias))]
    NotAnAlias { path: String },

    // Conflict errors
    #[error("Global link path is a real directory: {path}")]
    #[diagnostic(
        code(skill_lab::conflict::global_link_blocked),
        help("Move or merge the directory's contents into the stable workspace, then remove it")
    )]
    GlobalLinkBlocked { path: String },

    #[error("Global link {path} points at {target}, not at the stable workspace")]
    #[diagnostic(
        code(skill_lab::conflict::global_link_foreign),
        help("Remove the link manually if it is no longer needed")
    )]
    GlobalLinkForeign { path: String, target: String },

    #[error("Path is occupied by a real file or directory: {path}")]
    #[diagnostic(
        code(skill_lab::conflict::path_occupied),
        help("Move the existing content away and retry")
    )]
    PathOccupied { path: String },

    #[error("Experimental path exists but is not a linked working tree: {path}")]
    #[diagnostic(
        code(skill_lab::conflict::experimental_occupied),
        help("Re-run with --adopt to back it up and convert it into a working tree")
    )]
    ExperimentalOccupied { path: String },

    // Environment errors
    #[error("Permission denied: {path}")]
    #[diagnostic(
        code(skill_lab::environment::permission_denied),
        help("On Windows, enable Developer Mode or run as administrator to create links")
    )]
    PermissionDenied { path: String },

    #[error("Directory aliases are not supported here: {reason}")]
    #[diagnostic(code(skill_lab::environment::platform_unsupported))]
    PlatformUnsupported { reason: String },

    #[error("Required tool not found: {program}")]
    #[diagnostic(
        code(skill_lab::environment::tool_missing),
        help("Install it or point 'python' in the configuration at a working interpreter")
    )]
    ToolMissing { program: String },

    #[error("Command '{command}' failed with {status}: {stderr}")]
    #[diagnostic(code(skill_lab::environment::command_failed))]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Converting {path} into a worktree failed: {reason} (original files kept at {backup})")]
    #[diagnostic(
        code(skill_lab::environment::adopt_incomplete),
        help("Copy any missing packages back from the backup directory")
    )]
    AdoptIncomplete {
        path: String,
        backup: String,
        reason: String,
    },

    #[error("Git operation failed: {message}")]
    #[diagnostic(code(skill_lab::environment::git))]
    Git { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(skill_lab::environment::io))]
    Io { message: String },

    // Timeout errors
    #[error("{operation} timed out after {}s", .timeout.as_secs_f32())]
    #[diagnostic(
        code(skill_lab::timeout),
        help("Increase 'timeout_secs' in the configuration or retry later")
    )]
    OperationTimedOut { operation: String, timeout: Duration },
}

impl LabError {
    /// Classify this error for the caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            LabError::InvalidProjectPath { .. }
            | LabError::WorkspaceMissing { .. }
            | LabError::UnexpectedBranch { .. }
            | LabError::ConfigInvalid { .. }
            | LabError::UnknownShell { .. }
            | LabError::ConfigReadFailed { .. }
            | LabError::ManifestInvalid { .. }
            | LabError::NotAnAlias { .. } => ErrorKind::Precondition,
            LabError::GlobalLinkBlocked { .. }
            | LabError::GlobalLinkForeign { .. }
            | LabError::PathOccupied { .. }
            | LabError::ExperimentalOccupied { .. } => ErrorKind::Conflict,
            LabError::PermissionDenied { .. }
            | LabError::PlatformUnsupported { .. }
            | LabError::ToolMissing { .. }
            | LabError::CommandFailed { .. }
            | LabError::AdoptIncomplete { .. }
            | LabError::Git { .. }
            | LabError::Io { .. } => ErrorKind::Environment,
            LabError::OperationTimedOut { .. } => ErrorKind::Timeout,
        }
    }

    /// Wrap an IO error with the path it happened on
    pub(crate) fn io_at(path: &Path, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            return LabError::PermissionDenied {
                path: path.display().to_string(),
            };
        }
        LabError::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

impl From<std::io::Error> for LabError {
    fn from(err: std::io::Error) -> Self {
        LabError::Io {
            message: err.to_string(),
        }
    }
}

impl From<git2::Error> for LabError {
    fn from(err: git2::Error) -> Self {
        LabError::Git {
            message: err.message().to_string(),
        }
    }
}

impl From<serde_yaml::Error> for LabError {
    fn from(err: serde_yaml::Error) -> Self {
        LabError::ConfigInvalid {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LabError {
    fn from(err: serde_json::Error) -> Self {
        LabError::Io {
            message: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for LabError {
    fn from(err: inquire::InquireError) -> Self {
        LabError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, LabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LabError::GlobalLinkForeign {
            path: "/home/u/.claude/skills".to_string(),
            target: "/tmp/other".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Global link /home/u/.claude/skills points at /tmp/other, not at the stable workspace"
        );
    }

    #[test]
    fn test_error_code() {
        let err = LabError::GlobalLinkBlocked {
            path: "x".to_string(),
        };
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("skill_lab::conflict::global_link_blocked".to_string())
        );
    }

    #[test]
    fn test_kinds() {
        let precondition = LabError::InvalidProjectPath {
            path: "nope".to_string(),
        };
        let conflict = LabError::PathOccupied {
            path: "p".to_string(),
        };
        let environment = LabError::PlatformUnsupported {
            reason: "r".to_string(),
        };
        let timeout = LabError::OperationTimedOut {
            operation: "pip install".to_string(),
            timeout: Duration::from_secs(3),
        };
        assert_eq!(precondition.kind(), ErrorKind::Precondition);
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert_eq!(environment.kind(), ErrorKind::Environment);
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert!(timeout.to_string().contains("pip install timed out after 3"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LabError = io_err.into();
        assert!(matches!(err, LabError::Io { .. }));
    }

    #[test]
    fn test_io_at_maps_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = LabError::io_at(Path::new("/root/x"), &io_err);
        assert!(matches!(err, LabError::PermissionDenied { .. }));
        assert_eq!(err.kind(), ErrorKind::Environment);
    }

    #[test]
    fn test_git_error_conversion() {
        let git_err = git2::Error::from_str("git error");
        let err: LabError = git_err.into();
        assert!(matches!(err, LabError::Git { .. }));
        assert!(err.to_string().contains("git error"));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let parse_result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content: [unclosed");
        let err: LabError = parse_result.unwrap_err().into();
        assert!(matches!(err, LabError::ConfigInvalid { .. }));
    }
}
