//! Skill Lab - stable/experimental workspaces for AI coding skills
//!
//! Two working copies of one git repository: `stable` (primary branch) is what
//! agents load globally, `experimental` (secondary branch, a linked worktree)
//! is where skills change. Projects opt into experimental through a link,
//! changes are promoted with a commit-and-merge sync, and a match engine
//! suggests which experimental skills fit a given project.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod inspect;
pub mod installer;
pub mod links;
pub mod lock;
pub mod manifest;
pub mod matcher;
pub mod platform;
pub mod process;
pub mod requirements;
pub mod sync;
pub mod workspace;

pub use config::LabConfig;
pub use error::{ErrorKind, LabError, Result};
pub use inspect::{EnvironmentReport, StatusInspector};
pub use links::{LinkOutcome, LinkRegistry, LinkStatus, UnlinkOutcome};
pub use matcher::{MatchReport, Recommendation, match_packages, match_project};
pub use sync::{SyncEngine, SyncOptions, SyncResult};
pub use workspace::{ProvisionOptions, ProvisionReport, Provisioner};
