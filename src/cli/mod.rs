//! CLI definitions using clap derive API
//!
//! Argument types live in one submodule per command group:
//! - setup: provisioning arguments
//! - sync: commit and promote arguments
//! - link: link, unlink and check arguments
//! - scan: scan and detect arguments
//! - completions: completions arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod link;
pub mod scan;
pub mod setup;
pub mod sync;

pub use completions::CompletionsArgs;
pub use link::{CheckArgs, LinkArgs, UnlinkArgs};
pub use scan::{DetectArgs, ScanArgs};
pub use setup::SetupArgs;
pub use sync::SyncArgs;

use crate::config::ConfigOverrides;

/// Skill Lab - stable/experimental workspaces for AI coding skills
#[derive(Parser, Debug)]
#[command(
    name = "skill-lab",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Stable/experimental workspaces for AI coding skills",
    long_about = "Skill Lab keeps two working copies of one skills repository: a stable one \
                  that agents load globally and an experimental one where skills change. \
                  Projects opt into experimental with a link and changes are promoted with sync.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  skill-lab setup                      \x1b[90m# Create both workspaces and the global link\x1b[0m\n   \
                  skill-lab status                     \x1b[90m# Show workspace health and pending changes\x1b[0m\n   \
                  skill-lab link .                     \x1b[90m# Use experimental skills in this project\x1b[0m\n   \
                  skill-lab sync -m \"Add pdf skill\"    \x1b[90m# Commit experimental and merge into stable\x1b[0m\n   \
                  skill-lab detect .                   \x1b[90m# Suggest experimental skills for this project\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "SKILL_LAB_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Stable workspace root
    #[arg(long, global = true, env = "SKILL_LAB_STABLE", value_name = "DIR")]
    pub stable: Option<PathBuf>,

    /// Experimental workspace root
    #[arg(long, global = true, env = "SKILL_LAB_EXPERIMENTAL", value_name = "DIR")]
    pub experimental: Option<PathBuf>,

    /// Global skills link pointing at stable
    #[arg(long, global = true, env = "SKILL_LAB_GLOBAL_LINK", value_name = "PATH")]
    pub global_link: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            stable: self.stable.clone(),
            experimental: self.experimental.clone(),
            global_link: self.global_link.clone(),
        }
    }

    /// Default log filter for the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or repair both workspaces, the global link and environments
    Setup(SetupArgs),

    /// Show workspace health, pending changes and packages
    Status,

    /// Commit experimental changes and promote them to stable
    Sync(SyncArgs),

    /// Link a project to the experimental workspace
    Link(LinkArgs),

    /// Remove a project's link
    Unlink(UnlinkArgs),

    /// Show whether a project is linked
    Check(CheckArgs),

    /// List packages in the experimental workspace
    #[command(visible_alias = "list")]
    Skills,

    /// Count a project's file types
    Scan(ScanArgs),

    /// Suggest experimental packages that fit a project
    Detect(DetectArgs),

    /// Print environment variables for the experimental environment
    Env,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
