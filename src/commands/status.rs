//! Status command implementation
//!
//! Shows both workspaces, the global link, experimental's uncommitted
//! changes and the packages found there.

use console::Style;

use crate::error::Result;
use crate::inspect::{EnvironmentReport, StatusInspector, WorkingCopy};
use crate::manifest::PackageEntry;
use crate::platform::AliasState;
use crate::workspace::WorkspaceHealth;

use super::{Context, Outcome, dim, failure, label, print_json, success, warning};

pub fn run(ctx: &Context) -> Result<Outcome> {
    let links = ctx.links();
    let report = StatusInspector::new(&ctx.config, links.as_ref()).inspect()?;

    if ctx.json {
        print_json(&report)?;
    } else {
        render(&report);
    }
    Ok(Outcome::Success)
}

fn render(report: &EnvironmentReport) {
    render_workspace(&report.stable);
    render_workspace(&report.experimental);

    let link = &report.global_link;
    let line = match &link.state {
        AliasState::ManagedAlias { .. } => success("Global link points at stable"),
        AliasState::Absent => warning("Global link missing"),
        AliasState::ForeignAlias { target } => {
            warning(&format!("Global link points elsewhere: {}", target.display()))
        }
        AliasState::RealDirectory | AliasState::RealFile => {
            failure("Global link path is occupied by a real file or directory")
        }
    };
    println!("{line} {}", dim(&link.path));
    println!();

    render_working_copy(&report.working_copy);
    render_packages(&report.packages);
}

fn render_workspace(health: &WorkspaceHealth) {
    let name = health.kind.label();
    let line = if !health.exists {
        failure(&format!("{name} missing"))
    } else if !health.is_repository {
        failure(&format!("{name} is not a repository"))
    } else if !health.shares_history {
        failure(&format!("{name} is not part of the lab repository"))
    } else if !health.on_expected_branch {
        warning(&format!(
            "{name} on unexpected branch '{}'",
            health.branch.as_deref().unwrap_or("(detached)")
        ))
    } else {
        success(&format!(
            "{name} on '{}'",
            health.branch.as_deref().unwrap_or_default()
        ))
    };
    let env = if health.has_environment {
        ""
    } else {
        " (no environment)"
    };
    println!("{line} {}{env}", dim(&health.root));
}

fn render_working_copy(working_copy: &WorkingCopy) {
    match working_copy {
        WorkingCopy::Missing => {}
        WorkingCopy::Unreadable { message } => {
            println!("{}", failure(&format!("Cannot read experimental: {message}")));
        }
        WorkingCopy::Status { clean: true, .. } => {
            println!("{}", label("Experimental is clean"));
        }
        WorkingCopy::Status {
            modified,
            untracked_packages,
            untracked_files,
            ..
        } => {
            println!("{}", label("Uncommitted changes in experimental:"));
            for path in modified {
                println!("  {} {path}", Style::new().yellow().apply_to("M"));
            }
            for name in untracked_packages {
                println!("  {} {name}/", Style::new().green().apply_to("+"));
            }
            for path in untracked_files {
                println!("  {} {path}", Style::new().green().apply_to("+"));
            }
            println!("Run 'skill-lab sync' to commit and promote them.");
        }
    }
}

fn render_packages(packages: &[PackageEntry]) {
    if packages.is_empty() {
        return;
    }
    println!();
    println!("{}", label(&format!("Packages ({}):", packages.len())));
    for entry in packages {
        match entry {
            PackageEntry::Valid(package) => {
                println!("  {}", Style::new().bold().yellow().apply_to(&package.name));
            }
            PackageEntry::ManifestError {
                directory, reason, ..
            } => {
                println!(
                    "  {} {}",
                    Style::new().red().apply_to(directory),
                    Style::new().dim().apply_to(format!("({reason})"))
                );
            }
        }
    }
}
