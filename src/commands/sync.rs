//! Sync command implementation

use console::Style;

use crate::cli::SyncArgs;
use crate::error::Result;
use crate::git;
use crate::requirements::ChangeKind;
use crate::sync::{
    ChangeSummary, DependencyReport, InstallStatus, MergeKind, Promotion, SyncEngine, SyncOptions,
    SyncResult,
};

use super::{Context, Outcome, failure, label, print_json, success, warning};

pub fn run(ctx: &Context, args: SyncArgs) -> Result<Outcome> {
    let installer = ctx.installer();
    let mut options = SyncOptions::new(args.message);
    options.promote = !args.no_promote;
    options.install = !args.no_install;

    let pb = ctx.spinner("Syncing experimental into stable...");
    let result = SyncEngine::new(&ctx.config, &installer).sync(&options);
    pb.finish_and_clear();
    let result = result?;

    if ctx.json {
        print_json(&result)?;
    } else {
        render(&result);
    }

    Ok(match &result {
        SyncResult::MergeConflict { .. } => Outcome::Conflict,
        SyncResult::Committed {
            promotion: Promotion::Failed { .. },
            ..
        } => Outcome::Failed,
        _ => Outcome::Success,
    })
}

fn render_summary(commit: &str, summary: &ChangeSummary) {
    println!(
        "{} {} ({})",
        success("Committed"),
        Style::new().yellow().apply_to(git::short_id(commit)),
        summary.message()
    );
}

fn render(result: &SyncResult) {
    match result {
        SyncResult::NoChanges => println!("Nothing to sync: experimental has no changes."),
        SyncResult::Committed {
            commit,
            summary,
            promotion,
        } => {
            render_summary(commit, summary);
            match promotion {
                Promotion::Skipped => println!("Stable left unchanged (--no-promote)."),
                Promotion::Failed { message, .. } => {
                    println!("{}", failure(&format!("Promotion failed: {message}")));
                }
            }
        }
        SyncResult::CommittedAndMerged {
            commit,
            summary,
            merge,
            stable_head,
            dependencies,
        } => {
            render_summary(commit, summary);
            let how = match merge {
                MergeKind::FastForward => "fast-forward",
                MergeKind::MergeCommit => "merge commit",
                MergeKind::UpToDate => "already up to date",
            };
            println!(
                "{} {} ({how})",
                success("Stable now at"),
                Style::new().yellow().apply_to(git::short_id(stable_head))
            );
            render_dependencies(dependencies);
        }
        SyncResult::MergeConflict {
            commit,
            summary,
            conflicts,
        } => {
            render_summary(commit, summary);
            println!(
                "{}",
                failure("Merge into stable stopped on conflicts; stable is unchanged:")
            );
            for path in conflicts {
                println!("  {path}");
            }
            println!("Resolve them in the stable workspace, then sync again.");
        }
    }
}

fn render_dependencies(report: &DependencyReport) {
    if report.changes.is_empty() {
        return;
    }
    println!("{}", label("Dependencies:"));
    for change in &report.changes {
        let from = change.from.as_deref().unwrap_or("(any)");
        let to = change.to.as_deref().unwrap_or("(any)");
        let line = match change.kind {
            ChangeKind::Added => format!("+ {} {to}", change.name),
            ChangeKind::Changed => format!("~ {} {from} -> {to}", change.name),
        };
        println!("  {line}");
    }
    if let Some(commit) = &report.commit {
        let short = Style::new().dim().apply_to(git::short_id(commit));
        println!("  Stable manifest updated in {short}");
    }
    match &report.install {
        InstallStatus::NotNeeded => {}
        InstallStatus::Skipped => println!("{}", warning("Install skipped (--no-install)")),
        InstallStatus::Installed => println!("{}", success("Installed into stable's environment")),
        InstallStatus::Failed { message, .. } => {
            println!("{}", failure(&format!("Install failed: {message}")));
        }
    }
}
