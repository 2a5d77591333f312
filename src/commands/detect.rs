//! Scan and detect commands
//!
//! `scan` reports a project's file inventory; `detect` ranks experimental
//! packages against it.

use console::Style;
use serde::Serialize;

use crate::cli::{DetectArgs, ScanArgs};
use crate::error::{LabError, Result};
use crate::manifest;
use crate::matcher::{self, MatchReport, ProjectInventory, Recommendation};

use super::{Context, Outcome, label, print_json, project_path};

pub fn scan(ctx: &Context, args: ScanArgs) -> Result<Outcome> {
    let project = project_path(args.path)?;
    let inventory = matcher::scan(&project, &ctx.config.scan)?;

    if ctx.json {
        print_json(&inventory)?;
    } else {
        render_inventory(&inventory);
    }
    Ok(Outcome::Success)
}

#[derive(Serialize)]
struct DetectReport<'a> {
    project: &'a ProjectInventory,
    packages: usize,
    #[serde(flatten)]
    report: &'a MatchReport,
}

pub fn detect(ctx: &Context, args: DetectArgs) -> Result<Outcome> {
    let project = project_path(args.path)?;
    let root = &ctx.config.experimental_root;
    if !root.is_dir() {
        return Err(LabError::WorkspaceMissing {
            workspace: "Experimental".to_string(),
            path: root.display().to_string(),
        });
    }

    let entries = manifest::list_packages(root, &ctx.config.package_manifest)?;
    let packages = manifest::valid_packages(&entries);
    let inventory = matcher::scan(&project, &ctx.config.scan)?;
    let report = matcher::match_packages(&inventory, &packages);

    if ctx.json {
        print_json(&DetectReport {
            project: &inventory,
            packages: packages.len(),
            report: &report,
        })?;
    } else {
        render_report(&report, packages.len());
    }
    Ok(Outcome::Success)
}

fn render_inventory(inventory: &ProjectInventory) {
    println!(
        "{} {} files",
        label(&inventory.root.display().to_string()),
        inventory.total_files
    );
    for (ext, count) in inventory.ranked_extensions() {
        println!("  {ext:<10} {count}");
    }
    if !inventory.markers.is_empty() {
        let markers: Vec<&str> = inventory.markers.iter().map(String::as_str).collect();
        println!("{} {}", label("Markers:"), markers.join(", "));
    }
    if inventory.truncated {
        println!(
            "{}",
            Style::new()
                .dim()
                .apply_to("Stopped at the file limit; counts are partial.")
        );
    }
}

fn render_report(report: &MatchReport, package_count: usize) {
    if report.matches.is_empty() {
        println!("No experimental package fits this project ({package_count} checked).");
        return;
    }

    println!("{}", label("Matching experimental packages:"));
    for m in &report.matches {
        println!(
            "  {} {:.2}  {}",
            Style::new().bold().yellow().apply_to(&m.package),
            m.confidence,
            Style::new().dim().apply_to(&m.reason)
        );
        println!("    matches {}", m.matched_extensions.join(", "));
    }
    println!();
    match report.recommendation {
        Recommendation::Prompt => {
            println!("Strong match. Link this project with 'skill-lab link'.");
        }
        Recommendation::Suggest => {
            println!("Possible match. 'skill-lab link' makes these packages available here.");
        }
        Recommendation::None => {}
    }
}
