//! Skills command implementation
//!
//! Lists packages in the experimental workspace with their descriptions.

use console::Style;

use crate::error::{LabError, Result};
use crate::manifest::{self, PackageEntry};

use super::{Context, Outcome, print_json};

pub fn run(ctx: &Context) -> Result<Outcome> {
    let root = &ctx.config.experimental_root;
    if !root.is_dir() {
        return Err(LabError::WorkspaceMissing {
            workspace: "Experimental".to_string(),
            path: root.display().to_string(),
        });
    }
    let entries = manifest::list_packages(root, &ctx.config.package_manifest)?;

    if ctx.json {
        print_json(&entries)?;
        return Ok(Outcome::Success);
    }

    if entries.is_empty() {
        println!("No packages in {}.", root.display());
        return Ok(Outcome::Success);
    }

    println!("Experimental packages ({}):", entries.len());
    println!();
    for entry in &entries {
        match entry {
            PackageEntry::Valid(package) => {
                println!("  {}", Style::new().bold().yellow().apply_to(&package.name));
                if !package.description.is_empty() {
                    println!("    {}", package.description);
                }
            }
            PackageEntry::ManifestError {
                directory, reason, ..
            } => {
                println!("  {}", Style::new().bold().red().apply_to(directory));
                println!("    {}", Style::new().dim().apply_to(reason));
            }
        }
    }
    Ok(Outcome::Success)
}
