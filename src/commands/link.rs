//! Link, unlink and check commands

use inquire::Confirm;

use crate::cli::{CheckArgs, LinkArgs, UnlinkArgs};
use crate::error::Result;
use crate::links::{LinkOutcome, LinkRegistry, LinkStatus, UnlinkOutcome};

use super::{Context, Outcome, dim, print_json, project_path, success, warning};

pub fn link(ctx: &Context, args: LinkArgs) -> Result<Outcome> {
    let project = project_path(args.path)?;
    let links = ctx.links();
    let outcome = LinkRegistry::new(&ctx.config, links.as_ref()).link(&project)?;

    if ctx.json {
        print_json(&outcome)?;
    }
    Ok(match outcome {
        LinkOutcome::Created { link } => {
            if !ctx.json {
                println!("{} {}", success("Linked to experimental:"), dim(&link));
            }
            Outcome::Success
        }
        LinkOutcome::AlreadyManaged { link } => {
            if !ctx.json {
                println!("{} {}", success("Already linked:"), dim(&link));
            }
            Outcome::Success
        }
        LinkOutcome::ConflictsWithForeignAlias {
            link,
            existing_target,
        } => {
            if !ctx.json {
                println!(
                    "{} {} -> {}",
                    warning("Link already points elsewhere:"),
                    link.display(),
                    existing_target.display()
                );
                println!("Run 'skill-lab unlink' first to replace it.");
            }
            Outcome::Conflict
        }
    })
}

pub fn unlink(ctx: &Context, args: UnlinkArgs) -> Result<Outcome> {
    let project = project_path(args.path)?;
    let links = ctx.links();
    let registry = LinkRegistry::new(&ctx.config, links.as_ref());

    let mut outcome = registry.unlink(&project, args.yes)?;
    if let UnlinkOutcome::ForeignAliasRequiresConfirmation {
        link,
        existing_target,
    } = &outcome
    {
        if !ctx.json && console::user_attended() {
            println!(
                "{} -> {} does not point at experimental.",
                link.display(),
                existing_target.display()
            );
            let confirmed = Confirm::new("Remove it anyway?")
                .with_default(false)
                .with_help_message("The link target itself is not touched")
                .prompt()?;
            if confirmed {
                outcome = registry.unlink(&project, true)?;
            }
        }
    }

    if ctx.json {
        print_json(&outcome)?;
    }
    Ok(match outcome {
        UnlinkOutcome::Removed { link } => {
            if !ctx.json {
                println!("{} {}", success("Unlinked:"), dim(&link));
            }
            Outcome::Success
        }
        UnlinkOutcome::NotLinked { link } => {
            if !ctx.json {
                println!("Not linked: {}", link.display());
            }
            Outcome::Success
        }
        UnlinkOutcome::ForeignAliasRequiresConfirmation { link, .. } => {
            if !ctx.json {
                println!(
                    "{} {}",
                    warning("Left in place; pass --yes to remove:"),
                    link.display()
                );
            }
            Outcome::Conflict
        }
    })
}

pub fn check(ctx: &Context, args: CheckArgs) -> Result<Outcome> {
    let project = project_path(args.path)?;
    let links = ctx.links();
    let status = LinkRegistry::new(&ctx.config, links.as_ref()).status(&project)?;

    if ctx.json {
        print_json(&status)?;
        return Ok(Outcome::Success);
    }
    match &status {
        LinkStatus::Unlinked => println!("Not linked"),
        LinkStatus::LinkedToExperimental => println!("{}", success("Linked to experimental")),
        LinkStatus::LinkedElsewhere { target } => {
            println!("{} {}", warning("Linked elsewhere:"), target.display());
        }
        LinkStatus::Occupied => {
            println!(
                "{}",
                warning("A real directory occupies the link location")
            );
        }
    }
    Ok(Outcome::Success)
}
