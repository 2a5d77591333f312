//! Setup command

use crate::cli::SetupArgs;
use crate::error::{ErrorKind, Result};
use crate::workspace::{ProvisionOptions, ProvisionReport, Provisioner, StepStatus};

use super::{Context, Outcome, dim, failure, label, print_json, success, warning};

pub fn run(ctx: &Context, args: &SetupArgs) -> Result<Outcome> {
    let links = ctx.links();
    let installer = ctx.installer();
    let options = ProvisionOptions {
        adopt_existing: args.adopt,
        skip_environments: args.no_env,
    };

    let pb = ctx.spinner("Provisioning workspaces...");
    let report = Provisioner::new(&ctx.config, links.as_ref(), &installer).provision(options);
    pb.finish_and_clear();

    if ctx.json {
        print_json(&report)?;
    } else {
        render(ctx, &report);
    }

    Ok(match report.failure() {
        None => Outcome::Success,
        Some(step) => match step.status {
            StepStatus::Failed {
                kind: ErrorKind::Conflict,
                ..
            } => Outcome::Conflict,
            _ => Outcome::Failed,
        },
    })
}

fn render(ctx: &Context, report: &ProvisionReport) {
    for step in &report.steps {
        let name = step.step.describe();
        match &step.status {
            StepStatus::AlreadySatisfied => println!("{}", success(&format!("{name}: ok"))),
            StepStatus::Applied { detail } => {
                println!("{}", success(&format!("{name}: {detail}")));
            }
            StepStatus::Skipped { reason } => {
                println!("{}", warning(&format!("{name}: skipped ({reason})")));
            }
            StepStatus::Failed { message, .. } => {
                println!("{}", failure(&format!("{name}: {message}")));
            }
            StepStatus::NotAttempted => println!("  {name}: not attempted"),
        }
    }

    if report.succeeded() {
        println!();
        println!("{} {}", label("Stable:"), dim(&ctx.config.stable_root));
        println!(
            "{} {}",
            label("Experimental:"),
            dim(&ctx.config.experimental_root)
        );
        println!("{} {}", label("Global link:"), dim(&ctx.config.global_link));
    }
}
