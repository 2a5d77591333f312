//! Skill Lab - stable/experimental workspaces for AI coding skills

use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use skill_lab::cli::{Cli, Commands};
use skill_lab::commands::{self, Context, Outcome};
use skill_lab::error::{LabError, Result};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn dispatch(cli: Cli) -> Result<Outcome> {
    if let Commands::Completions(args) = &cli.command {
        commands::completions::run(args)?;
        return Ok(Outcome::Success);
    }

    let ctx = Context::load(&cli)?;
    match cli.command {
        Commands::Setup(args) => commands::setup::run(&ctx, &args),
        Commands::Status => commands::status::run(&ctx),
        Commands::Sync(args) => commands::sync::run(&ctx, args),
        Commands::Link(args) => commands::link::link(&ctx, args),
        Commands::Unlink(args) => commands::link::unlink(&ctx, args),
        Commands::Check(args) => commands::link::check(&ctx, args),
        Commands::Skills => commands::skills::run(&ctx),
        Commands::Scan(args) => commands::detect::scan(&ctx, args),
        Commands::Detect(args) => commands::detect::detect(&ctx, args),
        Commands::Env => commands::env::run(&ctx),
        Commands::Completions(_) => Ok(Outcome::Success),
    }
}

fn report_error(err: &LabError, json: bool) {
    if json {
        let body = serde_json::json!({
            "error": {
                "kind": err.kind(),
                "message": err.to_string(),
            }
        });
        println!("{body:#}");
    } else {
        eprintln!("Error: {err}");
        if let Some(help) = err.help() {
            eprintln!("  help: {help}");
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level());
    let json = cli.json;

    let code = match dispatch(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            tracing::debug!(?err, "command failed");
            report_error(&err, json);
            match err.kind() {
                skill_lab::ErrorKind::Conflict => Outcome::Conflict.exit_code(),
                _ => Outcome::Failed.exit_code(),
            }
        }
    };
    std::process::exit(code);
}
