use clap::Parser;

/// Arguments for the setup command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Create or repair everything:\n    skill-lab setup\n\n\
                  Convert an existing experimental directory (a backup is kept):\n    skill-lab setup --adopt\n\n\
                  Skip creating dependency environments:\n    skill-lab setup --no-env")]
pub struct SetupArgs {
    /// Back up and convert an experimental directory that is not a worktree
    #[arg(long)]
    pub adopt: bool,

    /// Do not create dependency environments
    #[arg(long = "no-env")]
    pub no_env: bool,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_cli_parsing_setup() {
        let cli = Cli::try_parse_from(["skill-lab", "setup", "--adopt", "--no-env"]).unwrap();
        match cli.command {
            Commands::Setup(args) => {
                assert!(args.adopt);
                assert!(args.no_env);
            }
            _ => panic!("Expected Setup command"),
        }
    }

    #[test]
    fn test_cli_parsing_setup_defaults() {
        let cli = Cli::try_parse_from(["skill-lab", "setup"]).unwrap();
        match cli.command {
            Commands::Setup(args) => {
                assert!(!args.adopt);
                assert!(!args.no_env);
            }
            _ => panic!("Expected Setup command"),
        }
    }
}
