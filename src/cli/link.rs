use clap::Parser;
use std::path::PathBuf;

/// Arguments for the link command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Link the current project:\n    skill-lab link\n\n\
                  Link another project:\n    skill-lab link ~/code/my-app")]
pub struct LinkArgs {
    /// Project directory (defaults to current directory)
    pub path: Option<PathBuf>,
}

/// Arguments for the unlink command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Unlink the current project:\n    skill-lab unlink\n\n\
                  Remove a link that points somewhere else without asking:\n    skill-lab unlink -y")]
pub struct UnlinkArgs {
    /// Project directory (defaults to current directory)
    pub path: Option<PathBuf>,

    /// Remove a link to another location without confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Project directory (defaults to current directory)
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;

    #[test]
    fn test_cli_parsing_link() {
        let cli = Cli::try_parse_from(["skill-lab", "link", "/tmp/project"]).unwrap();
        match cli.command {
            Commands::Link(args) => {
                assert_eq!(args.path, Some(PathBuf::from("/tmp/project")));
            }
            _ => panic!("Expected Link command"),
        }
    }

    #[test]
    fn test_cli_parsing_unlink() {
        let cli = Cli::try_parse_from(["skill-lab", "unlink", "-y"]).unwrap();
        match cli.command {
            Commands::Unlink(args) => {
                assert_eq!(args.path, None);
                assert!(args.yes);
            }
            _ => panic!("Expected Unlink command"),
        }
    }

    #[test]
    fn test_cli_parsing_check() {
        let cli = Cli::try_parse_from(["skill-lab", "check"]).unwrap();
        assert!(matches!(cli.command, Commands::Check(CheckArgs { path: None })));
    }
}
