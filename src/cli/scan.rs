use clap::Parser;
use std::path::PathBuf;

/// Arguments for the scan command
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Project directory (defaults to current directory)
    pub path: Option<PathBuf>,
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Suggest packages for the current project:\n    skill-lab detect\n\n\
                  Machine-readable report:\n    skill-lab detect ~/code/my-app --json")]
pub struct DetectArgs {
    /// Project directory (defaults to current directory)
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;

    #[test]
    fn test_cli_parsing_scan() {
        let cli = Cli::try_parse_from(["skill-lab", "scan", "/tmp/project"]).unwrap();
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.path, Some(PathBuf::from("/tmp/project")));
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parsing_detect_json() {
        let cli = Cli::try_parse_from(["skill-lab", "detect", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Detect(DetectArgs { path: None })));
    }
}
