use clap::Parser;

/// Arguments for the sync command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Commit and promote with a generated message:\n    skill-lab sync\n\n\
                  Commit with a message:\n    skill-lab sync -m \"Add pdf-helper\"\n\n\
                  Commit on experimental only:\n    skill-lab sync --no-promote\n\n\
                  Promote without installing dependencies:\n    skill-lab sync --no-install")]
pub struct SyncArgs {
    /// Commit message (generated from the change summary if omitted)
    #[arg(long, short = 'm')]
    pub message: Option<String>,

    /// Commit without merging into stable
    #[arg(long = "no-promote")]
    pub no_promote: bool,

    /// Reconcile the dependency manifest but do not install
    #[arg(long = "no-install")]
    pub no_install: bool,
}
