use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    skill-lab completions bash > ~/.bash_completion.d/skill-lab\n\n\
                  Generate zsh completions:\n    skill-lab completions zsh > ~/.zfunc/_skill-lab\n\n\
                  Generate fish completions:\n    skill-lab completions fish > ~/.config/fish/completions/skill-lab.fish\n\n\
                  Generate PowerShell completions:\n    skill-lab completions powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
