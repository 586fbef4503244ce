//! `vaultkeep completions <shell>`: print a shell completion script.
//!
//! Usage:
//!   vaultkeep completions bash > ~/.local/share/bash-completion/completions/vaultkeep
//!   vaultkeep completions zsh > ~/.zfunc/_vaultkeep

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    render(shell, &mut io::stdout().lock())
}

/// Write the completion script for `shell` to `out`.
pub fn render(shell: Shell, out: &mut impl Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "vaultkeep", out);
    out.flush()?;
    Ok(())
}
