use clap::Parser;
use tracing_subscriber::EnvFilter;
use vaultkeep::cli::commands;
use vaultkeep::cli::{Cli, Commands};

fn main() {
    // Diagnostics go to stderr; VAULTKEEP_LOG=debug shows lifecycle steps.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VAULTKEEP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Vault { ref action } => commands::vault_cmd::execute(&cli, action),
        Commands::Password { ref action } => commands::password::execute(&cli, action),
        Commands::Totp { ref action } => commands::totp::execute(&cli, action),
        Commands::Note { ref action } => commands::note::execute(&cli, action),
        Commands::File { ref action } => commands::file::execute(&cli, action),
        Commands::Category { ref action } => commands::category::execute(&cli, action),
        Commands::Config { ref action } => commands::config_cmd::execute(&cli, action),
        Commands::Audit { last } => commands::audit_cmd::execute(&cli, last),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        vaultkeep::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
