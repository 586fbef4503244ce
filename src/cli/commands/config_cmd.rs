//! `vaultkeep config ...`: show and change `config.toml` settings.

use crate::cli::output;
use crate::cli::{workspace, Cli, ConfigAction};
use crate::config::Settings;
use crate::errors::Result;

/// Execute a `config` subcommand.
pub fn execute(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let mut ws = workspace(cli)?;

    match action {
        ConfigAction::Show => {
            let s = ws.settings();
            let backup_dir = s
                .default_backup_dir
                .as_ref()
                .map_or_else(|| "(current directory)".to_string(), |p| p.display().to_string());
            output::print_fields(&[
                ("home", ws.home().display().to_string()),
                ("config file", Settings::config_path(ws.home()).display().to_string()),
                ("clipboard_clear_seconds", s.clipboard_clear_seconds.to_string()),
                ("auto_lock_seconds", s.auto_lock_seconds.to_string()),
                ("default_backup_dir", backup_dir),
                ("active vault", s.registry.active().unwrap_or("(none)").to_string()),
            ]);
        }

        ConfigAction::Set { key, value } => {
            ws.settings_mut().set_value(key, value)?;
            ws.save_settings()?;
            output::success(&format!("Set {key} = {value}"));
        }
    }

    Ok(())
}
