//! `vaultkeep vault ...`: create, list, select, back up and delete vaults.

use std::path::PathBuf;

use crate::audit::log_audit;
use crate::cli::output;
use crate::cli::{confirm, prompt_new_password, unlock_vault, workspace, Cli, VaultAction};
use crate::errors::Result;

/// Execute a `vault` subcommand.
pub fn execute(cli: &Cli, action: &VaultAction) -> Result<()> {
    match action {
        VaultAction::Create {
            name,
            display_name,
        } => create(cli, name, display_name.as_deref()),
        VaultAction::List => list(cli),
        VaultAction::Use { name } => use_vault(cli, name),
        VaultAction::Delete {
            name,
            force,
            keep_files,
        } => delete(cli, name, *force, *keep_files),
        VaultAction::Backup { to } => backup(cli, to.clone()),
        VaultAction::Restore { source, force } => restore(cli, source, *force),
    }
}

fn create(cli: &Cli, name: &str, display_name: Option<&str>) -> Result<()> {
    let mut ws = workspace(cli)?;
    crate::registry::validate_vault_name(name)?;

    let password = prompt_new_password()?;
    let vault = ws.create_vault(name, display_name.unwrap_or(name), &password)?;

    log_audit(ws.home(), name, "create", None, Some("vault created"));
    output::success(&format!(
        "Vault '{name}' created at {}",
        vault.path().display()
    ));
    output::tip("Run `vaultkeep password add <NAME>` to add your first password.");
    Ok(())
}

fn list(cli: &Cli) -> Result<()> {
    let ws = workspace(cli)?;
    let registry = &ws.settings().registry;

    if registry.is_empty() {
        output::info("No vaults registered yet.");
        output::tip("Run `vaultkeep vault create <NAME>` to create one.");
        return Ok(());
    }

    let rows = registry
        .iter()
        .map(|(name, meta)| {
            let marker = if registry.active() == Some(name) { "*" } else { "" };
            let state = if meta.path.exists() { "ok" } else { "missing file" };
            vec![
                marker.to_string(),
                name.to_string(),
                meta.display_name.clone(),
                meta.path.display().to_string(),
                state.to_string(),
            ]
        })
        .collect();
    output::print_table(vec!["", "Name", "Display name", "Path", "File"], rows);
    Ok(())
}

fn use_vault(cli: &Cli, name: &str) -> Result<()> {
    let mut ws = workspace(cli)?;
    ws.select(name)?;
    output::success(&format!("'{name}' is now the active vault"));
    Ok(())
}

fn delete(cli: &Cli, name: &str, force: bool, keep_files: bool) -> Result<()> {
    let mut ws = workspace(cli)?;
    ws.resolve_name(Some(name))?;

    confirm(
        &format!("Delete vault '{name}' and all of its files? This cannot be undone"),
        force,
    )?;

    // Locker blobs are only known to the decrypted document. Without a
    // container there is nothing to unlock, so only the entry goes.
    let handle = ws.open_vault(Some(name))?;
    let purged = if keep_files {
        None
    } else if !handle.path().exists() {
        output::warning(&format!(
            "Container {} is missing; unregistering without removing locker files",
            handle.path().display()
        ));
        None
    } else {
        let vault = unlock_vault(&ws, Some(name))?;
        Some(ws.locker().purge(&vault)?)
    };

    let path = ws.delete_vault(name)?;
    let details = match purged {
        Some(n) => format!("{n} locker files removed"),
        None => "locker files kept".to_string(),
    };
    log_audit(ws.home(), name, "delete-vault", None, Some(&details));
    output::success(&format!("Deleted vault '{name}' ({})", path.display()));
    Ok(())
}

fn backup(cli: &Cli, to: Option<PathBuf>) -> Result<()> {
    let ws = workspace(cli)?;
    let vault = ws.open_vault(cli.vault.as_deref())?;

    let dest = match to.or_else(|| ws.settings().default_backup_dir.clone()) {
        Some(dest) => dest,
        None => std::env::current_dir()?,
    };
    let written = vault.backup_to(&dest)?;

    log_audit(
        ws.home(),
        vault.name(),
        "backup",
        None,
        Some(&written.display().to_string()),
    );
    output::success(&format!("Backup written to {}", written.display()));
    Ok(())
}

fn restore(cli: &Cli, source: &std::path::Path, force: bool) -> Result<()> {
    let ws = workspace(cli)?;
    let mut vault = ws.open_vault(cli.vault.as_deref())?;

    confirm(
        &format!(
            "Replace vault '{}' with {}? Current contents will be lost",
            vault.name(),
            source.display()
        ),
        force,
    )?;
    vault.restore_from(source)?;

    log_audit(
        ws.home(),
        vault.name(),
        "restore",
        None,
        Some(&source.display().to_string()),
    );
    output::success(&format!("Restored '{}' from {}", vault.name(), source.display()));
    output::tip("Unlock the vault to check the backup, e.g. `vaultkeep password list`.");
    Ok(())
}
