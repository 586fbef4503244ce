//! `vaultkeep audit`: display the audit log.
//!
//! Usage:
//!   vaultkeep audit                   # last 50 entries, all vaults
//!   vaultkeep audit --last 20         # last 20
//!   vaultkeep --vault work audit      # only the "work" vault

use crate::cli::output;
use crate::cli::{workspace, Cli};
use crate::errors::Result;

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize) -> Result<()> {
    use crate::audit::AuditLog;
    use crate::errors::VaultError;

    let ws = workspace(cli)?;
    let audit = AuditLog::open(ws.home())
        .ok_or_else(|| VaultError::AuditError("failed to open audit database".into()))?;

    let entries = audit.query(last, cli.vault.as_deref())?;
    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    let rows = entries
        .iter()
        .map(|entry| {
            vec![
                output::timestamp(&entry.timestamp),
                colorize_operation(&entry.operation),
                entry.vault.clone(),
                entry.entry_id.as_deref().map_or("-", short).to_string(),
                entry.details.as_deref().unwrap_or("-").to_string(),
            ]
        })
        .collect();

    println!(
        "{}",
        console::style(format!("{} audit entries:", entries.len())).bold()
    );
    output::print_table(vec!["Time", "Operation", "Vault", "Entry", "Details"], rows);
    Ok(())
}

/// Without the audit feature there is nothing to show.
#[cfg(not(feature = "audit-log"))]
pub fn execute(cli: &Cli, _last: usize) -> Result<()> {
    let _ = workspace(cli)?;
    output::warning("This build has no audit log (feature `audit-log` is off).");
    Ok(())
}

/// First 8 characters of a stored entry id.
#[cfg(feature = "audit-log")]
fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Colorize operation names for display.
#[cfg(feature = "audit-log")]
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "create" | "add" | "file-put" | "category-add" => style(op).green().to_string(),
        "edit" | "restore" => style(op).blue().to_string(),
        "delete" | "delete-vault" | "category-remove" => style(op).red().to_string(),
        "copy" | "file-get" => style(op).yellow().to_string(),
        "backup" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}

#[cfg(all(test, feature = "audit-log"))]
mod tests {
    use super::*;

    #[test]
    fn short_truncates_long_ids_only() {
        assert_eq!(short("1b4e28ba-2fa1-11d2-883f-0016d3cca427"), "1b4e28ba");
        assert_eq!(short("abc"), "abc");
    }

    #[test]
    fn colorize_operation_keeps_text() {
        console::set_colors_enabled(false);
        assert_eq!(colorize_operation("add"), "add");
        assert_eq!(colorize_operation("unlock"), "unlock");
    }
}
