//! `vaultkeep category ...`: the category set of a vault.

use crate::audit::log_audit;
use crate::cli::output;
use crate::cli::{unlock_vault, workspace, CategoryAction, Cli};
use crate::errors::Result;

/// Execute a `category` subcommand.
pub fn execute(cli: &Cli, action: &CategoryAction) -> Result<()> {
    let ws = workspace(cli)?;
    let mut vault = unlock_vault(&ws, cli.vault.as_deref())?;

    match action {
        CategoryAction::List => {
            let doc = vault.document()?;
            let rows = doc
                .categories()
                .iter()
                .map(|c| vec![c.clone(), doc.category_usage(c).to_string()])
                .collect();
            output::print_table(vec!["Category", "Entries"], rows);
        }

        CategoryAction::Add { name } => {
            vault.document_mut()?.add_category(name)?;
            vault.save()?;
            log_audit(ws.home(), vault.name(), "category-add", None, Some(name));
            output::success(&format!("Added category '{}'", name.trim()));
        }

        CategoryAction::Remove { name } => {
            vault.document_mut()?.remove_category(name)?;
            vault.save()?;
            log_audit(ws.home(), vault.name(), "category-remove", None, Some(name));
            output::success(&format!("Removed category '{name}'"));
        }
    }

    Ok(())
}
