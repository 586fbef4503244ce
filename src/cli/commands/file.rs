//! `vaultkeep file ...`: the encrypted file locker.

use console::Term;

use crate::audit::log_audit;
use crate::cli::output;
use crate::cli::{confirm, resolve, short_id, unlock_vault, workspace, Cli, FileAction};
use crate::errors::Result;
use crate::locker::ProgressResult;
use crate::vault::FileRecord;

/// Execute a `file` subcommand.
pub fn execute(cli: &Cli, action: &FileAction) -> Result<()> {
    let ws = workspace(cli)?;
    let mut vault = unlock_vault(&ws, cli.vault.as_deref())?;
    let locker = ws.locker();

    match action {
        FileAction::Put { path, category } => {
            let id = locker.store(&mut vault, path, category, progress_line("Encrypting"))?;
            Term::stderr().clear_line().ok();

            let size = vault.document()?.get::<FileRecord>(&id)?.size;
            log_audit(ws.home(), vault.name(), "file-put", Some(&id.to_string()), None);
            output::success(&format!(
                "Stored {} ({}) as {}",
                path.display(),
                output::human_size(size),
                short_id(&id)
            ));
        }

        FileAction::List { category } => {
            let entries = vault.document()?.list::<FileRecord>(category.as_deref());
            output::print_files_table(&entries);
        }

        FileAction::Get { id, out } => {
            let id = resolve::<FileRecord>(vault.document()?, id)?;
            let dest_dir = match out {
                Some(dir) => dir.clone(),
                None => std::env::current_dir()?,
            };
            let written = locker.extract(&vault, &id, &dest_dir, progress_line("Decrypting"))?;
            Term::stderr().clear_line().ok();

            log_audit(ws.home(), vault.name(), "file-get", Some(&id.to_string()), None);
            output::success(&format!("Decrypted to {}", written.display()));
        }

        FileAction::Delete { id, force } => {
            let id = resolve::<FileRecord>(vault.document()?, id)?;
            let name = vault.document()?.get::<FileRecord>(&id)?.name.clone();
            confirm(&format!("Delete '{name}' from the locker?"), *force)?;

            locker.remove(&mut vault, &id)?;

            log_audit(ws.home(), vault.name(), "delete", Some(&id.to_string()), Some("file"));
            output::success(&format!("Deleted '{name}' from the locker"));
        }
    }

    Ok(())
}

/// A progress callback rewriting one stderr line.
fn progress_line(verb: &'static str) -> impl FnMut(u8) -> ProgressResult {
    let term = Term::stderr();
    move |percent| {
        term.clear_line()?;
        term.write_str(&format!("{verb}... {percent}%"))?;
        Ok(())
    }
}
