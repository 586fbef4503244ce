//! `vaultkeep note ...`: secure notes.

use zeroize::Zeroize;

use crate::audit::log_audit;
use crate::cli::output;
use crate::cli::{
    confirm, prompt_text, resolve, short_id, unlock_vault, workspace, Cli, NoteAction,
};
use crate::errors::Result;
use crate::vault::NoteEntry;

/// Execute a `note` subcommand.
pub fn execute(cli: &Cli, action: &NoteAction) -> Result<()> {
    let ws = workspace(cli)?;
    let mut vault = unlock_vault(&ws, cli.vault.as_deref())?;

    match action {
        NoteAction::Add {
            title,
            content,
            category,
        } => {
            let content = match content {
                Some(c) => c.clone(),
                None => prompt_text("Content")?,
            };
            let id = vault
                .document_mut()?
                .add(NoteEntry::new(title, content, category))?;
            vault.save()?;

            log_audit(ws.home(), vault.name(), "add", Some(&id.to_string()), Some("note"));
            output::success(&format!("Added note '{title}' ({})", short_id(&id)));
        }

        NoteAction::List { category } => {
            let entries = vault.document()?.list::<NoteEntry>(category.as_deref());
            output::print_notes_table(&entries);
        }

        NoteAction::Show { id } => {
            let doc = vault.document()?;
            let id = resolve::<NoteEntry>(doc, id)?;
            let note = doc.get::<NoteEntry>(&id)?;
            output::print_fields(&[
                ("Title", note.title.clone()),
                ("Category", note.category.clone()),
                ("Modified", output::timestamp(&note.modified)),
            ]);
            println!("{}", note.content);
        }

        NoteAction::Edit {
            id,
            title,
            content,
            category,
        } => {
            let id = resolve::<NoteEntry>(vault.document()?, id)?;
            vault.document_mut()?.edit::<NoteEntry, _>(&id, |n| {
                if let Some(v) = title {
                    n.title = v.clone();
                }
                if let Some(v) = content {
                    n.content = v.clone();
                }
                if let Some(v) = category {
                    n.category = v.clone();
                }
            })?;
            vault.save()?;

            log_audit(ws.home(), vault.name(), "edit", Some(&id.to_string()), Some("note"));
            output::success(&format!("Updated note {}", short_id(&id)));
        }

        NoteAction::Delete { id, force } => {
            let id = resolve::<NoteEntry>(vault.document()?, id)?;
            let title = vault.document()?.get::<NoteEntry>(&id)?.title.clone();
            confirm(&format!("Delete note '{title}'?"), *force)?;

            vault.document_mut()?.remove::<NoteEntry>(&id)?.zeroize();
            vault.save()?;

            log_audit(ws.home(), vault.name(), "delete", Some(&id.to_string()), Some("note"));
            output::success(&format!("Deleted note '{title}'"));
        }
    }

    Ok(())
}
