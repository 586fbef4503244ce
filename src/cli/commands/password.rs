//! `vaultkeep password ...`: stored logins.

use zeroize::{Zeroize, Zeroizing};

use crate::audit::log_audit;
use crate::cli::output;
use crate::cli::{
    confirm, copy_and_wait, prompt_secret, resolve, short_id, unlock_vault, workspace, Cli,
    PasswordAction,
};
use crate::errors::Result;
use crate::vault::PasswordEntry;

/// Execute a `password` subcommand.
pub fn execute(cli: &Cli, action: &PasswordAction) -> Result<()> {
    let ws = workspace(cli)?;
    let mut vault = unlock_vault(&ws, cli.vault.as_deref())?;

    match action {
        PasswordAction::Add {
            name,
            username,
            password,
            url,
            notes,
            category,
        } => {
            let password = match password {
                Some(pw) => Zeroizing::new(pw.clone()),
                None => prompt_secret("Password")?,
            };
            let entry = PasswordEntry::new(name, username, password.as_str(), category)
                .with_url(url)
                .with_notes(notes);

            let id = vault.document_mut()?.add(entry)?;
            vault.save()?;

            log_audit(ws.home(), vault.name(), "add", Some(&id.to_string()), Some("password"));
            output::success(&format!("Added password '{name}' ({})", short_id(&id)));
        }

        PasswordAction::List { category, search } => {
            let doc = vault.document()?;
            let entries = match search {
                Some(q) => doc
                    .search_passwords(q)
                    .into_iter()
                    .filter(|(_, e)| category.as_deref().map_or(true, |c| e.category == c))
                    .collect(),
                None => doc.list::<PasswordEntry>(category.as_deref()),
            };
            output::print_passwords_table(&entries);
        }

        PasswordAction::Show { id, reveal } => {
            let doc = vault.document()?;
            let id = resolve::<PasswordEntry>(doc, id)?;
            let e = doc.get::<PasswordEntry>(&id)?;
            let password = if *reveal {
                e.password.clone()
            } else {
                "********".to_string()
            };
            output::print_fields(&[
                ("Id", id.to_string()),
                ("Name", e.name.clone()),
                ("Username", e.username.clone()),
                ("Password", password),
                ("URL", e.url.clone()),
                ("Notes", e.notes.clone()),
                ("Category", e.category.clone()),
                ("Created", output::timestamp(&e.created)),
                ("Modified", output::timestamp(&e.modified)),
            ]);
        }

        PasswordAction::Copy { id, username } => {
            let doc = vault.document()?;
            let id = resolve::<PasswordEntry>(doc, id)?;
            let e = doc.get::<PasswordEntry>(&id)?;
            let (text, what) = if *username {
                (Zeroizing::new(e.username.clone()), "username")
            } else {
                (Zeroizing::new(e.password.clone()), "password")
            };
            log_audit(ws.home(), vault.name(), "copy", Some(&id.to_string()), Some(what));
            return copy_and_wait(&ws, vault, &text, what);
        }

        PasswordAction::Edit {
            id,
            name,
            username,
            password,
            prompt_password,
            url,
            notes,
            category,
        } => {
            let id = resolve::<PasswordEntry>(vault.document()?, id)?;
            let new_password = match (password, *prompt_password) {
                (Some(pw), _) => Some(Zeroizing::new(pw.clone())),
                (None, true) => Some(prompt_secret("New password")?),
                (None, false) => None,
            };

            vault.document_mut()?.edit::<PasswordEntry, _>(&id, |e| {
                if let Some(v) = name {
                    e.name = v.clone();
                }
                if let Some(v) = username {
                    e.username = v.clone();
                }
                if let Some(v) = &new_password {
                    e.password = v.to_string();
                }
                if let Some(v) = url {
                    e.url = v.clone();
                }
                if let Some(v) = notes {
                    e.notes = v.clone();
                }
                if let Some(v) = category {
                    e.category = v.clone();
                }
            })?;
            vault.save()?;

            log_audit(ws.home(), vault.name(), "edit", Some(&id.to_string()), Some("password"));
            output::success(&format!("Updated password {}", short_id(&id)));
        }

        PasswordAction::Delete { id, force } => {
            let id = resolve::<PasswordEntry>(vault.document()?, id)?;
            let name = vault.document()?.get::<PasswordEntry>(&id)?.name.clone();
            confirm(&format!("Delete password '{name}'?"), *force)?;

            vault.document_mut()?.remove::<PasswordEntry>(&id)?.zeroize();
            vault.save()?;

            log_audit(ws.home(), vault.name(), "delete", Some(&id.to_string()), Some("password"));
            output::success(&format!("Deleted password '{name}'"));
        }
    }

    Ok(())
}
