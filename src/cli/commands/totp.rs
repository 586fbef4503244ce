//! `vaultkeep totp ...`: 2FA entries and their codes.

use zeroize::{Zeroize, Zeroizing};

use crate::audit::log_audit;
use crate::cli::output;
use crate::cli::{
    confirm, copy_and_wait, resolve, short_id, unlock_vault, workspace, Cli, TotpAction,
};
use crate::errors::Result;
use crate::totp::{parse_otpauth_uri, TotpAlgorithm};
use crate::vault::TotpEntry;

/// Execute a `totp` subcommand.
pub fn execute(cli: &Cli, action: &TotpAction) -> Result<()> {
    let ws = workspace(cli)?;
    let mut vault = unlock_vault(&ws, cli.vault.as_deref())?;

    match action {
        TotpAction::Add {
            source,
            name,
            issuer,
            account,
            algorithm,
            digits,
            period,
            category,
        } => {
            // Explicit flags override whatever the URI carried.
            let mut fields = parse_otpauth_uri(source);
            if issuer.is_some() {
                fields.issuer = issuer.clone();
            }
            if account.is_some() {
                fields.account = account.clone();
            }
            if let Some(alg) = algorithm {
                fields.algorithm = Some(alg.parse::<TotpAlgorithm>()?);
            }
            if digits.is_some() {
                fields.digits = *digits;
            }
            if period.is_some() {
                fields.period = *period;
            }

            let mut entry = fields.into_entry(category)?;
            if let Some(name) = name {
                entry.name = name.clone();
            }
            let label = entry.name.clone();

            let id = vault.document_mut()?.add(entry)?;
            vault.save()?;

            log_audit(ws.home(), vault.name(), "add", Some(&id.to_string()), Some("2fa"));
            output::success(&format!("Added 2FA entry '{label}' ({})", short_id(&id)));
        }

        TotpAction::List { category } => {
            let entries = vault.document()?.list::<TotpEntry>(category.as_deref());
            output::print_totp_table(&entries);
        }

        TotpAction::Code { id, copy } => {
            let doc = vault.document()?;
            let id = resolve::<TotpEntry>(doc, id)?;
            let entry = doc.get::<TotpEntry>(&id)?;
            let code = entry.code()?;
            println!("{}", output::styled_code(&code));

            if *copy {
                let text = Zeroizing::new(code.code.clone());
                return copy_and_wait(&ws, vault, &text, "code");
            }
        }

        TotpAction::Uri { id } => {
            let doc = vault.document()?;
            let id = resolve::<TotpEntry>(doc, id)?;
            println!("{}", doc.get::<TotpEntry>(&id)?.provisioning_uri());
        }

        TotpAction::Edit {
            id,
            name,
            issuer,
            account,
            secret,
            algorithm,
            digits,
            period,
            category,
        } => {
            let id = resolve::<TotpEntry>(vault.document()?, id)?;
            let algorithm = algorithm
                .as_deref()
                .map(str::parse::<TotpAlgorithm>)
                .transpose()?;

            // The document re-validates secret, digits and period.
            vault.document_mut()?.edit::<TotpEntry, _>(&id, |e| {
                if let Some(v) = name {
                    e.name = v.clone();
                }
                if let Some(v) = issuer {
                    e.issuer = v.clone();
                }
                if let Some(v) = account {
                    e.account = v.clone();
                }
                if let Some(v) = secret {
                    e.secret.zeroize();
                    e.secret = v.trim().to_string();
                }
                if let Some(v) = algorithm {
                    e.algorithm = v;
                }
                if let Some(v) = digits {
                    e.digits = *v;
                }
                if let Some(v) = period {
                    e.period = *v;
                }
                if let Some(v) = category {
                    e.category = v.clone();
                }
            })?;
            vault.save()?;

            log_audit(ws.home(), vault.name(), "edit", Some(&id.to_string()), Some("2fa"));
            output::success(&format!("Updated 2FA entry {}", short_id(&id)));
        }

        TotpAction::Delete { id, force } => {
            let id = resolve::<TotpEntry>(vault.document()?, id)?;
            let name = vault.document()?.get::<TotpEntry>(&id)?.name.clone();
            confirm(&format!("Delete 2FA entry '{name}'?"), *force)?;

            vault.document_mut()?.remove::<TotpEntry>(&id)?.zeroize();
            vault.save()?;

            log_audit(ws.home(), vault.name(), "delete", Some(&id.to_string()), Some("2fa"));
            output::success(&format!("Deleted 2FA entry '{name}'"));
        }
    }

    Ok(())
}
