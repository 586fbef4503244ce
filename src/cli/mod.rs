//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::clipboard::{ClipboardTimer, SystemClipboard};
use crate::config::resolve_home;
use crate::errors::{Result, VaultError};
use crate::session::Session;
use crate::vault::{Entry, SecretDocument, Vault};
use crate::workspace::Workspace;

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable holding the vault passphrase for scripted use.
pub const PASSWORD_ENV: &str = "VAULTKEEP_PASSWORD";

/// VaultKeep CLI: local encrypted vault for passwords, 2FA codes, notes and files.
#[derive(Parser)]
#[command(
    name = "vaultkeep",
    about = "Local encrypted vault for passwords, 2FA codes, notes and files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// VaultKeep home directory (default: ~/.vaultkeep)
    #[arg(long, env = "VAULTKEEP_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Vault to operate on (default: the active vault)
    #[arg(long, global = true)]
    pub vault: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create, select, back up and delete vaults
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },

    /// Manage stored passwords
    Password {
        #[command(subcommand)]
        action: PasswordAction,
    },

    /// Manage 2FA (TOTP) entries and show their codes
    Totp {
        #[command(subcommand)]
        action: TotpAction,
    },

    /// Manage secure notes
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },

    /// Encrypt files into the locker and get them back
    File {
        #[command(subcommand)]
        action: FileAction,
    },

    /// Manage the categories of the current vault
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Vault subcommands.
#[derive(clap::Subcommand)]
pub enum VaultAction {
    /// Create a new vault and make it active
    Create {
        /// Vault name (lowercase letters, digits, '-' and '_')
        name: String,
        /// Human-friendly name shown in listings
        #[arg(long)]
        display_name: Option<String>,
    },

    /// List registered vaults
    List,

    /// Make a vault the active one
    Use {
        name: String,
    },

    /// Delete a vault, its locker files and its registry entry
    Delete {
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
        /// Unregister without unlocking; locker files stay on disk
        #[arg(long)]
        keep_files: bool,
    },

    /// Copy the encrypted vault file to a backup location
    Backup {
        /// Destination file or directory (default: configured backup dir or cwd)
        #[arg(long)]
        to: Option<PathBuf>,
    },

    /// Replace the vault with a backup
    Restore {
        /// Backup file to restore from
        source: PathBuf,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Password subcommands.
#[derive(clap::Subcommand)]
pub enum PasswordAction {
    /// Add a password (prompts for the secret if not given)
    Add {
        /// Entry name (e.g. "GitHub")
        name: String,
        #[arg(short, long, default_value = "")]
        username: String,
        /// Password value (omit for interactive prompt)
        #[arg(short, long)]
        password: Option<String>,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(short, long, default_value = "Personal")]
        category: String,
    },

    /// List passwords
    List {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
        /// Case-insensitive search over name, username and url
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one password entry
    Show {
        /// Entry id or unique id prefix
        id: String,
        /// Print the password instead of masking it
        #[arg(long)]
        reveal: bool,
    },

    /// Copy the password (or username) to the clipboard
    Copy {
        id: String,
        /// Copy the username instead of the password
        #[arg(long)]
        username: bool,
    },

    /// Change fields of a password entry
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        username: Option<String>,
        /// New password (pass --prompt-password to type it instead)
        #[arg(short, long)]
        password: Option<String>,
        /// Prompt for a new password
        #[arg(long)]
        prompt_password: bool,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Delete a password entry
    Delete {
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// TOTP subcommands.
#[derive(clap::Subcommand)]
pub enum TotpAction {
    /// Add a 2FA entry from an otpauth:// URI or a raw base32 secret
    Add {
        /// otpauth:// URI (e.g. decoded from a QR code) or a raw secret
        source: String,
        /// Entry name (default: issuer, else account, else "2FA")
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        issuer: Option<String>,
        #[arg(long)]
        account: Option<String>,
        /// SHA1, SHA256 or SHA512
        #[arg(long)]
        algorithm: Option<String>,
        /// 6 or 8
        #[arg(long)]
        digits: Option<u32>,
        /// Seconds per code
        #[arg(long)]
        period: Option<u64>,
        #[arg(short, long, default_value = "Personal")]
        category: String,
    },

    /// List 2FA entries with their current codes
    List {
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Print the current code for an entry
    Code {
        id: String,
        /// Also copy the code to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Print the otpauth:// provisioning URI for an entry
    Uri {
        id: String,
    },

    /// Change fields of a 2FA entry
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        issuer: Option<String>,
        #[arg(long)]
        account: Option<String>,
        /// New base32 secret
        #[arg(long)]
        secret: Option<String>,
        /// SHA1, SHA256 or SHA512
        #[arg(long)]
        algorithm: Option<String>,
        /// 6 or 8
        #[arg(long)]
        digits: Option<u32>,
        /// Seconds per code
        #[arg(long)]
        period: Option<u64>,
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Delete a 2FA entry
    Delete {
        id: String,
        #[arg(short, long)]
        force: bool,
    },
}

/// Note subcommands.
#[derive(clap::Subcommand)]
pub enum NoteAction {
    /// Add a note (prompts for the content if not given)
    Add {
        title: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(short, long, default_value = "Personal")]
        category: String,
    },

    /// List notes
    List {
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Print a note
    Show {
        id: String,
    },

    /// Change a note's title, content or category
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Delete a note
    Delete {
        id: String,
        #[arg(short, long)]
        force: bool,
    },
}

/// File locker subcommands.
#[derive(clap::Subcommand)]
pub enum FileAction {
    /// Encrypt a file into the locker
    Put {
        path: PathBuf,
        #[arg(short, long, default_value = "Personal")]
        category: String,
    },

    /// List files in the locker
    List {
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Decrypt a file from the locker into a directory
    Get {
        id: String,
        /// Output directory (default: current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Delete a file and its encrypted blob
    Delete {
        id: String,
        #[arg(short, long)]
        force: bool,
    },
}

/// Category subcommands.
#[derive(clap::Subcommand)]
pub enum CategoryAction {
    /// List categories with entry counts
    List,
    /// Add a category
    Add { name: String },
    /// Remove an unused category
    Remove { name: String },
}

/// Config subcommands.
#[derive(clap::Subcommand)]
pub enum ConfigAction {
    /// Print the current settings
    Show,
    /// Change a setting (clipboard_clear_seconds, auto_lock_seconds, default_backup_dir)
    Set { key: String, value: String },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load the workspace for `--home` / `VAULTKEEP_HOME` / `~/.vaultkeep`.
pub fn workspace(cli: &Cli) -> Result<Workspace> {
    Workspace::load(resolve_home(cli.home.clone())?)
}

/// Open `name` (or the active vault) and unlock it.
///
/// With `VAULTKEEP_PASSWORD` set there is exactly one attempt. Otherwise
/// the prompt repeats on a wrong passphrase until it succeeds or the user
/// aborts; there is no attempt limit.
pub fn unlock_vault(ws: &Workspace, name: Option<&str>) -> Result<Vault> {
    let mut vault = ws.open_vault(name)?;
    if !vault.path().exists() {
        return Err(VaultError::VaultNotFound(vault.path().to_path_buf()));
    }

    if let Some(pw) = password_from_env() {
        vault.unlock(&pw)?;
    } else {
        loop {
            let pw = prompt_secret(&format!("Passphrase for '{}'", vault.name()))?;
            match vault.unlock(&pw) {
                Ok(()) => break,
                Err(VaultError::AuthenticationFailed) => {
                    output::error("Wrong passphrase or corrupted vault. Try again.");
                }
                Err(e) => return Err(e),
            }
        }
    }

    crate::audit::log_audit(ws.home(), vault.name(), "unlock", None, None);
    Ok(vault)
}

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Prompt for a hidden value.
pub fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Prompt for a visible line of text.
pub fn prompt_text(prompt: &str) -> Result<String> {
    dialoguer::Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))
}

/// Ask before a destructive action unless `force` is set.
pub fn confirm(prompt: &str, force: bool) -> Result<()> {
    if force {
        return Ok(());
    }
    let yes = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("failed to read confirmation: {e}")))?;
    if yes {
        Ok(())
    } else {
        Err(VaultError::UserCancelled)
    }
}

/// Prompt for a new password with confirmation (used by `vault create`).
///
/// Also respects `VAULTKEEP_PASSWORD` for scripted/CI usage.
/// Enforces a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        if pw.len() < MIN_PASSWORD_LEN {
            return Err(VaultError::CommandFailed(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose vault passphrase")
            .with_confirmation(
                "Confirm vault passphrase",
                "Passphrases do not match, try again",
            )
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Passphrase must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Copy `text` through a session clipboard timer and wait for the clear.
///
/// The process has to stay alive until the clear fires, otherwise the
/// secret would linger on the clipboard.
pub fn copy_and_wait(ws: &Workspace, vault: Vault, text: &str, what: &str) -> Result<()> {
    let timer = ClipboardTimer::new(SystemClipboard, || output::info("Clipboard cleared."));
    let mut session = Session::new(vault, timer, ws.settings());
    session.copy_secret(text)?;

    let clear = session.clipboard_clear();
    output::success(&format!(
        "Copied {what} to the clipboard; clearing in {}s",
        clear.as_secs()
    ));
    if !session.clipboard().wait(clear.saturating_add(Duration::from_secs(5))) {
        output::warning("Clipboard clear did not complete; clear it manually.");
    }
    session.lock();
    Ok(())
}

/// Resolve a user-typed id (full or prefix) for entries of kind `E`.
pub fn resolve<E: Entry>(doc: &SecretDocument, needle: &str) -> Result<Uuid> {
    doc.resolve_id::<E>(needle.trim())
}

/// First 8 hex digits of an id, as shown in tables.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
