//! The `Vault` handle: one named container and its lock state machine.
//!
//! ```text
//! Uninitialized --create--> Unlocked <--unlock / lock--> Locked
//! ```
//!
//! While unlocked the vault holds the decrypted document, the passphrase
//! and the salt. `lock` (or dropping the handle) wipes all three.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::kdf::{generate_salt, KdfParams, SALT_LEN};
use crate::errors::{Result, VaultError};

use super::document::SecretDocument;
use super::format;

/// Observable lifecycle state of a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    /// No container file exists yet.
    Uninitialized,
    /// A container exists but nothing is decrypted in memory.
    Locked,
    /// The document is decrypted and editable.
    Unlocked,
}

/// Secrets held only while unlocked.
struct Unlocked {
    document: SecretDocument,
    passphrase: Zeroizing<String>,
    salt: [u8; SALT_LEN],
}

impl Drop for Unlocked {
    fn drop(&mut self) {
        self.document.wipe();
    }
}

/// The main vault handle. Create one with `Vault::create` or get a locked
/// handle with `Vault::open`, then `unlock` it.
pub struct Vault {
    name: String,
    path: PathBuf,
    kdf: KdfParams,
    unlocked: Option<Unlocked>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("status", &self.status())
            .finish()
    }
}

impl Vault {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new vault file at `path` and return it unlocked.
    ///
    /// Generates a fresh salt and persists an empty document with the
    /// default categories. If that first write fails no file is left
    /// behind.
    pub fn create(
        name: &str,
        path: &Path,
        passphrase: &str,
        kdf: Option<&KdfParams>,
    ) -> Result<Self> {
        if path.exists() {
            return Err(VaultError::VaultAlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let vault = Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            kdf: kdf.copied().unwrap_or_default(),
            unlocked: Some(Unlocked {
                document: SecretDocument::new(),
                passphrase: Zeroizing::new(passphrase.to_string()),
                salt: generate_salt(),
            }),
        };
        vault.save()?;

        debug!(vault = %vault.name, path = %vault.path.display(), "vault created");
        Ok(vault)
    }

    /// A locked handle for the container at `path`.
    ///
    /// Nothing is read until `unlock` is called.
    pub fn open(name: &str, path: &Path, kdf: Option<&KdfParams>) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            kdf: kdf.copied().unwrap_or_default(),
            unlocked: None,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn status(&self) -> VaultStatus {
        if self.unlocked.is_some() {
            VaultStatus::Unlocked
        } else if self.path.exists() {
            VaultStatus::Locked
        } else {
            VaultStatus::Uninitialized
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked.is_some()
    }

    /// Decrypt the container with `passphrase`.
    ///
    /// On `AuthenticationFailed` the vault stays locked and the caller may
    /// simply try again; there is no attempt limit. A missing file is
    /// reported as `VaultNotFound`. Unlocking an unlocked vault replaces
    /// its document with the on-disk state.
    pub fn unlock(&mut self, passphrase: &str) -> Result<()> {
        let container = format::read_container(&self.path)?;
        let document = format::decrypt_document(
            &container.token,
            passphrase.as_bytes(),
            &container.salt,
            &self.kdf,
        )?;

        self.unlocked = Some(Unlocked {
            document,
            passphrase: Zeroizing::new(passphrase.to_string()),
            salt: container.salt,
        });

        debug!(vault = %self.name, "vault unlocked");
        Ok(())
    }

    /// Drop the decrypted document and passphrase from memory.
    pub fn lock(&mut self) {
        if self.unlocked.take().is_some() {
            debug!(vault = %self.name, "vault locked");
        }
    }

    /// Re-encrypt the whole in-memory document with the existing salt and
    /// atomically replace the container file.
    ///
    /// There is no journal: if this fails the in-memory document keeps the
    /// mutation but the file still holds the previous state.
    pub fn save(&self) -> Result<()> {
        let state = self.unlocked.as_ref().ok_or(VaultError::VaultLocked)?;
        let (salt, token) = format::encrypt_document(
            &state.document,
            state.passphrase.as_bytes(),
            Some(&state.salt),
            &self.kdf,
        )?;
        format::write_container(&self.path, &salt, &token)?;

        debug!(vault = %self.name, bytes = token.len(), "vault saved");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Document access
    // ------------------------------------------------------------------

    pub fn document(&self) -> Result<&SecretDocument> {
        self.unlocked
            .as_ref()
            .map(|u| &u.document)
            .ok_or(VaultError::VaultLocked)
    }

    /// Mutable access for entry operations. Call `save` afterwards.
    pub fn document_mut(&mut self) -> Result<&mut SecretDocument> {
        self.unlocked
            .as_mut()
            .map(|u| &mut u.document)
            .ok_or(VaultError::VaultLocked)
    }

    /// The unlock passphrase, needed by the file locker.
    pub(crate) fn passphrase(&self) -> Result<&str> {
        self.unlocked
            .as_ref()
            .map(|u| u.passphrase.as_str())
            .ok_or(VaultError::VaultLocked)
    }

    // ------------------------------------------------------------------
    // Backups
    // ------------------------------------------------------------------

    /// Copy the encrypted container to `dest`.
    ///
    /// If `dest` is a directory a timestamped file name is chosen inside it.
    /// Returns the path written.
    pub fn backup_to(&self, dest: &Path) -> Result<PathBuf> {
        if !self.path.exists() {
            return Err(VaultError::VaultNotFound(self.path.clone()));
        }

        let target = if dest.is_dir() {
            dest.join(format!(
                "{}_backup_{}.vault",
                self.name,
                Local::now().format("%Y%m%d_%H%M%S")
            ))
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            dest.to_path_buf()
        };

        fs::copy(&self.path, &target)?;
        debug!(vault = %self.name, target = %target.display(), "backup written");
        Ok(target)
    }

    /// Replace the container with the backup at `source` and lock the vault.
    ///
    /// The backup is not decrypted here; unlock afterwards to verify it.
    pub fn restore_from(&mut self, source: &Path) -> Result<()> {
        let bytes = match fs::read(source) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VaultError::VaultNotFound(source.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.len() < SALT_LEN {
            return Err(VaultError::AuthenticationFailed);
        }

        self.lock();
        format::write_atomic(&self.path, &bytes)?;
        debug!(vault = %self.name, source = %source.display(), "backup restored");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the vault's registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path to the container file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the KDF parameters this handle derives keys with.
    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }
}
