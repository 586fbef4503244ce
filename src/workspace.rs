//! A VaultKeep home directory: settings, registered vaults and the locker.
//!
//! Registry changes and container files are kept in step here, so callers
//! never register a vault without a file or leave a file behind after
//! unregistering it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Settings;
use crate::crypto::KdfParams;
use crate::errors::{Result, VaultError};
use crate::locker::Locker;
use crate::registry::validate_vault_name;
use crate::vault::Vault;

#[derive(Debug)]
pub struct Workspace {
    home: PathBuf,
    settings: Settings,
    kdf: KdfParams,
}

impl Workspace {
    /// Load `<home>/config.toml` (defaults if absent).
    pub fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let home = home.into();
        let settings = Settings::load(&home)?;
        Ok(Self {
            home,
            settings,
            kdf: KdfParams::default(),
        })
    }

    /// Use non-default KDF parameters for every vault opened from here.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn save_settings(&self) -> Result<()> {
        self.settings.save(&self.home)
    }

    pub fn locker(&self) -> Locker {
        Locker::new(Settings::locker_dir(&self.home))
    }

    /// Create, register and activate a new vault.
    ///
    /// Either all of this happens or none of it: if the registry cannot be
    /// saved the freshly written container is removed again.
    pub fn create_vault(
        &mut self,
        name: &str,
        display_name: &str,
        passphrase: &str,
    ) -> Result<Vault> {
        validate_vault_name(name)?;
        if self.settings.registry.contains(name) {
            return Err(VaultError::VaultAlreadyRegistered(name.to_string()));
        }

        let path = Settings::vault_path(&self.home, name);
        let vault = Vault::create(name, &path, passphrase, Some(&self.kdf))?;

        let previous = self.settings.registry.clone();
        let registered = self
            .settings
            .registry
            .register(name, display_name, &path)
            .and_then(|_| self.settings.registry.set_active(name))
            .and_then(|_| self.save_settings());

        if let Err(e) = registered {
            self.settings.registry = previous;
            if let Err(rm) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %rm, "could not remove new vault file");
            }
            return Err(e);
        }

        debug!(vault = name, "vault registered");
        Ok(vault)
    }

    /// The name `explicit` resolves to, falling back to the active vault.
    pub fn resolve_name(&self, explicit: Option<&str>) -> Result<String> {
        let name = match explicit {
            Some(name) => name,
            None => self.settings.registry.active().ok_or(VaultError::NoActiveVault)?,
        };
        if !self.settings.registry.contains(name) {
            return Err(VaultError::UnknownVault(name.to_string()));
        }
        Ok(name.to_string())
    }

    /// A locked handle for `explicit` (or the active vault).
    pub fn open_vault(&self, explicit: Option<&str>) -> Result<Vault> {
        let name = self.resolve_name(explicit)?;
        let meta = self
            .settings
            .registry
            .get(&name)
            .ok_or_else(|| VaultError::UnknownVault(name.clone()))?;
        Ok(Vault::open(&name, &meta.path, Some(&self.kdf)))
    }

    /// Make `name` the active vault and persist the choice.
    pub fn select(&mut self, name: &str) -> Result<()> {
        self.settings.registry.set_active(name)?;
        self.save_settings()
    }

    /// Unregister `name` and delete its container file.
    ///
    /// Locker blobs are not touched; purge them first with an unlocked
    /// handle (`Locker::purge`) if they should go too.
    pub fn delete_vault(&mut self, name: &str) -> Result<PathBuf> {
        let meta = self.settings.registry.remove(name)?;
        self.save_settings()?;

        match fs::remove_file(&meta.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %meta.path.display(), "vault file was already gone");
            }
            Err(e) => return Err(e.into()),
        }

        debug!(vault = name, "vault deleted");
        Ok(meta.path)
    }
}
