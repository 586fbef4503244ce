//! The vault registry: which named vaults exist and which one is active.
//!
//! The registry is persisted unencrypted inside `config.toml` (see
//! `config::Settings`); it only holds names and paths, never secrets.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Maximum length of a vault name.
const MAX_NAME_LEN: usize = 64;

/// One registered vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMeta {
    pub display_name: String,
    pub path: PathBuf,
}

/// Name → metadata map plus the active selection.
///
/// Invariant: `active_vault`, when set, names a registered vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRegistry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_vault: Option<String>,

    #[serde(default)]
    vaults: BTreeMap<String, VaultMeta>,
}

impl VaultRegistry {
    /// Add a vault. The name must be unused and well-formed.
    pub fn register(
        &mut self,
        name: &str,
        display_name: &str,
        path: impl Into<PathBuf>,
    ) -> Result<()> {
        validate_vault_name(name)?;
        if self.vaults.contains_key(name) {
            return Err(VaultError::VaultAlreadyRegistered(name.to_string()));
        }

        let display_name = if display_name.trim().is_empty() {
            name.to_string()
        } else {
            display_name.trim().to_string()
        };
        self.vaults.insert(
            name.to_string(),
            VaultMeta {
                display_name,
                path: path.into(),
            },
        );
        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        if !self.vaults.contains_key(name) {
            return Err(VaultError::UnknownVault(name.to_string()));
        }
        self.active_vault = Some(name.to_string());
        Ok(())
    }

    /// Unregister a vault, clearing the active selection if it pointed here.
    ///
    /// The container file is the caller's to delete.
    pub fn remove(&mut self, name: &str) -> Result<VaultMeta> {
        let meta = self
            .vaults
            .remove(name)
            .ok_or_else(|| VaultError::UnknownVault(name.to_string()))?;
        if self.active_vault.as_deref() == Some(name) {
            self.active_vault = None;
        }
        Ok(meta)
    }

    pub fn active(&self) -> Option<&str> {
        self.active_vault.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&VaultMeta> {
        self.vaults.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vaults.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VaultMeta)> {
        self.vaults.iter().map(|(name, meta)| (name.as_str(), meta))
    }

    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    /// Drop a dangling active selection, e.g. after a hand-edited config.
    pub fn normalize(&mut self) {
        if let Some(active) = &self.active_vault {
            if !self.vaults.contains_key(active) {
                self.active_vault = None;
            }
        }
    }
}

/// Validate that a vault name is safe to use as a file stem.
///
/// Allowed: lowercase letters, digits, hyphens and underscores. Must not be
/// empty or start with a hyphen. Max length 64 characters.
pub fn validate_vault_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VaultError::invalid("vault name", "cannot be empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(VaultError::invalid(
            "vault name",
            format!("cannot exceed {MAX_NAME_LEN} characters"),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(VaultError::invalid(
            "vault name",
            format!("'{name}' may only contain lowercase letters, digits, '-' and '_'"),
        ));
    }

    if name.starts_with('-') {
        return Err(VaultError::invalid(
            "vault name",
            format!("'{name}' cannot start with a hyphen"),
        ));
    }

    Ok(())
}
