use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};
use crate::registry::VaultRegistry;
use crate::vault::format::write_atomic;

/// Home-level configuration, loaded from `<home>/config.toml`.
///
/// Every field has a sensible default so VaultKeep works out-of-the-box
/// without any config file at all. The file is not encrypted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds before a copied secret is wiped from the clipboard.
    #[serde(default = "default_clipboard_clear_seconds")]
    pub clipboard_clear_seconds: u64,

    /// Idle seconds before an unlocked session locks itself (0 = never).
    #[serde(default = "default_auto_lock_seconds")]
    pub auto_lock_seconds: u64,

    /// Where `vault backup` writes when no destination is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_backup_dir: Option<PathBuf>,

    /// Registered vaults and the active selection.
    #[serde(default)]
    pub registry: VaultRegistry,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_clipboard_clear_seconds() -> u64 {
    15
}

fn default_auto_lock_seconds() -> u64 {
    300 // 5 minutes
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            clipboard_clear_seconds: default_clipboard_clear_seconds(),
            auto_lock_seconds: default_auto_lock_seconds(),
            default_backup_dir: None,
            registry: VaultRegistry::default(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the home directory.
    const FILE_NAME: &'static str = "config.toml";

    /// Longest accepted value for either timer setting (one day).
    pub const MAX_TIMER_SECONDS: u64 = 86_400;

    /// Load settings from `<home>/config.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = Self::config_path(home);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let mut settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;
        settings.registry.normalize();

        Ok(settings)
    }

    /// Persist to `<home>/config.toml`, replacing it atomically.
    pub fn save(&self, home: &Path) -> Result<()> {
        std::fs::create_dir_all(home)?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| VaultError::ConfigError(format!("Failed to serialize config: {e}")))?;
        write_atomic(&Self::config_path(home), contents.as_bytes())
    }

    /// Update one setting from its textual form (`config set <key> <value>`).
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parse_secs = |v: &str| {
            v.trim().parse::<u64>().map_err(|_| {
                VaultError::ConfigError(format!("'{key}' expects a whole number of seconds"))
            })
        };

        match key {
            "clipboard_clear_seconds" => {
                let secs = parse_secs(value)?;
                if !(1..=Self::MAX_TIMER_SECONDS).contains(&secs) {
                    return Err(VaultError::ConfigError(format!(
                        "clipboard_clear_seconds must be between 1 and {}",
                        Self::MAX_TIMER_SECONDS
                    )));
                }
                self.clipboard_clear_seconds = secs;
            }
            "auto_lock_seconds" => {
                let secs = parse_secs(value)?;
                if secs > Self::MAX_TIMER_SECONDS {
                    return Err(VaultError::ConfigError(format!(
                        "auto_lock_seconds must be at most {} (0 disables)",
                        Self::MAX_TIMER_SECONDS
                    )));
                }
                self.auto_lock_seconds = secs;
            }
            "default_backup_dir" => {
                self.default_backup_dir =
                    (!value.trim().is_empty()).then(|| PathBuf::from(value.trim()));
            }
            other => {
                return Err(VaultError::ConfigError(format!(
                    "unknown setting '{other}' (expected clipboard_clear_seconds, auto_lock_seconds or default_backup_dir)"
                )));
            }
        }
        Ok(())
    }

    /// Full path to the config file.
    pub fn config_path(home: &Path) -> PathBuf {
        home.join(Self::FILE_NAME)
    }

    /// Build the full path to a vault container.
    ///
    /// Example: `~/.vaultkeep/vaults/personal.vault`
    pub fn vault_path(home: &Path, name: &str) -> PathBuf {
        home.join("vaults").join(format!("{name}.vault"))
    }

    /// Directory holding encrypted locker blobs.
    pub fn locker_dir(home: &Path) -> PathBuf {
        home.join("locker")
    }
}

// ── Tests ────────────────────────────────────────────────────────────
