//! Configuration: the home directory layout and `config.toml`.

pub mod settings;

pub use settings::Settings;

use std::path::PathBuf;

use crate::errors::{Result, VaultError};

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "VAULTKEEP_HOME";

/// Resolve the VaultKeep home: an explicit path wins, then `$HOME/.vaultkeep`.
///
/// The CLI fills `explicit` from `--home` or `VAULTKEEP_HOME`.
pub fn resolve_home(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let base = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .ok_or_else(|| {
            VaultError::ConfigError(format!(
                "cannot locate a home directory; pass --home or set {HOME_ENV}"
            ))
        })?;
    Ok(base.join(".vaultkeep"))
}
