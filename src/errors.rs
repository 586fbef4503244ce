use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in VaultKeep.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Wrong passphrase, truncated file, or a failed authentication tag.
    /// These cases are reported identically on purpose.
    #[error("Authentication failed — wrong passphrase or corrupted data")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("Vault is locked")]
    VaultLocked,

    // --- Document errors ---
    #[error("Category '{0}' does not exist in this vault")]
    UnknownCategory(String),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{kind} entry '{id}' not found")]
    EntryNotFound { kind: &'static str, id: String },

    #[error("'{0}' matches more than one entry — use a longer id")]
    AmbiguousId(String),

    // --- Registry errors ---
    #[error("Vault '{0}' is not registered")]
    UnknownVault(String),

    #[error("Vault '{0}' is already registered")]
    VaultAlreadyRegistered(String),

    #[error("No active vault — create one with `vaultkeep vault create <name>`")]
    NoActiveVault,

    // --- TOTP errors ---
    #[error("TOTP error: {0}")]
    Totp(String),

    // --- Clipboard errors ---
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Coarse classification callers use to decide between retry and abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong passphrase or corrupted/tampered ciphertext.
    Authentication,
    /// Missing file, permission denied, disk full.
    Io,
    /// A field or category failed validation.
    Validation,
    /// An unknown entry id or vault name.
    NotFound,
    /// The operation needs an unlocked vault.
    State,
    Other,
}

impl VaultError {
    /// Map this error onto the retry/abort taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationFailed => ErrorKind::Authentication,
            Self::Io(_) | Self::VaultNotFound(_) | Self::VaultAlreadyExists(_) => ErrorKind::Io,
            Self::UnknownCategory(_)
            | Self::InvalidField { .. }
            | Self::AmbiguousId(_)
            | Self::VaultAlreadyRegistered(_)
            | Self::Totp(_) => ErrorKind::Validation,
            Self::EntryNotFound { .. } | Self::UnknownVault(_) | Self::NoActiveVault => {
                ErrorKind::NotFound
            }
            Self::VaultLocked => ErrorKind::State,
            _ => ErrorKind::Other,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for VaultKeep results.
pub type Result<T> = std::result::Result<T, VaultError>;
