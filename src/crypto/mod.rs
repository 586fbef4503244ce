//! Cryptographic primitives for VaultKeep.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 passphrase key derivation (`kdf`)
//! - AES-256-GCM token encryption and decryption (`encryption`)

pub mod encryption;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt};
pub use kdf::{derive_key, generate_salt, DerivedKey, KdfParams, SALT_LEN};
