//! AES-256-GCM authenticated encryption of opaque tokens.
//!
//! Token layout:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! A fresh random nonce is drawn for every token, so encrypting the same
//! plaintext twice under the same key never yields the same bytes.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use super::kdf::DerivedKey;
use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Seal `plaintext` into a token under `key`.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    token.extend_from_slice(&nonce);
    token.extend_from_slice(&ciphertext);
    Ok(token)
}

/// Open a token produced by `encrypt`.
///
/// Any failure (short input, wrong key, flipped bit) collapses into
/// `AuthenticationFailed`; no partial plaintext is ever returned.
pub fn decrypt(key: &DerivedKey, token: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if token.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::AuthenticationFailed);
    }

    let (nonce_bytes, ciphertext) = token.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::AuthenticationFailed)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| VaultError::AuthenticationFailed)
}
