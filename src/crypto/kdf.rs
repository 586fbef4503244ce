//! Passphrase-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! There is no stored password verifier: a derived key is only ever
//! "checked" by attempting authenticated decryption with it.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 round count.
pub const DEFAULT_ITERATIONS: u32 = 480_000;

/// Lowest round count accepted by `derive_key`.
const MIN_ITERATIONS: u32 = 1_000;

/// PBKDF2 cost parameters.
///
/// The container format does not record these, so a vault must be
/// opened with the same parameters it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of HMAC-SHA256 rounds (default: 480 000).
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// A 32-byte symmetric key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Wrap raw key bytes. The caller's copy is not wiped.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to build a cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derive a key from `passphrase`, generating a fresh salt when `salt` is `None`.
///
/// Returns the key together with the salt that was used, so callers that
/// passed `None` can persist it. The same passphrase + salt + params
/// always yield the same key.
pub fn derive_key(
    passphrase: &[u8],
    salt: Option<&[u8; SALT_LEN]>,
    params: &KdfParams,
) -> Result<(DerivedKey, [u8; SALT_LEN])> {
    if params.iterations < MIN_ITERATIONS {
        return Err(VaultError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {})",
            params.iterations
        )));
    }

    let salt = match salt {
        Some(s) => *s,
        None => generate_salt(),
    };

    let mut key = DerivedKey {
        bytes: [0u8; KEY_LEN],
    };
    pbkdf2_hmac::<Sha256>(passphrase, &salt, params.iterations, &mut key.bytes);

    Ok((key, salt))
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
