//! Vault container codec and on-disk layout.
//!
//! A `.vault` file has this layout:
//!
//! ```text
//! [salt: 16 bytes][nonce: 12 bytes][AES-256-GCM ciphertext of the document JSON + 16-byte tag]
//! ```
//!
//! Everything after the salt is a single authenticated token (see
//! `crypto::encryption`). The file is opaque outside this module: a short
//! file, a wrong passphrase and a flipped bit all surface as the same
//! `AuthenticationFailed`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use zeroize::Zeroizing;

use super::document::SecretDocument;
use crate::crypto::kdf::{derive_key, KdfParams, SALT_LEN};
use crate::crypto::{decrypt, encrypt};
use crate::errors::{Result, VaultError};

/// The two parts of a container file.
pub struct Container {
    pub salt: [u8; SALT_LEN],
    pub token: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Document codec
// ---------------------------------------------------------------------------

/// Serialize and seal a document.
///
/// Derives the key from `passphrase` and `salt` (a fresh salt is generated
/// when `salt` is `None`) and returns the salt alongside the token.
pub fn encrypt_document(
    document: &SecretDocument,
    passphrase: &[u8],
    salt: Option<&[u8; SALT_LEN]>,
    params: &KdfParams,
) -> Result<([u8; SALT_LEN], Vec<u8>)> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(document)
            .map_err(|e| VaultError::SerializationError(format!("document: {e}")))?,
    );

    let (key, salt) = derive_key(passphrase, salt, params)?;
    let token = encrypt(&key, &plaintext)?;
    Ok((salt, token))
}

/// Open a token and parse the document inside it.
///
/// Fails closed: either the whole document is returned or an error is.
pub fn decrypt_document(
    token: &[u8],
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<SecretDocument> {
    let (key, _) = derive_key(passphrase, Some(salt), params)?;
    let plaintext = decrypt(&key, token)?;

    // Only reachable with a valid tag, i.e. the right key but a foreign layout.
    serde_json::from_slice(&plaintext)
        .map_err(|e| VaultError::InvalidVaultFormat(format!("document JSON: {e}")))
}

// ---------------------------------------------------------------------------
// Container file I/O
// ---------------------------------------------------------------------------

/// Write `[salt][token]` to `path` atomically.
pub fn write_container(path: &Path, salt: &[u8; SALT_LEN], token: &[u8]) -> Result<()> {
    let mut buf = Vec::with_capacity(SALT_LEN + token.len());
    buf.extend_from_slice(salt);
    buf.extend_from_slice(token);
    write_atomic(path, &buf)
}

/// Read a container file and split off its salt.
pub fn read_container(path: &Path) -> Result<Container> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VaultError::VaultNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if data.len() < SALT_LEN {
        return Err(VaultError::AuthenticationFailed);
    }

    let (salt_bytes, token) = data.split_at(SALT_LEN);
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(salt_bytes);

    Ok(Container {
        salt,
        token: token.to_vec(),
    })
}

/// Write `bytes` to `path` via a temp file in the same directory + rename.
///
/// Readers never observe a half-written file; on failure the temp file is
/// removed and the previous contents of `path` are left as they were.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    let result = (|| -> std::io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
