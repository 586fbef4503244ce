//! Whole-file encryption for the file locker.
//!
//! A locker blob has the same shape as a vault container but its own salt:
//!
//! ```text
//! [salt: 16 bytes][nonce: 12 bytes][AES-256-GCM ciphertext of the raw file + 16-byte tag]
//! ```
//!
//! The source is read in 8 MiB chunks so progress can be reported, but the
//! whole plaintext is buffered before it is sealed. Files much larger than
//! available memory are not supported.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::kdf::{derive_key, KdfParams, SALT_LEN};
use crate::crypto::{decrypt, encrypt};
use crate::errors::{Result, VaultError};
use crate::vault::format::write_atomic;

/// Read size used while buffering a source file.
pub const CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// What a progress callback may return. Errors are logged and ignored.
pub type ProgressResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

fn report<P>(progress: &mut P, percent: u8)
where
    P: FnMut(u8) -> ProgressResult,
{
    if let Err(e) = progress(percent) {
        warn!(percent, error = %e, "progress callback failed");
    }
}

/// Encrypt `source` into a new blob at `dest` and return the plaintext size.
///
/// `progress` is called after every chunk with a non-decreasing percentage
/// and once more with 100 on success. `dest` must not exist yet; if anything
/// fails after it was created it is removed again.
pub fn encrypt_file<P>(
    source: &Path,
    dest: &Path,
    passphrase: &[u8],
    params: &KdfParams,
    mut progress: P,
) -> Result<u64>
where
    P: FnMut(u8) -> ProgressResult,
{
    let mut input = File::open(source)?;
    let total = input.metadata()?.len();

    let mut plaintext = Zeroizing::new(Vec::with_capacity(total as usize));
    let mut chunk = Zeroizing::new(vec![0u8; CHUNK_SIZE]);
    let mut read_so_far: u64 = 0;
    loop {
        let n = input.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        plaintext.extend_from_slice(&chunk[..n]);
        read_so_far += n as u64;

        let percent = if total == 0 {
            100
        } else {
            (read_so_far.saturating_mul(100) / total).min(100) as u8
        };
        report(&mut progress, percent);
    }

    let (key, salt) = derive_key(passphrase, None, params)?;
    let token = encrypt(&key, &plaintext)?;

    write_new_blob(dest, &salt, &token)?;
    report(&mut progress, 100);

    debug!(
        source = %source.display(),
        dest = %dest.display(),
        bytes = read_so_far,
        "file encrypted"
    );
    Ok(read_so_far)
}

fn write_new_blob(dest: &Path, salt: &[u8; SALT_LEN], token: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(dest)?;

    let written = file
        .write_all(salt)
        .and_then(|_| file.write_all(token))
        .and_then(|_| file.sync_all());

    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(dest);
        return Err(e.into());
    }
    Ok(())
}

/// Decrypt the blob at `source` into `dest` and return the plaintext size.
///
/// Nothing is written unless the blob authenticates. `dest` is replaced
/// atomically if it already exists.
pub fn decrypt_file<P>(
    source: &Path,
    dest: &Path,
    passphrase: &[u8],
    params: &KdfParams,
    mut progress: P,
) -> Result<u64>
where
    P: FnMut(u8) -> ProgressResult,
{
    let data = fs::read(source)?;
    if data.len() < SALT_LEN {
        return Err(VaultError::AuthenticationFailed);
    }

    let (salt_bytes, token) = data.split_at(SALT_LEN);
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(salt_bytes);

    let (key, _) = derive_key(passphrase, Some(&salt), params)?;
    let plaintext = decrypt(&key, token)?;

    write_atomic(dest, &plaintext)?;
    report(&mut progress, 100);

    debug!(
        source = %source.display(),
        dest = %dest.display(),
        bytes = plaintext.len(),
        "file decrypted"
    );
    Ok(plaintext.len() as u64)
}
