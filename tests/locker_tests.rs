//! Integration tests for the file locker: blob cipher and record bookkeeping.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use vaultkeep::crypto::KdfParams;
use vaultkeep::errors::{ErrorKind, VaultError};
use vaultkeep::locker::{decrypt_file, encrypt_file, Locker, ProgressResult, CHUNK_SIZE};
use vaultkeep::vault::{FileRecord, Vault};

const FAST: KdfParams = KdfParams { iterations: 1_000 };

/// A progress callback that records every percentage it sees.
fn recorder(seen: &mut Vec<u8>) -> impl FnMut(u8) -> ProgressResult + '_ {
    move |p| {
        seen.push(p);
        Ok(())
    }
}

fn assert_progress_shape(seen: &[u8]) {
    assert!(!seen.is_empty());
    assert!(
        seen.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {seen:?}"
    );
    assert_eq!(seen.last(), Some(&100));
}

fn roundtrip(dir: &Path, content: &[u8]) -> Vec<u8> {
    let src = dir.join("plain.bin");
    let blob = dir.join("blob.enc");
    let out = dir.join("out.bin");
    fs::write(&src, content).unwrap();

    let mut seen = Vec::new();
    let size = encrypt_file(&src, &blob, b"pw", &FAST, recorder(&mut seen)).unwrap();
    assert_eq!(size, content.len() as u64);
    assert_progress_shape(&seen);

    let mut seen = Vec::new();
    decrypt_file(&blob, &out, b"pw", &FAST, recorder(&mut seen)).unwrap();
    assert_progress_shape(&seen);

    fs::read(&out).unwrap()
}

// ---------------------------------------------------------------------------
// Cipher
// ---------------------------------------------------------------------------

#[test]
fn small_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    assert_eq!(roundtrip(dir.path(), b"hello locker"), b"hello locker");
}

#[test]
fn empty_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    assert!(roundtrip(dir.path(), b"").is_empty());
}

#[test]
fn file_larger_than_one_chunk_roundtrip() {
    let dir = TempDir::new().unwrap();
    let content: Vec<u8> = (0..CHUNK_SIZE + 12_345).map(|i| (i % 251) as u8).collect();
    assert_eq!(roundtrip(dir.path(), &content), content);
}

#[test]
fn multi_chunk_progress_reports_intermediate_values() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("big.bin");
    let blob = dir.path().join("big.enc");
    fs::write(&src, vec![7u8; CHUNK_SIZE * 2 + 1]).unwrap();

    let mut seen = Vec::new();
    encrypt_file(&src, &blob, b"pw", &FAST, recorder(&mut seen)).unwrap();
    assert_progress_shape(&seen);
    assert!(seen.iter().any(|&p| p > 0 && p < 100), "{seen:?}");
}

#[test]
fn blob_starts_with_its_own_salt() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("plain.txt");
    let blob = dir.path().join("blob.enc");
    fs::write(&src, b"abc").unwrap();
    encrypt_file(&src, &blob, b"pw", &FAST, |_| Ok(())).unwrap();

    // salt + nonce + ciphertext + tag
    assert_eq!(fs::metadata(&blob).unwrap().len(), 16 + 12 + 3 + 16);
}

#[test]
fn wrong_passphrase_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("plain.txt");
    let blob = dir.path().join("blob.enc");
    let out = dir.path().join("out.txt");
    fs::write(&src, b"top secret").unwrap();
    encrypt_file(&src, &blob, b"right", &FAST, |_| Ok(())).unwrap();

    let mut seen = Vec::new();
    let err = decrypt_file(&blob, &out, b"wrong", &FAST, recorder(&mut seen)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!out.exists());
    assert!(seen.is_empty());
}

#[test]
fn tampered_blob_is_rejected() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("plain.txt");
    let blob = dir.path().join("blob.enc");
    let out = dir.path().join("out.txt");
    fs::write(&src, b"integrity matters").unwrap();
    encrypt_file(&src, &blob, b"pw", &FAST, |_| Ok(())).unwrap();

    let mut bytes = fs::read(&blob).unwrap();
    bytes[30] ^= 0x01;
    fs::write(&blob, &bytes).unwrap();

    assert!(matches!(
        decrypt_file(&blob, &out, b"pw", &FAST, |_| Ok(())),
        Err(VaultError::AuthenticationFailed)
    ));
    assert!(!out.exists());
}

#[test]
fn failed_encrypt_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let blob = dir.path().join("blob.enc");

    // Missing source.
    let result = encrypt_file(&dir.path().join("absent"), &blob, b"pw", &FAST, |_| Ok(()));
    assert!(result.is_err());
    assert!(!blob.exists());

    // Key derivation refused after the source was read.
    let src = dir.path().join("plain.txt");
    fs::write(&src, b"data").unwrap();
    let weak = KdfParams { iterations: 1 };
    assert!(encrypt_file(&src, &blob, b"pw", &weak, |_| Ok(())).is_err());
    assert!(!blob.exists());
}

// ---------------------------------------------------------------------------
// Locker + vault records
// ---------------------------------------------------------------------------

fn setup() -> (TempDir, Vault, Locker) {
    let dir = TempDir::new().unwrap();
    let vault = Vault::create("v", &dir.path().join("v.vault"), "pw", Some(&FAST)).unwrap();
    let locker = Locker::new(dir.path().join("locker"));
    (dir, vault, locker)
}

#[test]
fn store_records_and_persists_file() {
    let (dir, mut vault, locker) = setup();
    let src = dir.path().join("passport.pdf");
    fs::write(&src, b"%PDF-1.7 fake").unwrap();

    let id = locker.store(&mut vault, &src, "Personal", |_| Ok(())).unwrap();

    let record = vault.document().unwrap().get::<FileRecord>(&id).unwrap().clone();
    assert_eq!(record.name, "passport.pdf");
    assert_eq!(record.size, 13);
    assert!(!record.storage_name.contains("passport"));
    assert!(locker.blob_path(&record).exists());

    // The record survived a save/unlock cycle.
    vault.lock();
    vault.unlock("pw").unwrap();
    assert_eq!(vault.document().unwrap().count::<FileRecord>(), 1);

    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();
    let written = locker.extract(&vault, &id, &out_dir, |_| Ok(())).unwrap();
    assert_eq!(written, out_dir.join("passport.pdf"));
    assert_eq!(fs::read(written).unwrap(), b"%PDF-1.7 fake");
}

#[test]
fn store_with_unknown_category_creates_no_blob() {
    let (dir, mut vault, locker) = setup();
    let src = dir.path().join("a.txt");
    fs::write(&src, b"a").unwrap();

    let err = locker.store(&mut vault, &src, "Nope", |_| Ok(())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(vault.document().unwrap().count::<FileRecord>(), 0);
    let blobs = fs::read_dir(locker.dir()).map(|d| d.count()).unwrap_or(0);
    assert_eq!(blobs, 0);
}

#[test]
fn failed_save_rolls_back_blob_and_record() {
    let (dir, mut vault, locker) = setup();
    let src = dir.path().join("a.txt");
    fs::write(&src, b"a").unwrap();

    // A directory in place of the container makes the final rename fail.
    fs::remove_file(vault.path()).unwrap();
    fs::create_dir(vault.path()).unwrap();
    fs::write(vault.path().join("occupied"), b"x").unwrap();

    let err = locker.store(&mut vault, &src, "Personal", |_| Ok(()));
    assert!(err.is_err());
    assert_eq!(vault.document().unwrap().count::<FileRecord>(), 0);
    let blobs = fs::read_dir(locker.dir()).map(|d| d.count()).unwrap_or(0);
    assert_eq!(blobs, 0);
}

#[test]
fn remove_deletes_blob_and_record() {
    let (dir, mut vault, locker) = setup();
    let src = dir.path().join("a.txt");
    fs::write(&src, b"a").unwrap();
    let id = locker.store(&mut vault, &src, "Work", |_| Ok(())).unwrap();
    let blob = locker.blob_path(vault.document().unwrap().get::<FileRecord>(&id).unwrap());

    let removed = locker.remove(&mut vault, &id).unwrap();
    assert_eq!(removed.name, "a.txt");
    assert!(!blob.exists());
    assert!(matches!(
        vault.document().unwrap().get::<FileRecord>(&id),
        Err(VaultError::EntryNotFound { .. })
    ));

    vault.lock();
    vault.unlock("pw").unwrap();
    assert_eq!(vault.document().unwrap().count::<FileRecord>(), 0);
}

#[test]
fn remove_tolerates_missing_blob() {
    let (dir, mut vault, locker) = setup();
    let src = dir.path().join("a.txt");
    fs::write(&src, b"a").unwrap();
    let id = locker.store(&mut vault, &src, "Work", |_| Ok(())).unwrap();
    let blob = locker.blob_path(vault.document().unwrap().get::<FileRecord>(&id).unwrap());
    fs::remove_file(&blob).unwrap();

    locker.remove(&mut vault, &id).unwrap();
    assert_eq!(vault.document().unwrap().count::<FileRecord>(), 0);
}

#[test]
fn purge_removes_every_blob_of_the_vault() {
    let (dir, mut vault, locker) = setup();
    for name in ["a.txt", "b.txt"] {
        let src = dir.path().join(name);
        fs::write(&src, name).unwrap();
        locker.store(&mut vault, &src, "Personal", |_| Ok(())).unwrap();
    }

    assert_eq!(locker.purge(&vault).unwrap(), 2);
    assert_eq!(fs::read_dir(locker.dir()).unwrap().count(), 0);
}

#[test]
fn locked_vault_cannot_store() {
    let (dir, mut vault, locker) = setup();
    let src = dir.path().join("a.txt");
    fs::write(&src, b"a").unwrap();
    vault.lock();

    let err = locker.store(&mut vault, &src, "Personal", |_| Ok(())).unwrap_err();
    assert!(matches!(err, VaultError::VaultLocked));
}
