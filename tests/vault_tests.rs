//! Integration tests for the vault lifecycle and container codec.

use std::fs;

use tempfile::TempDir;
use vaultkeep::crypto::KdfParams;
use vaultkeep::errors::{ErrorKind, VaultError};
use vaultkeep::vault::{
    decrypt_document, encrypt_document, NoteEntry, PasswordEntry, SecretDocument, TotpEntry,
    Vault, VaultStatus,
};

/// Cheap derivation so the suite stays fast.
const FAST: KdfParams = KdfParams { iterations: 1_000 };

/// Helper: create a temporary vault file path inside a fresh temp dir.
fn vault_path() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("test.vault");
    (dir, path)
}

fn sample_document() -> SecretDocument {
    let mut doc = SecretDocument::new();
    doc.add(
        PasswordEntry::new("GitHub", "octocat", "hunter2", "Work")
            .with_url("https://github.com")
            .with_notes("2FA enabled"),
    )
    .unwrap();
    doc.add(TotpEntry::new("Example", "JBSWY3DPEHPK3PXP", "Personal"))
        .unwrap();
    doc.add(NoteEntry::new("Wifi", "ssid: home\npsk: correct horse", "Personal"))
        .unwrap();
    doc
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

#[test]
fn document_roundtrip_through_codec() {
    let doc = sample_document();
    let (salt, token) = encrypt_document(&doc, b"passphrase", None, &FAST).unwrap();
    let back = decrypt_document(&token, b"passphrase", &salt, &FAST).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn codec_reuses_a_given_salt() {
    let doc = SecretDocument::new();
    let (salt, _) = encrypt_document(&doc, b"pw", None, &FAST).unwrap();
    let (again, token) = encrypt_document(&doc, b"pw", Some(&salt), &FAST).unwrap();
    assert_eq!(salt, again);
    assert!(decrypt_document(&token, b"pw", &salt, &FAST).is_ok());
}

#[test]
fn wrong_passphrase_is_authentication_failure() {
    let (salt, token) = encrypt_document(&sample_document(), b"right", None, &FAST).unwrap();
    let err = decrypt_document(&token, b"wrong", &salt, &FAST).unwrap_err();
    assert!(matches!(err, VaultError::AuthenticationFailed));
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[test]
fn every_single_bit_flip_is_rejected() {
    let (salt, token) = encrypt_document(&SecretDocument::new(), b"pw", None, &FAST).unwrap();

    // Nonce, ciphertext and tag are all covered.
    for byte in [0, 5, 12, token.len() / 2, token.len() - 1] {
        let mut tampered = token.clone();
        tampered[byte] ^= 0x01;
        assert!(
            matches!(
                decrypt_document(&tampered, b"pw", &salt, &FAST),
                Err(VaultError::AuthenticationFailed)
            ),
            "flip at byte {byte} was accepted"
        );
    }
}

#[test]
fn wrong_salt_is_authentication_failure() {
    let (mut salt, token) = encrypt_document(&SecretDocument::new(), b"pw", None, &FAST).unwrap();
    salt[0] ^= 0xff;
    assert!(matches!(
        decrypt_document(&token, b"pw", &salt, &FAST),
        Err(VaultError::AuthenticationFailed)
    ));
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn create_unlock_roundtrip() {
    let (_dir, path) = vault_path();

    let mut vault = Vault::create("test", &path, "correct horse", Some(&FAST)).unwrap();
    assert_eq!(vault.status(), VaultStatus::Unlocked);
    let id = vault
        .document_mut()
        .unwrap()
        .add(PasswordEntry::new("Bank", "me", "s3cret", "Financial"))
        .unwrap();
    vault.save().unwrap();

    let mut reopened = Vault::open("test", &path, Some(&FAST));
    assert_eq!(reopened.status(), VaultStatus::Locked);
    reopened.unlock("correct horse").unwrap();

    let doc = reopened.document().unwrap();
    assert_eq!(doc.get::<PasswordEntry>(&id).unwrap().password, "s3cret");
    assert_eq!(doc.categories(), vault.document().unwrap().categories());
}

#[test]
fn new_vault_has_default_categories_on_disk() {
    let (_dir, path) = vault_path();
    Vault::create("test", &path, "pw", Some(&FAST)).unwrap();

    let mut vault = Vault::open("test", &path, Some(&FAST));
    vault.unlock("pw").unwrap();
    assert_eq!(
        vault.document().unwrap().categories(),
        ["Personal", "Work", "Financial", "Social"]
    );
}

#[test]
fn create_refuses_existing_file() {
    let (_dir, path) = vault_path();
    Vault::create("test", &path, "pw", Some(&FAST)).unwrap();
    assert!(matches!(
        Vault::create("test", &path, "other", Some(&FAST)),
        Err(VaultError::VaultAlreadyExists(_))
    ));
}

#[test]
fn unlock_with_wrong_passphrase_stays_locked_and_can_retry() {
    let (_dir, path) = vault_path();
    Vault::create("test", &path, "right", Some(&FAST)).unwrap();

    let mut vault = Vault::open("test", &path, Some(&FAST));
    for _ in 0..3 {
        let err = vault.unlock("wrong").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(vault.status(), VaultStatus::Locked);
    }
    vault.unlock("right").unwrap();
    assert!(vault.is_unlocked());
}

#[test]
fn missing_file_is_io_failure_not_auth() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::open("ghost", &path, Some(&FAST));
    assert_eq!(vault.status(), VaultStatus::Uninitialized);

    let err = vault.unlock("pw").unwrap_err();
    assert!(matches!(err, VaultError::VaultNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn truncated_file_is_authentication_failure() {
    let (_dir, path) = vault_path();
    Vault::create("test", &path, "pw", Some(&FAST)).unwrap();

    let bytes = fs::read(&path).unwrap();
    for len in [0, 8, 16, 20, bytes.len() - 1] {
        fs::write(&path, &bytes[..len]).unwrap();
        let mut vault = Vault::open("test", &path, Some(&FAST));
        assert!(
            matches!(vault.unlock("pw"), Err(VaultError::AuthenticationFailed)),
            "truncation to {len} bytes was not rejected"
        );
    }
}

#[test]
fn tampered_file_is_authentication_failure() {
    let (_dir, path) = vault_path();
    Vault::create("test", &path, "pw", Some(&FAST)).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;
    fs::write(&path, &bytes).unwrap();

    let mut vault = Vault::open("test", &path, Some(&FAST));
    assert!(matches!(
        vault.unlock("pw"),
        Err(VaultError::AuthenticationFailed)
    ));
    assert!(!vault.is_unlocked());
}

#[test]
fn lock_discards_document_and_blocks_access() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::create("test", &path, "pw", Some(&FAST)).unwrap();
    vault.lock();

    assert_eq!(vault.status(), VaultStatus::Locked);
    assert!(matches!(vault.document(), Err(VaultError::VaultLocked)));
    assert!(matches!(vault.document_mut(), Err(VaultError::VaultLocked)));
    let err = vault.save().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn unsaved_mutation_is_not_durable() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::create("test", &path, "pw", Some(&FAST)).unwrap();
    vault
        .document_mut()
        .unwrap()
        .add(NoteEntry::new("draft", "not saved", "Personal"))
        .unwrap();
    vault.lock();

    vault.unlock("pw").unwrap();
    assert_eq!(vault.document().unwrap().count::<NoteEntry>(), 0);
}

#[test]
fn save_keeps_the_salt() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::create("test", &path, "pw", Some(&FAST)).unwrap();
    let before = fs::read(&path).unwrap();

    vault
        .document_mut()
        .unwrap()
        .add(NoteEntry::new("n", "c", "Personal"))
        .unwrap();
    vault.save().unwrap();
    let after = fs::read(&path).unwrap();

    assert_eq!(&before[..16], &after[..16]);
    assert_ne!(before, after);
}

#[test]
fn unknown_category_is_validation_failure() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::create("test", &path, "pw", Some(&FAST)).unwrap();
    let err = vault
        .document_mut()
        .unwrap()
        .add(PasswordEntry::new("x", "u", "p", "Travel"))
        .unwrap_err();
    assert!(matches!(err, VaultError::UnknownCategory(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ---------------------------------------------------------------------------
// Backup and restore
// ---------------------------------------------------------------------------

#[test]
fn backup_into_directory_uses_timestamped_name() {
    let (dir, path) = vault_path();
    let vault = Vault::create("personal", &path, "pw", Some(&FAST)).unwrap();

    let backups = dir.path().join("backups");
    fs::create_dir(&backups).unwrap();
    let written = vault.backup_to(&backups).unwrap();

    let name = written.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("personal_backup_"), "{name}");
    assert!(name.ends_with(".vault"), "{name}");
    assert_eq!(fs::read(&written).unwrap(), fs::read(&path).unwrap());
}

#[test]
fn restore_brings_back_old_state_and_locks() {
    let (dir, path) = vault_path();
    let mut vault = Vault::create("test", &path, "pw", Some(&FAST)).unwrap();
    let backup = vault.backup_to(&dir.path().join("snapshot.vault")).unwrap();

    vault
        .document_mut()
        .unwrap()
        .add(NoteEntry::new("later", "added after backup", "Personal"))
        .unwrap();
    vault.save().unwrap();

    vault.restore_from(&backup).unwrap();
    assert_eq!(vault.status(), VaultStatus::Locked);

    vault.unlock("pw").unwrap();
    assert_eq!(vault.document().unwrap().count::<NoteEntry>(), 0);
}

#[test]
fn restore_rejects_missing_or_tiny_backup() {
    let (dir, path) = vault_path();
    let mut vault = Vault::create("test", &path, "pw", Some(&FAST)).unwrap();

    assert!(matches!(
        vault.restore_from(&dir.path().join("nope.vault")),
        Err(VaultError::VaultNotFound(_))
    ));

    let tiny = dir.path().join("tiny.vault");
    fs::write(&tiny, b"abc").unwrap();
    assert!(matches!(
        vault.restore_from(&tiny),
        Err(VaultError::AuthenticationFailed)
    ));
    // A rejected restore leaves the vault as it was.
    assert!(vault.is_unlocked());
}
