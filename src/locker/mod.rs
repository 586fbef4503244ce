//! File locker: encrypted blobs stored next to the vault, indexed by
//! `FileRecord`s inside the vault document.
//!
//! Blob names are random tokens; the original file name only lives in the
//! (encrypted) record.

pub mod cipher;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{Result, VaultError};
use crate::vault::{FileRecord, Vault};

pub use cipher::{decrypt_file, encrypt_file, ProgressResult, CHUNK_SIZE};

/// A directory of locker blobs shared by the vaults in one home.
#[derive(Debug, Clone)]
pub struct Locker {
    dir: PathBuf,
}

impl Locker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the blob for `record` lives.
    pub fn blob_path(&self, record: &FileRecord) -> PathBuf {
        self.dir.join(&record.storage_name)
    }

    /// Encrypt `source` into the locker and record it in `vault`.
    ///
    /// On any failure after encryption the blob is deleted again, and a
    /// failed `save()` also takes the record back out of the document, so
    /// an error leaves neither behind.
    pub fn store<P>(
        &self,
        vault: &mut Vault,
        source: &Path,
        category: &str,
        progress: P,
    ) -> Result<Uuid>
    where
        P: FnMut(u8) -> ProgressResult,
    {
        if !vault.document()?.has_category(category) {
            return Err(VaultError::UnknownCategory(category.to_string()));
        }
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| VaultError::invalid("file", "path has no file name"))?;

        fs::create_dir_all(&self.dir)?;
        let storage_name = format!("{}.enc", Uuid::new_v4().simple());
        let blob = self.dir.join(&storage_name);

        let kdf = *vault.kdf();
        let size = encrypt_file(
            source,
            &blob,
            vault.passphrase()?.as_bytes(),
            &kdf,
            progress,
        )?;

        let record = FileRecord::new(name, size, storage_name, category);
        let id = match vault.document_mut().and_then(|doc| doc.add(record)) {
            Ok(id) => id,
            Err(e) => {
                let _ = fs::remove_file(&blob);
                return Err(e);
            }
        };
        if let Err(e) = vault.save() {
            if let Ok(doc) = vault.document_mut() {
                let _ = doc.remove::<FileRecord>(&id);
            }
            let _ = fs::remove_file(&blob);
            return Err(e);
        }

        debug!(vault = vault.name(), id = %id, "file stored in locker");
        Ok(id)
    }

    /// Decrypt the file `id` into `dest_dir` under its original name.
    pub fn extract<P>(
        &self,
        vault: &Vault,
        id: &Uuid,
        dest_dir: &Path,
        progress: P,
    ) -> Result<PathBuf>
    where
        P: FnMut(u8) -> ProgressResult,
    {
        let record = vault.document()?.get::<FileRecord>(id)?;
        let dest = dest_dir.join(&record.name);

        decrypt_file(
            &self.blob_path(record),
            &dest,
            vault.passphrase()?.as_bytes(),
            vault.kdf(),
            progress,
        )?;
        Ok(dest)
    }

    /// Delete the blob for `id`, then its record, then persist.
    ///
    /// A blob that is already gone is not an error.
    pub fn remove(&self, vault: &mut Vault, id: &Uuid) -> Result<FileRecord> {
        let blob = self.blob_path(vault.document()?.get::<FileRecord>(id)?);
        match fs::remove_file(&blob) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(blob = %blob.display(), "locker blob already missing");
            }
            Err(e) => return Err(e.into()),
        }

        let record = vault.document_mut()?.remove::<FileRecord>(id)?;
        vault.save()?;
        Ok(record)
    }

    /// Delete every blob owned by `vault`, ahead of deleting the vault.
    ///
    /// Records are left in the document; returns how many blobs were removed.
    pub fn purge(&self, vault: &Vault) -> Result<usize> {
        let mut removed = 0;
        for name in vault.document()?.storage_names() {
            match fs::remove_file(self.dir.join(name)) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(vault = vault.name(), removed, "locker purged");
        Ok(removed)
    }
}
