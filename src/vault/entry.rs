//! Entry records stored inside a `SecretDocument`.
//!
//! Every record carries a `category` and `created`/`modified` timestamps.
//! The `Entry` trait lets the document manage all four kinds through one
//! set of generic add/edit/remove operations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use super::document::SecretDocument;
use crate::errors::{Result, VaultError};
use crate::totp::{self, TotpAlgorithm};

/// Common behaviour of every record kind held in a `SecretDocument`.
pub trait Entry: Clone + Zeroize {
    /// Human-readable kind, used in error messages and the audit log.
    const KIND: &'static str;

    fn category(&self) -> &str;
    fn created(&self) -> DateTime<Utc>;
    fn modified(&self) -> DateTime<Utc>;
    fn set_timestamps(&mut self, created: DateTime<Utc>, modified: DateTime<Utc>);

    /// Label shown in listings and used for sorting.
    fn label(&self) -> &str;

    /// Check required fields. Category membership is checked by the document.
    fn validate(&self) -> Result<()>;

    fn collection(doc: &SecretDocument) -> &BTreeMap<Uuid, Self>;
    fn collection_mut(doc: &mut SecretDocument) -> &mut BTreeMap<Uuid, Self>;
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VaultError::invalid(field, "must not be empty"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PasswordEntry
// ---------------------------------------------------------------------------

/// A saved login.
#[derive(Debug, Clone, Serialize, Deserialize, Zeroize)]
pub struct PasswordEntry {
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
    pub category: String,
    #[zeroize(skip)]
    pub created: DateTime<Utc>,
    #[zeroize(skip)]
    pub modified: DateTime<Utc>,
}

impl PasswordEntry {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            username: username.into(),
            password: password.into(),
            url: String::new(),
            notes: String::new(),
            category: category.into(),
            created: now,
            modified: now,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Case-insensitive substring match over name, username and url.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        [&self.name, &self.username, &self.url]
            .iter()
            .any(|field| field.to_lowercase().contains(&q))
    }
}

impl Entry for PasswordEntry {
    const KIND: &'static str = "password";

    fn category(&self) -> &str {
        &self.category
    }
    fn created(&self) -> DateTime<Utc> {
        self.created
    }
    fn modified(&self) -> DateTime<Utc> {
        self.modified
    }
    fn set_timestamps(&mut self, created: DateTime<Utc>, modified: DateTime<Utc>) {
        self.created = created;
        self.modified = modified;
    }
    fn label(&self) -> &str {
        &self.name
    }
    fn validate(&self) -> Result<()> {
        require("name", &self.name)
    }
    fn collection(doc: &SecretDocument) -> &BTreeMap<Uuid, Self> {
        &doc.passwords
    }
    fn collection_mut(doc: &mut SecretDocument) -> &mut BTreeMap<Uuid, Self> {
        &mut doc.passwords
    }
}

// ---------------------------------------------------------------------------
// TotpEntry
// ---------------------------------------------------------------------------

/// A 2FA seed plus the parameters needed to derive codes from it.
#[derive(Debug, Clone, Serialize, Deserialize, Zeroize)]
pub struct TotpEntry {
    pub name: String,
    /// Base32-encoded shared secret.
    pub secret: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub account: String,
    #[serde(rename = "algo", default)]
    #[zeroize(skip)]
    pub algorithm: TotpAlgorithm,
    #[serde(default = "totp::default_digits")]
    pub digits: u32,
    #[serde(default = "totp::default_period")]
    pub period: u64,
    pub category: String,
    #[zeroize(skip)]
    pub created: DateTime<Utc>,
    #[zeroize(skip)]
    pub modified: DateTime<Utc>,
}

impl TotpEntry {
    /// Build an entry with the usual defaults (SHA1, 6 digits, 30 s).
    pub fn new(
        name: impl Into<String>,
        secret: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            secret: secret.into(),
            issuer: String::new(),
            account: String::new(),
            algorithm: TotpAlgorithm::default(),
            digits: totp::default_digits(),
            period: totp::default_period(),
            category: category.into(),
            created: now,
            modified: now,
        }
    }

    /// Current code for this entry.
    pub fn code(&self) -> Result<totp::TotpCode> {
        totp::compute(&self.secret, self.algorithm, self.digits, self.period)
    }

    /// `otpauth://` URI suitable for re-provisioning another authenticator.
    pub fn provisioning_uri(&self) -> String {
        totp::build_provisioning_uri(self)
    }
}

impl Entry for TotpEntry {
    const KIND: &'static str = "2fa";

    fn category(&self) -> &str {
        &self.category
    }
    fn created(&self) -> DateTime<Utc> {
        self.created
    }
    fn modified(&self) -> DateTime<Utc> {
        self.modified
    }
    fn set_timestamps(&mut self, created: DateTime<Utc>, modified: DateTime<Utc>) {
        self.created = created;
        self.modified = modified;
    }
    fn label(&self) -> &str {
        &self.name
    }
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        totp::validate_parameters(&self.secret, self.digits, self.period)
    }
    fn collection(doc: &SecretDocument) -> &BTreeMap<Uuid, Self> {
        &doc.twofa
    }
    fn collection_mut(doc: &mut SecretDocument) -> &mut BTreeMap<Uuid, Self> {
        &mut doc.twofa
    }
}

// ---------------------------------------------------------------------------
// NoteEntry
// ---------------------------------------------------------------------------

/// A free-text secure note.
#[derive(Debug, Clone, Serialize, Deserialize, Zeroize)]
pub struct NoteEntry {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub category: String,
    #[zeroize(skip)]
    pub created: DateTime<Utc>,
    #[zeroize(skip)]
    pub modified: DateTime<Utc>,
}

impl NoteEntry {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            content: content.into(),
            category: category.into(),
            created: now,
            modified: now,
        }
    }

    /// First 40 characters of the content on a single line.
    pub fn preview(&self) -> String {
        let flat = self.content.replace('\n', " ");
        let mut preview: String = flat.chars().take(40).collect();
        if flat.chars().count() > 40 {
            preview.push_str("...");
        }
        preview
    }
}

impl Entry for NoteEntry {
    const KIND: &'static str = "note";

    fn category(&self) -> &str {
        &self.category
    }
    fn created(&self) -> DateTime<Utc> {
        self.created
    }
    fn modified(&self) -> DateTime<Utc> {
        self.modified
    }
    fn set_timestamps(&mut self, created: DateTime<Utc>, modified: DateTime<Utc>) {
        self.created = created;
        self.modified = modified;
    }
    fn label(&self) -> &str {
        &self.title
    }
    fn validate(&self) -> Result<()> {
        require("title", &self.title)
    }
    fn collection(doc: &SecretDocument) -> &BTreeMap<Uuid, Self> {
        &doc.notes
    }
    fn collection_mut(doc: &mut SecretDocument) -> &mut BTreeMap<Uuid, Self> {
        &mut doc.notes
    }
}

// ---------------------------------------------------------------------------
// FileRecord
// ---------------------------------------------------------------------------

/// Metadata for one encrypted blob in the locker.
///
/// The record and its blob live and die together: `Locker::store` writes
/// the blob before inserting the record, and `Locker::remove` deletes the
/// blob before dropping the record.
#[derive(Debug, Clone, Serialize, Deserialize, Zeroize)]
pub struct FileRecord {
    /// Original display name of the file.
    pub name: String,
    /// Plaintext size in bytes.
    #[zeroize(skip)]
    pub size: u64,
    /// Generated blob file name inside the locker directory.
    #[serde(rename = "encrypted_name")]
    pub storage_name: String,
    pub category: String,
    #[zeroize(skip)]
    pub created: DateTime<Utc>,
    #[zeroize(skip)]
    pub modified: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        storage_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            size,
            storage_name: storage_name.into(),
            category: category.into(),
            created: now,
            modified: now,
        }
    }
}

impl Entry for FileRecord {
    const KIND: &'static str = "file";

    fn category(&self) -> &str {
        &self.category
    }
    fn created(&self) -> DateTime<Utc> {
        self.created
    }
    fn modified(&self) -> DateTime<Utc> {
        self.modified
    }
    fn set_timestamps(&mut self, created: DateTime<Utc>, modified: DateTime<Utc>) {
        self.created = created;
        self.modified = modified;
    }
    fn label(&self) -> &str {
        &self.name
    }
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("storage name", &self.storage_name)?;
        if self.storage_name.contains(['/', '\\']) {
            return Err(VaultError::invalid(
                "storage name",
                "must be a bare file name",
            ));
        }
        Ok(())
    }
    fn collection(doc: &SecretDocument) -> &BTreeMap<Uuid, Self> {
        &doc.files
    }
    fn collection_mut(doc: &mut SecretDocument) -> &mut BTreeMap<Uuid, Self> {
        &mut doc.files
    }
}
