//! The in-memory secrets document: the sole unit of persistence per vault.
//!
//! All mutation goes through the generic `add` / `edit` / `remove`
//! operations, which enforce the category invariant and keep
//! `created <= modified`. Nothing here touches disk; callers persist the
//! whole document with `Vault::save` after each mutation.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use super::entry::{Entry, FileRecord, NoteEntry, PasswordEntry, TotpEntry};
use crate::errors::{Result, VaultError};

/// Categories every new vault starts with.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Personal", "Work", "Financial", "Social"];

/// Structured secrets held by one vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretDocument {
    /// Ordered, distinct category labels.
    pub(crate) categories: Vec<String>,
    #[serde(default)]
    pub(crate) passwords: BTreeMap<Uuid, PasswordEntry>,
    #[serde(default)]
    pub(crate) twofa: BTreeMap<Uuid, TotpEntry>,
    #[serde(default)]
    pub(crate) notes: BTreeMap<Uuid, NoteEntry>,
    #[serde(default)]
    pub(crate) files: BTreeMap<Uuid, FileRecord>,
}

impl Default for SecretDocument {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| (*c).to_string()).collect(),
            passwords: BTreeMap::new(),
            twofa: BTreeMap::new(),
            notes: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }
}

impl PartialEq for SecretDocument {
    fn eq(&self, other: &Self) -> bool {
        // Compare through the canonical serialization so every field counts.
        serde_json::to_value(self).ok() == serde_json::to_value(other).ok()
    }
}

impl SecretDocument {
    /// An empty document seeded with the default categories.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// Category labels in insertion order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }

    /// Append a new category label.
    pub fn add_category(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(VaultError::invalid("category", "must not be empty"));
        }
        if self.has_category(name) {
            return Err(VaultError::invalid(
                "category",
                format!("'{name}' already exists"),
            ));
        }
        self.categories.push(name.to_string());
        Ok(())
    }

    /// Remove a category that no entry refers to.
    pub fn remove_category(&mut self, name: &str) -> Result<()> {
        let Some(pos) = self.categories.iter().position(|c| c == name) else {
            return Err(VaultError::UnknownCategory(name.to_string()));
        };
        let in_use = self.category_usage(name);
        if in_use > 0 {
            return Err(VaultError::invalid(
                "category",
                format!("'{name}' is still used by {in_use} entries"),
            ));
        }
        self.categories.remove(pos);
        Ok(())
    }

    /// Number of entries of any kind filed under `name`.
    pub fn category_usage(&self, name: &str) -> usize {
        self.count_in_category::<PasswordEntry>(name)
            + self.count_in_category::<TotpEntry>(name)
            + self.count_in_category::<NoteEntry>(name)
            + self.count_in_category::<FileRecord>(name)
    }

    fn count_in_category<E: Entry>(&self, name: &str) -> usize {
        E::collection(self)
            .values()
            .filter(|e| e.category() == name)
            .count()
    }

    fn check_category(&self, name: &str) -> Result<()> {
        if self.has_category(name) {
            Ok(())
        } else {
            Err(VaultError::UnknownCategory(name.to_string()))
        }
    }

    // ------------------------------------------------------------------
    // Generic entry operations
    // ------------------------------------------------------------------

    /// Insert a new entry under a freshly generated id.
    ///
    /// Both timestamps are set to now, whatever the caller put in them.
    pub fn add<E: Entry>(&mut self, mut entry: E) -> Result<Uuid> {
        entry.validate()?;
        self.check_category(entry.category())?;

        let now = Utc::now();
        entry.set_timestamps(now, now);

        let id = Uuid::new_v4();
        E::collection_mut(self).insert(id, entry);
        Ok(id)
    }

    /// Apply `change` to an existing entry.
    ///
    /// The change is made on a copy and only committed when the result
    /// still validates, so a rejected edit leaves the document untouched.
    /// `created` is preserved and `modified` never moves before it.
    pub fn edit<E, F>(&mut self, id: &Uuid, change: F) -> Result<()>
    where
        E: Entry,
        F: FnOnce(&mut E),
    {
        let current = self.get::<E>(id)?;
        let created = current.created();
        let mut updated = current.clone();
        change(&mut updated);

        updated.validate()?;
        self.check_category(updated.category())?;
        updated.set_timestamps(created, Utc::now().max(created));

        if let Some(slot) = E::collection_mut(self).get_mut(id) {
            let mut old = std::mem::replace(slot, updated);
            old.zeroize();
        }
        Ok(())
    }

    /// Remove and return an entry.
    ///
    /// For `FileRecord`s go through `Locker::remove`, which also deletes
    /// the encrypted blob.
    pub fn remove<E: Entry>(&mut self, id: &Uuid) -> Result<E> {
        E::collection_mut(self)
            .remove(id)
            .ok_or_else(|| not_found::<E>(id))
    }

    pub fn get<E: Entry>(&self, id: &Uuid) -> Result<&E> {
        E::collection(self).get(id).ok_or_else(|| not_found::<E>(id))
    }

    /// Entries of one kind sorted by label, optionally filtered by category.
    pub fn list<E: Entry>(&self, category: Option<&str>) -> Vec<(Uuid, &E)> {
        let mut list: Vec<(Uuid, &E)> = E::collection(self)
            .iter()
            .filter(|(_, e)| category.map_or(true, |c| e.category() == c))
            .map(|(id, e)| (*id, e))
            .collect();
        list.sort_by(|a, b| a.1.label().to_lowercase().cmp(&b.1.label().to_lowercase()));
        list
    }

    pub fn count<E: Entry>(&self) -> usize {
        E::collection(self).len()
    }

    /// Resolve a full id or a unique prefix of one.
    ///
    /// Prefixes are compared with hyphens removed, so both the hyphenated
    /// and the simple form of an id match.
    pub fn resolve_id<E: Entry>(&self, needle: &str) -> Result<Uuid> {
        if let Ok(id) = Uuid::parse_str(needle) {
            if E::collection(self).contains_key(&id) {
                return Ok(id);
            }
        }

        let needle = needle.to_lowercase();
        let digits: String = needle.chars().filter(|c| *c != '-').collect();
        let hits: Vec<Uuid> = E::collection(self)
            .keys()
            .filter(|id| !digits.is_empty() && id.simple().to_string().starts_with(&digits))
            .copied()
            .collect();

        match hits.as_slice() {
            [id] => Ok(*id),
            [] => Err(VaultError::EntryNotFound {
                kind: E::KIND,
                id: needle,
            }),
            _ => Err(VaultError::AmbiguousId(needle)),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Passwords whose name, username or url contains `query`.
    pub fn search_passwords(&self, query: &str) -> Vec<(Uuid, &PasswordEntry)> {
        self.list::<PasswordEntry>(None)
            .into_iter()
            .filter(|(_, e)| e.matches(query))
            .collect()
    }

    /// Storage names of every file record, for locker housekeeping.
    pub fn storage_names(&self) -> impl Iterator<Item = &str> {
        self.files.values().map(|f| f.storage_name.as_str())
    }

    // ------------------------------------------------------------------
    // Secret hygiene
    // ------------------------------------------------------------------

    /// Overwrite every secret-bearing string before the document is dropped.
    pub fn wipe(&mut self) {
        self.passwords.values_mut().for_each(Zeroize::zeroize);
        self.twofa.values_mut().for_each(Zeroize::zeroize);
        self.notes.values_mut().for_each(Zeroize::zeroize);
        self.files.values_mut().for_each(Zeroize::zeroize);
        self.passwords.clear();
        self.twofa.clear();
        self.notes.clear();
        self.files.clear();
    }
}

fn not_found<E: Entry>(id: &Uuid) -> VaultError {
    VaultError::EntryNotFound {
        kind: E::KIND,
        id: id.to_string(),
    }
}
