//! Vault module: the secrets document and its encrypted container.
//!
//! This module provides:
//! - Entry record types and the `Entry` trait (`entry`)
//! - The in-memory `SecretDocument` with its invariants (`document`)
//! - The container codec and atomic file writes (`format`)
//! - The `Vault` lifecycle handle: create / unlock / save / lock (`store`)

pub mod document;
pub mod entry;
pub mod format;
pub mod store;

// Re-export the most commonly used items.
pub use document::{SecretDocument, DEFAULT_CATEGORIES};
pub use entry::{Entry, FileRecord, NoteEntry, PasswordEntry, TotpEntry};
pub use format::{decrypt_document, encrypt_document};
pub use store::{Vault, VaultStatus};
