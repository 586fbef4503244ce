//! An interactive session over one vault.
//!
//! The session owns the clipboard timer and enforces auto-lock: once the
//! vault has been idle longer than the configured window, the next access
//! locks it and reports `VaultLocked`.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::clipboard::ClipboardTimer;
use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::Vault;

pub struct Session {
    vault: Vault,
    clipboard: ClipboardTimer,
    clipboard_clear: Duration,
    auto_lock: Option<Duration>,
    last_activity: Instant,
}

impl Session {
    pub fn new(vault: Vault, clipboard: ClipboardTimer, settings: &Settings) -> Self {
        Self {
            vault,
            clipboard,
            clipboard_clear: Duration::from_secs(settings.clipboard_clear_seconds),
            auto_lock: (settings.auto_lock_seconds > 0)
                .then(|| Duration::from_secs(settings.auto_lock_seconds)),
            last_activity: Instant::now(),
        }
    }

    /// Override the idle window (`None` disables auto-lock).
    pub fn with_auto_lock(mut self, auto_lock: Option<Duration>) -> Self {
        self.auto_lock = auto_lock;
        self
    }

    pub fn unlock(&mut self, passphrase: &str) -> Result<()> {
        self.vault.unlock(passphrase)?;
        self.touch();
        Ok(())
    }

    pub fn lock(&mut self) {
        self.vault.lock();
    }

    pub fn is_unlocked(&self) -> bool {
        self.vault.is_unlocked()
    }

    /// Lock now if the idle window has passed. Returns whether it locked.
    pub fn enforce_auto_lock(&mut self) -> bool {
        let expired = self
            .auto_lock
            .is_some_and(|window| self.last_activity.elapsed() > window);
        if expired && self.vault.is_unlocked() {
            debug!(vault = self.vault.name(), "auto-lock after idle timeout");
            self.vault.lock();
            return true;
        }
        false
    }

    /// The vault, provided it is still unlocked. Counts as activity.
    pub fn vault(&mut self) -> Result<&mut Vault> {
        self.enforce_auto_lock();
        if !self.vault.is_unlocked() {
            return Err(VaultError::VaultLocked);
        }
        self.touch();
        Ok(&mut self.vault)
    }

    /// Copy a secret and schedule the clipboard clear.
    pub fn copy_secret(&mut self, text: &str) -> Result<()> {
        self.vault()?;
        self.clipboard.copy(text, self.clipboard_clear)
    }

    pub fn clipboard(&self) -> &ClipboardTimer {
        &self.clipboard
    }

    pub fn clipboard_clear(&self) -> Duration {
        self.clipboard_clear
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}
