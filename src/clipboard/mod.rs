//! Clipboard copy with a delayed, self-cancelling clear.
//!
//! A `ClipboardTimer` is owned by whoever owns the session and passed by
//! reference; there is no process-wide instance. At most one clear is
//! pending at a time: re-arming bumps a generation counter under the lock,
//! and a timer thread only clears if its generation is still current when
//! it wakes.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::errors::{Result, VaultError};

/// Something that can hold text for the user to paste.
pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;

    /// Overwrite the clipboard with an empty value.
    fn clear(&self) -> Result<()>;
}

/// The desktop clipboard, via `arboard`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    fn open() -> Result<arboard::Clipboard> {
        arboard::Clipboard::new().map_err(|e| VaultError::Clipboard(e.to_string()))
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        Self::open()?
            .set_text(text.to_owned())
            .map_err(|e| VaultError::Clipboard(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        Self::open()?
            .set_text(String::new())
            .map_err(|e| VaultError::Clipboard(e.to_string()))
    }
}

struct TimerState {
    generation: u64,
    deadline: Option<Instant>,
}

struct Shared {
    state: Mutex<TimerState>,
    wake: Condvar,
    sink: Box<dyn ClipboardSink>,
    on_cleared: Box<dyn Fn() + Send + Sync>,
}

/// Schedules a single pending clipboard clear.
#[derive(Clone)]
pub struct ClipboardTimer {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ClipboardTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardTimer")
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl ClipboardTimer {
    /// A timer over `sink` that calls `on_cleared` after every clear it fires.
    pub fn new<S, F>(sink: S, on_cleared: F) -> Self
    where
        S: ClipboardSink + 'static,
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TimerState {
                    generation: 0,
                    deadline: None,
                }),
                wake: Condvar::new(),
                sink: Box::new(sink),
                on_cleared: Box::new(on_cleared),
            }),
        }
    }

    /// Put `text` on the clipboard and arm a clear `after` from now.
    ///
    /// Nothing is copied when the delay cannot be scheduled.
    pub fn copy(&self, text: &str, after: Duration) -> Result<()> {
        deadline_after(after)?;
        self.shared.sink.set_text(text)?;
        self.arm(after)
    }

    /// Schedule a clear `after` from now, replacing any pending one.
    pub fn arm(&self, after: Duration) -> Result<()> {
        let deadline = deadline_after(after)?;
        let generation = {
            let mut state = self.shared.state.lock();
            state.generation += 1;
            state.deadline = Some(deadline);
            state.generation
        };
        // Wake a superseded waiter so its thread exits early.
        self.shared.wake.notify_all();

        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("clipboard-clear".into())
            .spawn(move || run_timer(&shared, generation))
            .map_err(|e| VaultError::Clipboard(format!("cannot start timer: {e}")))?;

        debug!(generation, after_ms = after.as_millis() as u64, "clipboard clear armed");
        Ok(())
    }

    /// Drop the pending clear, if any, without touching the clipboard.
    pub fn cancel(&self) {
        {
            let mut state = self.shared.state.lock();
            state.generation += 1;
            state.deadline = None;
        }
        self.shared.wake.notify_all();
    }

    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().deadline.is_some()
    }

    /// Block until no clear is pending or `limit` elapses.
    ///
    /// Short-lived processes call this so the clear still happens before exit.
    pub fn wait(&self, limit: Duration) -> bool {
        let give_up = Instant::now().checked_add(limit);
        let mut state = self.shared.state.lock();
        while state.deadline.is_some() {
            match give_up {
                Some(at) => {
                    if self.shared.wake.wait_until(&mut state, at).timed_out() {
                        return state.deadline.is_none();
                    }
                }
                // Unrepresentable limit: wait for as long as it takes.
                None => self.shared.wake.wait(&mut state),
            }
        }
        true
    }
}

fn deadline_after(after: Duration) -> Result<Instant> {
    Instant::now().checked_add(after).ok_or_else(|| {
        VaultError::Clipboard(format!("clear delay of {}s is out of range", after.as_secs()))
    })
}

fn run_timer(shared: &Shared, generation: u64) {
    let mut state = shared.state.lock();
    loop {
        if state.generation != generation {
            return;
        }
        let Some(deadline) = state.deadline else {
            return;
        };
        if Instant::now() >= deadline {
            break;
        }
        shared.wake.wait_until(&mut state, deadline);
    }

    // Still current and due: fire while holding the lock so a concurrent
    // `arm` cannot slip in between the check and the clear.
    state.deadline = None;
    if let Err(e) = shared.sink.clear() {
        warn!(error = %e, "clipboard clear failed");
    }
    drop(state);

    shared.wake.notify_all();
    (shared.on_cleared)();
    debug!(generation, "clipboard cleared");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[derive(Clone, Default)]
    struct RecordingSink {
        contents: Arc<Mutex<String>>,
        clears: Arc<AtomicUsize>,
    }

    impl ClipboardSink for RecordingSink {
        fn set_text(&self, text: &str) -> Result<()> {
            *self.contents.lock() = text.to_string();
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            self.contents.lock().clear();
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn fires_once_after_delay() {
        let sink = RecordingSink::default();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let timer = ClipboardTimer::new(sink.clone(), move || {
            let _ = tx.lock().send(());
        });

        timer.copy("hunter2", Duration::from_millis(50)).unwrap();
        assert_eq!(*sink.contents.lock(), "hunter2");
        assert!(timer.is_pending());

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(*sink.contents.lock(), "");
        assert_eq!(sink.clears.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());
    }

    #[test]
    fn rearming_replaces_the_pending_clear() {
        let sink = RecordingSink::default();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let timer = ClipboardTimer::new(sink.clone(), move || {
            let _ = tx.lock().send(Instant::now());
        });

        timer.arm(Duration::from_millis(500)).unwrap();
        thread::sleep(Duration::from_millis(200));
        let second_arm = Instant::now();
        timer.arm(Duration::from_millis(500)).unwrap();

        // The first timer would have fired around 500ms after it was armed.
        assert!(rx.recv_timeout(Duration::from_millis(400)).is_err());

        let fired_at = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(fired_at.duration_since(second_arm) >= Duration::from_millis(500));

        thread::sleep(Duration::from_millis(200));
        assert_eq!(sink.clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_prevents_the_clear() {
        let sink = RecordingSink::default();
        let timer = ClipboardTimer::new(sink.clone(), || {});

        timer.copy("secret", Duration::from_millis(50)).unwrap();
        timer.cancel();
        thread::sleep(Duration::from_millis(200));

        assert_eq!(*sink.contents.lock(), "secret");
        assert_eq!(sink.clears.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unrepresentable_delay_is_an_error_not_a_panic() {
        let sink = RecordingSink::default();
        let timer = ClipboardTimer::new(sink.clone(), || {});

        let err = timer
            .copy("secret", Duration::from_secs(u64::MAX))
            .unwrap_err();
        assert!(matches!(err, VaultError::Clipboard(_)));
        assert!(timer.arm(Duration::MAX).is_err());

        // Nothing reached the clipboard and nothing is pending.
        assert_eq!(*sink.contents.lock(), "");
        assert!(!timer.is_pending());
        assert!(timer.wait(Duration::MAX));
    }

    #[test]
    fn wait_returns_once_cleared() {
        let sink = RecordingSink::default();
        let timer = ClipboardTimer::new(sink.clone(), || {});

        timer.copy("x", Duration::from_millis(30)).unwrap();
        assert!(timer.wait(Duration::from_secs(2)));
        assert_eq!(sink.clears.load(Ordering::SeqCst), 1);
    }
}
