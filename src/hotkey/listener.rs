//! Dedicated OS-thread key listener using `rdev::listen`.
//!
//! `rdev::listen` is a blocking call that must live on its own OS thread.
//! [`HotkeyListener`] owns that thread and a stop flag; dropping it sets the
//! flag so the callback silently ignores further events.
//!
//! Holding a key makes the OS deliver auto-repeat as a stream of extra press
//! events.  The callback tracks the key's up/down edge itself and forwards
//! only real transitions, so downstream channels carry at most one event per
//! physical edge.  (The recorder still tolerates duplicates, since a second
//! listener or a missed release could reintroduce them.)
//!
//! # Shutdown caveat
//!
//! `rdev::listen` has **no graceful shutdown API**.  Setting the stop flag
//! prevents events from being forwarded, but the OS thread itself will remain
//! blocked in the rdev event loop until the process exits.  This is safe and
//! expected — rdev holds no resources that need explicit cleanup.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use super::HotkeyEvent;

// ---------------------------------------------------------------------------
// HotkeyListener
// ---------------------------------------------------------------------------

/// Handle to a running key listener thread.
///
/// Construct one with [`HotkeyListener::start`].  Drop it to stop forwarding
/// events.
pub struct HotkeyListener {
    /// Shared stop flag — set `true` on [`Drop`].
    stop: Arc<AtomicBool>,
    /// The thread handle.  Kept alive so the thread is not detached
    /// prematurely; never `join`ed because `rdev::listen` never returns.
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// Spawn a dedicated OS thread that watches the global keyboard and
    /// forwards the press/release edges of `key` on `tx`.  Every other key
    /// is ignored — only the single designated trigger key is meaningful.
    ///
    /// `tx` is a bounded `tokio::sync::mpsc` sender; the thread uses
    /// `blocking_send` so it works correctly from a non-async context.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread (extremely unlikely).
    pub fn start(key: rdev::Key, tx: mpsc::Sender<HotkeyEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                // Up/down state of the trigger key, used to swallow the
                // auto-repeat presses the OS emits while the key is held.
                let mut held = false;

                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }

                    match event.event_type {
                        rdev::EventType::KeyPress(k) if k == key => {
                            if !held {
                                held = true;
                                let _ = tx.blocking_send(HotkeyEvent::PushToTalkPressed);
                            }
                        }
                        rdev::EventType::KeyRelease(k) if k == key => {
                            if held {
                                held = false;
                                let _ = tx.blocking_send(HotkeyEvent::PushToTalkReleased);
                            }
                        }
                        _ => {}
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey-listener: rdev::listen exited with error: {:?}", e);
                }
            })
            .expect("failed to spawn hotkey-listener thread");

        Self {
            stop,
            _thread: thread,
        }
    }
}

impl Drop for HotkeyListener {
    /// Set the stop flag so the rdev callback stops forwarding events.
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // The OS thread remains blocked inside rdev::listen until the process
        // exits — safe, no further cleanup needed.
    }
}
