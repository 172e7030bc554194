//! Global push-to-talk key listener, backed by `rdev`.
//!
//! # Design
//!
//! `rdev::listen()` is a blocking OS-level call that never returns while the
//! process is alive.  It must run on a **dedicated OS thread** — it cannot be
//! used inside a tokio task.
//!
//! [`HotkeyListener::start`] spawns that dedicated thread and returns a
//! [`HotkeyListener`] handle.  Dropping the handle sets a stop flag so the
//! callback silently discards further events.  The underlying thread will
//! continue to exist until the process exits (rdev has no graceful shutdown
//! API), but it consumes no meaningful CPU while blocked waiting for
//! keyboard events.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use voicepipe::hotkey::{HotkeyEvent, HotkeyListener, parse_key};
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let key = parse_key("Space").expect("unknown key");
//! let _listener = HotkeyListener::start(key, tx);
//!
//! // In your async loop:
//! // while let Some(ev) = rx.recv().await { ... }
//! ```

pub mod listener;

pub use listener::HotkeyListener;

// ---------------------------------------------------------------------------
// HotkeyEvent
// ---------------------------------------------------------------------------

/// Events emitted by the hotkey listener thread.
///
/// The listener forwards only real up/down edges — OS auto-repeat presses
/// for a held key are swallowed at the source.  The recorder still treats a
/// duplicate edge as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The push-to-talk key was pressed down.
    PushToTalkPressed,
    /// The push-to-talk key was released.
    PushToTalkReleased,
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a hotkey name from a config string into an [`rdev::Key`].
///
/// Supports F1–F12 and the named keys that make sense for a hold-to-talk
/// binding.  Letter keys are deliberately not accepted: a held letter would
/// fight normal typing.
///
/// Returns `None` for unrecognised names so callers can fall back to a
/// default or surface a config error.
///
/// # Examples
///
/// ```
/// use voicepipe::hotkey::parse_key;
///
/// assert_eq!(parse_key("Space"), Some(rdev::Key::Space));
/// assert_eq!(parse_key("F9"),    Some(rdev::Key::F9));
/// assert_eq!(parse_key("a"),     None);
/// ```
pub fn parse_key(key_str: &str) -> Option<rdev::Key> {
    match key_str {
        // Function keys
        "F1" => Some(rdev::Key::F1),
        "F2" => Some(rdev::Key::F2),
        "F3" => Some(rdev::Key::F3),
        "F4" => Some(rdev::Key::F4),
        "F5" => Some(rdev::Key::F5),
        "F6" => Some(rdev::Key::F6),
        "F7" => Some(rdev::Key::F7),
        "F8" => Some(rdev::Key::F8),
        "F9" => Some(rdev::Key::F9),
        "F10" => Some(rdev::Key::F10),
        "F11" => Some(rdev::Key::F11),
        "F12" => Some(rdev::Key::F12),

        // Hold-friendly named keys
        "Space" => Some(rdev::Key::Space),
        "Tab" => Some(rdev::Key::Tab),
        "CapsLock" => Some(rdev::Key::CapsLock),
        "Home" => Some(rdev::Key::Home),
        "End" => Some(rdev::Key::End),
        "PageUp" => Some(rdev::Key::PageUp),
        "PageDown" => Some(rdev::Key::PageDown),
        "Insert" => Some(rdev::Key::Insert),
        "Pause" => Some(rdev::Key::Pause),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
