//! Push-to-talk voice-command pipeline.
//!
//! Hold the trigger key, speak, release — the captured audio is transcribed
//! off-thread and the text is handed to a downstream command processor, either
//! in-process or across a named pipe to a second process.
//!
//! # Pipeline
//!
//! ```text
//! key events ─▶ Recorder ─▶ AudioSegment ─▶ SegmentQueue ─▶ TranscriptionWorker
//!                  ▲                                              │
//!          cpal callback ─▶ AudioChunk (bounded mpsc)             ▼
//!                                                           ResultBridge
//!                                                                │
//!                                         DispatchLoop ◀────────┘
//!                                         (or PipeRelay ─▶ remote DispatchLoop)
//! ```
//!
//! Three execution contexts meet here and never share mutable state:
//!
//! 1. The **cpal callback** — real-time sensitive; it only copies samples into
//!    an owned chunk and `try_send`s it ([`audio::ChunkSender`]).
//! 2. The **transcription worker** — one blocking OS thread that pulls
//!    segments one at a time ([`stt::TranscriptionWorker`]); segments are
//!    transcribed strictly in arrival order.
//! 3. The **dispatch loop** — one cooperative tokio task that awaits the
//!    command processor for one result at a time ([`dispatch::DispatchLoop`]).
//!
//! The queues between them ([`queue`], [`bridge`]) are unbounded; the only
//! throttle on input rate is the operator's talk/release cadence.

pub mod audio;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod hotkey;
pub mod queue;
pub mod recorder;
pub mod stt;

#[cfg(unix)]
pub mod relay;
