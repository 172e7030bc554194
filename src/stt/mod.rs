//! STT (speech-to-text) subsystem.
//!
//! # Architecture
//!
//! ```text
//! SegmentQueue ──▶ TranscriptionWorker (one OS thread)
//!                     │  pop_blocking → SttEngine::transcribe → ResultBridge
//!                     ▼
//!              SttEngine (trait)
//!                     ▲
//!              WhisperEngine (whisper-rs)
//! ```
//!
//! There is exactly one worker: the transcription call is CPU-bound and the
//! model is shared, so segments are transcribed strictly one at a time in
//! arrival order.  That serialization is the pipeline's primary latency
//! bottleneck, accepted in exchange for strict ordering.

pub mod engine;
pub mod whisper;
pub mod worker;

pub use engine::{SttEngine, SttError};
pub use whisper::{TranscribeParams, WhisperEngine};
pub use worker::TranscriptionWorker;

// test-only re-export so sibling test modules can import the mock without
// spelling out the engine path.
#[cfg(test)]
pub use engine::MockSttEngine;
