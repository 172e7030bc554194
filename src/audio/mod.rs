//! Audio path — microphone capture → chunk channel → capture buffer → segment.
//!
//! # Flow
//!
//! ```text
//! Microphone → cpal callback → ChunkSender (bounded mpsc) → Recorder
//!           → CaptureBuffer → AudioSegment (finalized on key release)
//! ```
//!
//! The stream is opened at the pipeline's fixed format (16 kHz mono), so no
//! resampling step exists between the microphone and the transcription engine.

pub mod buffer;
pub mod capture;
pub mod segment;

pub use buffer::CaptureBuffer;
pub use capture::{AudioCapture, AudioChunk, CaptureError, ChunkSender, DropCounter, StreamHandle};
pub use segment::AudioSegment;
