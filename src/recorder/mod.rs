//! Record/idle state machine and its driver task.
//!
//! [`Recorder`] owns the recording state, the capture buffer and the segment
//! id counter — there is no process-wide recording flag anywhere.  Chunks
//! arrive unconditionally from the capture side; the recorder decides whether
//! to retain them based on its current state.
//!
//! [`RecorderRunner`] is the tokio task that feeds the recorder from the key
//! event and chunk channels and pushes finalized segments onto the
//! [`SegmentQueue`](crate::queue::SegmentQueue).

pub mod runner;
pub mod state;

pub use runner::RecorderRunner;
pub use state::{Recorder, RecorderState};
