//! Growable sample accumulator for one push-to-talk recording.
//!
//! [`CaptureBuffer`] collects the `f32` samples of a single recording between
//! a key press and the matching release.  Unlike a circular buffer it never
//! discards data — a spoken command must reach the transcription engine
//! complete, head included.  The configured maximum recording length is used
//! as a preallocation hint so appends on the hot path stay cheap; it is not
//! a hard cap.
//!
//! # Example
//!
//! ```rust
//! use voicepipe::audio::CaptureBuffer;
//!
//! let mut buf = CaptureBuffer::with_capacity(16_000);
//! buf.push_chunk(&[0.1, 0.2, 0.3]);
//! assert_eq!(buf.len(), 3);
//!
//! let samples = buf.take();
//! assert_eq!(samples, vec![0.1, 0.2, 0.3]);
//! assert!(buf.is_empty());
//! ```

// ---------------------------------------------------------------------------
// CaptureBuffer
// ---------------------------------------------------------------------------

/// Append-only sample buffer for the recording currently in progress.
///
/// Owned exclusively by the recorder; samples are handed off **by value**
/// with [`take`](Self::take) when the recording is finalized, so no other
/// component ever holds a reference into the buffer.
pub struct CaptureBuffer {
    samples: Vec<f32>,
    /// Preallocation hint applied to every fresh buffer.
    reserve: usize,
}

impl CaptureBuffer {
    /// Create a buffer that preallocates room for `reserve` samples.
    ///
    /// `reserve` is typically `sample_rate × max_recording_secs`.  Pushing
    /// past it simply grows the buffer.
    pub fn with_capacity(reserve: usize) -> Self {
        Self {
            samples: Vec::with_capacity(reserve),
            reserve,
        }
    }

    /// Append one chunk of samples.
    pub fn push_chunk(&mut self, chunk: &[f32]) {
        self.samples.extend_from_slice(chunk);
    }

    /// Hand off all accumulated samples, leaving a fresh preallocated buffer
    /// behind for the next recording.
    pub fn take(&mut self) -> Vec<f32> {
        std::mem::replace(&mut self.samples, Vec::with_capacity(self.reserve))
    }

    /// Discard all accumulated samples, keeping the allocation.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Number of samples currently accumulated.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when no samples have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Accumulated duration in seconds, assuming `sample_rate` Hz mono.
    pub fn duration_secs(&self, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
