//! A finalized push-to-talk recording.
//!
//! [`AudioSegment`] is created exactly once, when a recording is stopped,
//! and is immutable from then on.  It travels by value through the segment
//! queue to the transcription worker, which consumes it; nothing retains a
//! segment after transcription.

// ---------------------------------------------------------------------------
// AudioSegment
// ---------------------------------------------------------------------------

/// One complete recording between a key press and the matching release.
///
/// Segment ids are assigned by the recorder in strictly increasing order of
/// finalization, so equal ordering of ids and of recordings is guaranteed
/// end to end.
#[derive(Clone)]
pub struct AudioSegment {
    /// Monotonically increasing sequence id, assigned at finalize time.
    pub id: u64,
    /// Mono PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz (16 000 for the fixed capture format).
    pub sample_rate: u32,
    /// Channel count (1 for the fixed capture format).
    pub channels: u16,
}

impl AudioSegment {
    /// Number of sample frames in the segment.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when the segment holds no samples.
    ///
    /// The recorder never forwards such a segment, but the check is kept
    /// here so consumers can assert the contract.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recording duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

// A minute of speech is ~1M samples; eliding them keeps log / assert output
// readable.
impl std::fmt::Debug for AudioSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSegment")
            .field("id", &self.id)
            .field("frames", &self.samples.len())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
