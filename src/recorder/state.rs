//! Edge-triggered record/idle state machine.
//!
//! Transitions happen only on edges: a press while `Idle` starts a recording,
//! a release while `Recording` finalizes one.  Repeated signals in the same
//! state are no-ops — the OS delivers auto-repeat for a held key as a stream
//! of extra presses, and those must not restart the capture.
//!
//! A release that finds an empty buffer (key tapped faster than any capture
//! callback fired) yields no segment: a zero-length recording is meaningless
//! input and must never reach the transcription worker.

use crate::audio::{AudioSegment, CaptureBuffer};

// ---------------------------------------------------------------------------
// RecorderState
// ---------------------------------------------------------------------------

/// The two states of the push-to-talk machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Not recording; incoming chunks are discarded.
    Idle,
    /// Recording; incoming chunks are appended to the capture buffer.
    Recording,
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Owns the recording state, the capture buffer and the next segment id.
///
/// Exactly one instance exists per pipeline, owned by the
/// [`RecorderRunner`](super::RecorderRunner) task — no other component reads
/// or writes the state.
pub struct Recorder {
    state: RecorderState,
    buffer: CaptureBuffer,
    sample_rate: u32,
    channels: u16,
    next_id: u64,
}

impl Recorder {
    /// Create an idle recorder for the given capture format.
    ///
    /// `max_recording_secs` sizes the buffer preallocation; longer recordings
    /// still work, they just reallocate.
    pub fn new(sample_rate: u32, channels: u16, max_recording_secs: f32) -> Self {
        let reserve = (sample_rate as f32 * channels as f32 * max_recording_secs) as usize;
        Self {
            state: RecorderState::Idle,
            buffer: CaptureBuffer::with_capacity(reserve),
            sample_rate,
            channels,
            next_id: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Key-down edge.  `Idle` → `Recording` with a fresh buffer; a press
    /// while already recording (auto-repeat) is ignored.
    pub fn key_pressed(&mut self) {
        if self.state == RecorderState::Recording {
            return;
        }
        self.buffer.reset();
        self.state = RecorderState::Recording;
        log::info!("recorder: listening started");
    }

    /// Key-up edge.  `Recording` → `Idle`, finalizing the buffer into an
    /// [`AudioSegment`]; a release while already idle is ignored.
    ///
    /// Returns `None` when idle or when the buffer captured zero frames.  An
    /// empty finalize does not consume a segment id, so ids stay contiguous
    /// across the segments that actually exist.
    pub fn key_released(&mut self) -> Option<AudioSegment> {
        if self.state == RecorderState::Idle {
            return None;
        }
        self.state = RecorderState::Idle;

        let duration = self.buffer.duration_secs(self.sample_rate);
        let samples = self.buffer.take();

        if samples.is_empty() {
            log::warn!("recorder: recording stopped with no captured audio, dropping");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        log::info!("recorder: recording stopped, segment {id} ({duration:.2}s)");

        Some(AudioSegment {
            id,
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }

    /// Feed one chunk of captured samples.  Retained only while `Recording`;
    /// when `Idle` the chunk is discarded.
    pub fn push_chunk(&mut self, samples: &[f32]) {
        if self.state == RecorderState::Recording {
            self.buffer.push_chunk(samples);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> Recorder {
        Recorder::new(16_000, 1, 1.0)
    }

    #[test]
    fn starts_idle() {
        assert_eq!(recorder().state(), RecorderState::Idle);
    }

    #[test]
    fn press_starts_recording_and_release_finalizes() {
        let mut rec = recorder();
        rec.key_pressed();
        assert_eq!(rec.state(), RecorderState::Recording);

        rec.push_chunk(&[0.1, 0.2]);
        let seg = rec.key_released().expect("segment");
        assert_eq!(rec.state(), RecorderState::Idle);
        assert_eq!(seg.id, 0);
        assert_eq!(seg.samples, vec![0.1, 0.2]);
        assert_eq!(seg.sample_rate, 16_000);
        assert_eq!(seg.channels, 1);
    }

    #[test]
    fn repeated_presses_do_not_restart_the_recording() {
        let mut rec = recorder();
        rec.key_pressed();
        rec.push_chunk(&[0.5]);

        // OS auto-repeat: a second press must not clear the buffer.
        rec.key_pressed();
        rec.push_chunk(&[0.6]);

        let seg = rec.key_released().unwrap();
        assert_eq!(seg.samples, vec![0.5, 0.6]);
    }

    #[test]
    fn release_while_idle_is_a_no_op() {
        let mut rec = recorder();
        assert!(rec.key_released().is_none());
        assert_eq!(rec.state(), RecorderState::Idle);
    }

    #[test]
    fn empty_recording_yields_no_segment_and_no_id() {
        let mut rec = recorder();

        // Tap: press + release with no chunk in between.
        rec.key_pressed();
        assert!(rec.key_released().is_none());

        // The next real recording still gets id 0.
        rec.key_pressed();
        rec.push_chunk(&[0.1]);
        assert_eq!(rec.key_released().unwrap().id, 0);
    }

    #[test]
    fn chunks_while_idle_are_discarded() {
        let mut rec = recorder();
        rec.push_chunk(&[9.0, 9.0]);

        rec.key_pressed();
        rec.push_chunk(&[0.1]);
        let seg = rec.key_released().unwrap();

        // Only the chunk pushed while recording is present.
        assert_eq!(seg.samples, vec![0.1]);
    }

    #[test]
    fn segment_ids_increase_per_finalized_recording() {
        let mut rec = recorder();
        for expected in 0..3 {
            rec.key_pressed();
            rec.push_chunk(&[0.1]);
            assert_eq!(rec.key_released().unwrap().id, expected);
        }
    }

    /// Property from the design: segments produced == (down,up) pairs minus
    /// pairs with zero captured frames, for an arbitrary edge sequence.
    #[test]
    fn segment_count_matches_non_empty_pairs() {
        let mut rec = recorder();
        let mut produced = 0;

        // (captured chunks per pair) — two of the five pairs are empty.
        let pairs = [3usize, 0, 1, 0, 2];
        for chunks in pairs {
            rec.key_pressed();
            rec.key_pressed(); // duplicate edge, ignored
            for _ in 0..chunks {
                rec.push_chunk(&[0.0; 160]);
            }
            if rec.key_released().is_some() {
                produced += 1;
            }
            assert!(rec.key_released().is_none()); // duplicate edge, ignored
        }

        assert_eq!(produced, pairs.iter().filter(|&&c| c > 0).count());
    }
}
