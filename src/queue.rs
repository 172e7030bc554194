//! Hand-off queue between the recorder and the transcription worker.
//!
//! [`segment_queue`] returns the two halves of an unbounded FIFO channel:
//! [`SegmentQueue`] for the recorder side (non-blocking push, callable from
//! any context) and [`SegmentConsumer`] for the single worker thread
//! (blocking pop).
//!
//! Depth is unbounded on purpose: if transcription falls behind the
//! operator's talk/release cadence the queue grows.  That risk is documented
//! and accepted rather than mitigated here — bounding the queue would force a
//! blocking or dropping policy onto the recorder, and the input rate is
//! already human-limited.

use std::sync::mpsc;

use thiserror::Error;

use crate::audio::AudioSegment;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The consumer half of the queue has been dropped.
///
/// Carries the segment back so the caller can log its id (or decide to do
/// something else with it) instead of silently losing it.
#[derive(Debug, Error)]
#[error("segment queue closed — consumer dropped (segment {})", .0.id)]
pub struct QueueClosed(pub AudioSegment);

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Create a connected ([`SegmentQueue`], [`SegmentConsumer`]) pair.
pub fn segment_queue() -> (SegmentQueue, SegmentConsumer) {
    let (tx, rx) = mpsc::channel();
    (SegmentQueue { tx }, SegmentConsumer { rx })
}

// ---------------------------------------------------------------------------
// SegmentQueue (producer half)
// ---------------------------------------------------------------------------

/// Producer half: non-blocking, unbounded push of finalized segments.
///
/// Clonable so more than one recorder could feed the same worker, though the
/// standard wiring uses exactly one.
#[derive(Clone)]
pub struct SegmentQueue {
    tx: mpsc::Sender<AudioSegment>,
}

impl SegmentQueue {
    /// Enqueue a segment.  Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] (holding the segment) when the consumer has
    /// been dropped.
    pub fn push(&self, segment: AudioSegment) -> Result<(), QueueClosed> {
        self.tx.send(segment).map_err(|e| QueueClosed(e.0))
    }
}

// ---------------------------------------------------------------------------
// SegmentConsumer (consumer half)
// ---------------------------------------------------------------------------

/// Consumer half, owned by the single transcription worker.
pub struct SegmentConsumer {
    rx: mpsc::Receiver<AudioSegment>,
}

impl SegmentConsumer {
    /// Block until the next segment is available.
    ///
    /// Returns `None` when every [`SegmentQueue`] handle has been dropped and
    /// the queue is drained — the worker's shutdown signal.
    pub fn pop_blocking(&self) -> Option<AudioSegment> {
        self.rx.recv().ok()
    }

    /// Non-blocking pop, used by tests to assert emptiness.
    #[cfg(test)]
    pub fn try_pop(&self) -> Option<AudioSegment> {
        self.rx.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: u64) -> AudioSegment {
        AudioSegment {
            id,
            samples: vec![0.0; 4],
            sample_rate: 16_000,
            channels: 1,
        }
    }

    #[test]
    fn push_pop_is_fifo() {
        let (queue, consumer) = segment_queue();
        for id in 0..5 {
            queue.push(segment(id)).unwrap();
        }
        for id in 0..5 {
            assert_eq!(consumer.pop_blocking().unwrap().id, id);
        }
    }

    #[test]
    fn pop_returns_none_after_all_producers_dropped() {
        let (queue, consumer) = segment_queue();
        queue.push(segment(1)).unwrap();
        drop(queue);

        assert_eq!(consumer.pop_blocking().unwrap().id, 1);
        assert!(consumer.pop_blocking().is_none());
    }

    #[test]
    fn push_after_consumer_dropped_returns_segment() {
        let (queue, consumer) = segment_queue();
        drop(consumer);

        let err = queue.push(segment(9)).unwrap_err();
        assert_eq!(err.0.id, 9);
    }

    #[test]
    fn fifo_across_threads() {
        let (queue, consumer) = segment_queue();

        let producer = std::thread::spawn(move || {
            for id in 0..100 {
                queue.push(segment(id)).unwrap();
            }
        });

        let mut seen = Vec::new();
        while let Some(seg) = consumer.pop_blocking() {
            seen.push(seg.id);
        }
        producer.join().unwrap();

        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }
}
