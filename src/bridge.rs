//! Bridge from the transcription worker into the dispatch loop.
//!
//! This is the one place where the pipeline's two long-lived concurrency
//! domains meet: a free-running OS thread on one side, a cooperative tokio
//! task on the other.  [`ResultBridge::deliver`] is synchronous and never
//! blocks — results posted before the dispatch loop has started are buffered
//! in the channel, so there is no start-up ordering hazard and no way to
//! deadlock on the hand-off.
//!
//! Ordering is preserved: results arrive at the dispatch loop in the exact
//! order they were delivered.  Capacity is unbounded — a slow command
//! processor backs results up here, which is the pipeline's documented
//! backpressure point.

use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// TranscriptionResult
// ---------------------------------------------------------------------------

/// The transcript of one audio segment, produced by the worker and consumed
/// exactly once by the dispatch loop.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    /// Transcribed text, trimmed.
    pub text: String,
    /// Id of the segment this text came from.
    pub segment_id: u64,
    /// When transcription finished.  Monotonic, so the dispatch loop can log
    /// how long a result sat queued behind slower commands.
    pub completed_at: Instant,
}

impl TranscriptionResult {
    /// Build a result stamped with the current instant.
    pub fn new(text: impl Into<String>, segment_id: u64) -> Self {
        Self {
            text: text.into(),
            segment_id,
            completed_at: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The dispatch side of the bridge has been dropped.
///
/// Carries the result back so the caller can log what was lost.
#[derive(Debug, Error)]
#[error("result bridge closed — dispatch loop gone (segment {})", .0.segment_id)]
pub struct BridgeClosed(pub TranscriptionResult);

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Create a connected ([`ResultBridge`], [`ResultReceiver`]) pair.
pub fn result_bridge() -> (ResultBridge, ResultReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResultBridge { tx }, ResultReceiver { rx })
}

// ---------------------------------------------------------------------------
// ResultBridge (worker side)
// ---------------------------------------------------------------------------

/// Worker-side half: synchronous, non-blocking delivery into the dispatch
/// loop's scheduling context.
#[derive(Clone)]
pub struct ResultBridge {
    tx: mpsc::UnboundedSender<TranscriptionResult>,
}

impl ResultBridge {
    /// Deliver a result.  Never blocks; safe to call before the receiving
    /// loop has started (the result is buffered).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeClosed`] (holding the result) when the receiver has
    /// been dropped.
    pub fn deliver(&self, result: TranscriptionResult) -> Result<(), BridgeClosed> {
        self.tx.send(result).map_err(|e| BridgeClosed(e.0))
    }
}

// ---------------------------------------------------------------------------
// ResultReceiver (dispatch side)
// ---------------------------------------------------------------------------

/// Dispatch-side half, consumed by the single cooperative loop.
pub struct ResultReceiver {
    rx: mpsc::UnboundedReceiver<TranscriptionResult>,
}

impl ResultReceiver {
    /// Wait for the next result.
    ///
    /// Returns `None` when every [`ResultBridge`] handle has been dropped and
    /// the channel is drained — the dispatch loop's shutdown signal.
    pub async fn recv(&mut self) -> Option<TranscriptionResult> {
        self.rx.recv().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivery_before_receiver_runs_is_buffered() {
        let (bridge, mut rx) = result_bridge();

        // Deliver while nothing is awaiting — must neither block nor fail.
        bridge.deliver(TranscriptionResult::new("early", 1)).unwrap();
        bridge.deliver(TranscriptionResult::new("late", 2)).unwrap();

        assert_eq!(rx.recv().await.unwrap().text, "early");
        assert_eq!(rx.recv().await.unwrap().text, "late");
    }

    #[tokio::test]
    async fn order_is_preserved_across_a_thread() {
        let (bridge, mut rx) = result_bridge();

        let worker = std::thread::spawn(move || {
            for id in 0..50 {
                bridge
                    .deliver(TranscriptionResult::new(format!("r{id}"), id))
                    .unwrap();
            }
        });

        for id in 0..50 {
            assert_eq!(rx.recv().await.unwrap().segment_id, id);
        }
        worker.join().unwrap();
    }

    #[tokio::test]
    async fn recv_returns_none_after_bridge_dropped() {
        let (bridge, mut rx) = result_bridge();
        bridge.deliver(TranscriptionResult::new("last", 7)).unwrap();
        drop(bridge);

        assert_eq!(rx.recv().await.unwrap().segment_id, 7);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn deliver_after_receiver_dropped_returns_result() {
        let (bridge, rx) = result_bridge();
        drop(rx);

        let err = bridge
            .deliver(TranscriptionResult::new("lost", 3))
            .unwrap_err();
        assert_eq!(err.0.segment_id, 3);
        assert_eq!(err.0.text, "lost");
    }
}
