//! The single transcription worker thread.
//!
//! Pulls segments off the [`SegmentConsumer`] one at a time, runs the engine,
//! and delivers each transcript through the [`ResultBridge`].  Because there
//! is exactly one worker, relative order of results is the relative order of
//! segments — no coordination needed.
//!
//! A failed transcription is logged and the segment dropped; the loop moves
//! on to the next segment without retrying.  The worker exits when the
//! segment queue closes, or when the bridge closes underneath it.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::bridge::{ResultBridge, TranscriptionResult};
use crate::queue::SegmentConsumer;

use super::engine::SttEngine;

// ---------------------------------------------------------------------------
// TranscriptionWorker
// ---------------------------------------------------------------------------

/// Handle to the running worker thread.
pub struct TranscriptionWorker {
    handle: thread::JoinHandle<()>,
}

impl TranscriptionWorker {
    /// Spawn the worker thread.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread (extremely unlikely).
    pub fn spawn(
        engine: Arc<dyn SttEngine>,
        segments: SegmentConsumer,
        bridge: ResultBridge,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("transcription-worker".into())
            .spawn(move || worker_loop(engine, segments, bridge))
            .expect("failed to spawn transcription-worker thread");

        Self { handle }
    }

    /// Wait for the worker to exit.  Used for orderly shutdown in tests —
    /// drop every `SegmentQueue` handle first, then join.
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

fn worker_loop(engine: Arc<dyn SttEngine>, segments: SegmentConsumer, bridge: ResultBridge) {
    while let Some(segment) = segments.pop_blocking() {
        let started = Instant::now();
        log::debug!(
            "stt: transcribing segment {} ({:.2}s of audio)",
            segment.id,
            segment.duration_secs()
        );

        match engine.transcribe(&segment.samples, segment.sample_rate) {
            Ok(text) => {
                log::info!(
                    "stt: segment {} transcribed in {:.2}s: {:?}",
                    segment.id,
                    started.elapsed().as_secs_f32(),
                    text
                );
                if let Err(e) = bridge.deliver(TranscriptionResult::new(text, segment.id)) {
                    log::info!("stt: {e}; worker exiting");
                    return;
                }
            }
            Err(e) => {
                // Dropped, not retried — the failure affects only this segment.
                log::warn!("stt: transcription of segment {} failed: {e}", segment.id);
            }
        }
    }

    log::info!("stt: segment queue closed, worker exiting");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::audio::AudioSegment;
    use crate::bridge::result_bridge;
    use crate::queue::segment_queue;
    use crate::stt::engine::{MockSttEngine, SttError};

    fn segment(id: u64, secs: f32) -> AudioSegment {
        AudioSegment {
            id,
            samples: vec![0.0; (16_000.0 * secs) as usize],
            sample_rate: 16_000,
            channels: 1,
        }
    }

    #[tokio::test]
    async fn transcribes_and_delivers_in_fifo_order() {
        let (queue, consumer) = segment_queue();
        let (bridge, mut results) = result_bridge();
        let engine = Arc::new(MockSttEngine::script(vec![
            Ok("first".into()),
            Ok("second".into()),
            Ok("third".into()),
        ]));

        let worker = TranscriptionWorker::spawn(engine, consumer, bridge);
        for id in 0..3 {
            queue.push(segment(id, 0.1)).unwrap();
        }
        drop(queue);

        for (id, text) in [(0, "first"), (1, "second"), (2, "third")] {
            let result = results.recv().await.expect("result");
            assert_eq!(result.segment_id, id);
            assert_eq!(result.text, text);
        }
        assert!(results.recv().await.is_none());
        worker.join();
    }

    /// A failure on segment N must not prevent segment N+1 from being
    /// transcribed and delivered.
    #[tokio::test]
    async fn failed_segment_is_dropped_and_loop_continues() {
        let (queue, consumer) = segment_queue();
        let (bridge, mut results) = result_bridge();
        let engine = Arc::new(MockSttEngine::script(vec![
            Ok("before".into()),
            Err(SttError::Transcription("model choked".into())),
            Ok("after".into()),
        ]));
        let engine_handle = Arc::clone(&engine);

        let worker = TranscriptionWorker::spawn(engine, consumer, bridge);
        for id in 0..3 {
            queue.push(segment(id, 0.1)).unwrap();
        }
        drop(queue);

        assert_eq!(results.recv().await.unwrap().segment_id, 0);
        // Segment 1 produced no result; segment 2 comes straight after.
        assert_eq!(results.recv().await.unwrap().segment_id, 2);
        assert!(results.recv().await.is_none());

        worker.join();
        assert_eq!(engine_handle.calls(), 3);
    }

    /// Three queued segments with a fixed per-call delay are processed one at
    /// a time: the Nth result cannot arrive before N × delay.
    #[tokio::test]
    async fn processing_is_serialized() {
        let delay = Duration::from_millis(30);
        let (queue, consumer) = segment_queue();
        let (bridge, mut results) = result_bridge();
        let engine = Arc::new(MockSttEngine::ok("text").with_delay(delay));

        let start = Instant::now();
        let worker = TranscriptionWorker::spawn(engine, consumer, bridge);
        for id in 0..3 {
            queue.push(segment(id, 0.1)).unwrap();
        }
        drop(queue);

        assert_eq!(results.recv().await.unwrap().segment_id, 0);
        let second = results.recv().await.unwrap();
        assert_eq!(second.segment_id, 1);
        // Second result needs at least two full transcription passes.
        assert!(start.elapsed() >= 2 * delay);
        assert_eq!(results.recv().await.unwrap().segment_id, 2);

        worker.join();
    }

    #[tokio::test]
    async fn worker_exits_when_bridge_closes() {
        let (queue, consumer) = segment_queue();
        let (bridge, results) = result_bridge();
        let engine = Arc::new(MockSttEngine::ok("text"));

        let worker = TranscriptionWorker::spawn(engine, consumer, bridge);
        drop(results); // dispatch side gone

        queue.push(segment(0, 0.1)).unwrap();
        // join() must return: the worker notices the closed bridge after the
        // first delivery attempt.
        worker.join();
    }

    #[tokio::test]
    async fn worker_exits_when_queue_closes() {
        let (queue, consumer) = segment_queue();
        let (bridge, _results) = result_bridge();
        let engine = Arc::new(MockSttEngine::ok("text"));
        let engine_handle = Arc::clone(&engine);

        let worker = TranscriptionWorker::spawn(
            engine as Arc<dyn SttEngine>,
            consumer,
            bridge,
        );
        drop(queue);
        worker.join();

        assert_eq!(engine_handle.calls(), 0);
    }
}
