//! Tokio task that drives the [`Recorder`] from its input channels.
//!
//! Selects over the key-event channel and the chunk channel.  On a release it
//! first drains any chunks still sitting in the channel — audio the callback
//! delivered before the key-up must end up in the segment — then finalizes
//! and pushes onto the [`SegmentQueue`].
//!
//! The task exits when the key channel closes; dropping its `SegmentQueue`
//! handle then cascades shutdown through the worker and the dispatch loop.

use tokio::sync::mpsc;

use crate::audio::{AudioChunk, DropCounter};
use crate::hotkey::HotkeyEvent;
use crate::queue::SegmentQueue;

use super::state::Recorder;

// ---------------------------------------------------------------------------
// RecorderRunner
// ---------------------------------------------------------------------------

/// Owns the [`Recorder`] and its input channels; runs as a single tokio task.
pub struct RecorderRunner {
    recorder: Recorder,
    key_rx: mpsc::Receiver<HotkeyEvent>,
    chunk_rx: mpsc::Receiver<AudioChunk>,
    dropped: DropCounter,
    queue: SegmentQueue,
}

impl RecorderRunner {
    /// Wire a runner to its recorder, input channels and output queue.
    ///
    /// `dropped` is the counter fed by the capture callback; its value is
    /// read and reported every time a segment is finalized.
    pub fn new(
        recorder: Recorder,
        key_rx: mpsc::Receiver<HotkeyEvent>,
        chunk_rx: mpsc::Receiver<AudioChunk>,
        dropped: DropCounter,
        queue: SegmentQueue,
    ) -> Self {
        Self {
            recorder,
            key_rx,
            chunk_rx,
            dropped,
            queue,
        }
    }

    /// Run until the key channel closes.  Spawn as a tokio task.
    pub async fn run(mut self) {
        let mut chunks_open = true;

        loop {
            tokio::select! {
                event = self.key_rx.recv() => match event {
                    Some(HotkeyEvent::PushToTalkPressed) => {
                        self.recorder.key_pressed();
                    }
                    Some(HotkeyEvent::PushToTalkReleased) => {
                        if !self.handle_release() {
                            return;
                        }
                    }
                    None => break,
                },

                Some(chunk) = self.chunk_rx.recv(), if chunks_open => {
                    self.recorder.push_chunk(&chunk.samples);
                }

                // Chunk channel closed (capture stopped) — keep serving key
                // events, just stop polling the dead channel.
                else => {
                    chunks_open = false;
                }
            }
        }

        log::info!("recorder: key channel closed, runner shutting down");
    }

    /// Drain pending chunks, finalize, push.  Returns `false` when the
    /// segment queue is gone and the runner should stop.
    fn handle_release(&mut self) -> bool {
        while let Ok(chunk) = self.chunk_rx.try_recv() {
            self.recorder.push_chunk(&chunk.samples);
        }

        let lost = self.dropped.take();
        if lost > 0 {
            log::warn!("recorder: {lost} chunk(s) dropped by the capture channel during this recording");
        }

        if let Some(segment) = self.recorder.key_released() {
            if let Err(e) = self.queue.push(segment) {
                log::error!("recorder: {e}; shutting down");
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
