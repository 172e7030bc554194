//! The sequential dispatch loop.
//!
//! One cooperative task: wait for the next [`TranscriptionResult`], await the
//! command processor, log the outcome, repeat.  The processor is never
//! invoked concurrently with itself — a slow command simply backs results up
//! in the bridge, which is the pipeline's accepted backpressure point.
//!
//! A [`CommandError`] is reported and the loop continues with the next
//! result; nothing here is fatal.

use std::sync::Arc;

use crate::bridge::ResultReceiver;

use super::processor::CommandProcessor;

// ---------------------------------------------------------------------------
// DispatchLoop
// ---------------------------------------------------------------------------

/// Drives the command processor, one result at a time.
pub struct DispatchLoop {
    processor: Arc<dyn CommandProcessor>,
}

impl DispatchLoop {
    pub fn new(processor: Arc<dyn CommandProcessor>) -> Self {
        Self { processor }
    }

    /// Run until the result bridge closes.  Spawn as a tokio task or
    /// `block_on` it directly.
    pub async fn run(self, mut results: ResultReceiver) {
        while let Some(result) = results.recv().await {
            let queued_for = result.completed_at.elapsed();
            log::info!(
                "dispatch: running command for segment {} (queued {:.2}s): {:?}",
                result.segment_id,
                queued_for.as_secs_f32(),
                result.text
            );

            match self.processor.process(&result.text).await {
                Ok(reply) => {
                    log::info!("dispatch: segment {} done: {reply}", result.segment_id);
                }
                Err(e) => {
                    log::warn!("dispatch: command for segment {} failed: {e}", result.segment_id);
                }
            }
        }

        log::info!("dispatch: result bridge closed, loop exiting");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
