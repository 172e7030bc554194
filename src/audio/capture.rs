//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle.  The stream
//! is requested at the pipeline's fixed format (16 kHz, mono by default)
//! rather than the device's preferred configuration, so no resampling layer
//! sits between the microphone and the transcription engine.  Call
//! [`AudioCapture::start`] with a [`ChunkSender`] to begin streaming
//! [`AudioChunk`]s; the returned [`StreamHandle`] is a RAII guard — dropping
//! it stops the underlying cpal stream.
//!
//! # The callback path
//!
//! The cpal callback runs on a latency-sensitive audio thread.  It does one
//! thing: copy the delivered slice into an owned [`AudioChunk`] and
//! `try_send` it over a bounded channel.  No locks, no I/O, no state reads.
//! When the channel is full the chunk is dropped and counted; the recorder
//! reads the counter when it finalizes a segment and reports the loss.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the cpal callback.
///
/// Samples are `f32` in the range `[-1.0, 1.0]`.  With the fixed capture
/// format the rate and channel fields are constant across a stream, but each
/// chunk carries them so the capture boundary stays self-describing.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of this chunk in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// DropCounter
// ---------------------------------------------------------------------------

/// Shared counter of chunks discarded because the chunk channel was full.
///
/// Cheap to clone; all operations are relaxed atomics, safe to touch from
/// the audio callback.
#[derive(Clone, Default)]
pub struct DropCounter(Arc<AtomicU64>);

impl DropCounter {
    /// Current number of dropped chunks since the last [`take`](Self::take).
    pub fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Read the counter and reset it to zero.
    pub fn take(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }

    fn add_one(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// ChunkSender
// ---------------------------------------------------------------------------

/// The forwarding half handed to the cpal callback.
///
/// Wraps a bounded `tokio::sync::mpsc` sender plus a [`DropCounter`].
/// [`forward`](Self::forward) never blocks: a full channel drops the chunk
/// and bumps the counter, a closed channel (receiver shut down) discards
/// silently so the audio thread can never panic.
pub struct ChunkSender {
    tx: mpsc::Sender<AudioChunk>,
    sample_rate: u32,
    channels: u16,
    dropped: DropCounter,
}

impl ChunkSender {
    /// Wrap `tx`, stamping every forwarded chunk with the given format.
    pub fn new(tx: mpsc::Sender<AudioChunk>, sample_rate: u32, channels: u16) -> Self {
        Self {
            tx,
            sample_rate,
            channels,
            dropped: DropCounter::default(),
        }
    }

    /// Handle to the drop counter, for whoever reports the losses.
    pub fn drop_counter(&self) -> DropCounter {
        self.dropped.clone()
    }

    /// Copy `data` into an owned [`AudioChunk`] and try to enqueue it.
    pub fn forward(&self, data: &[f32]) {
        let chunk = AudioChunk {
            samples: data.to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        };
        match self.tx.try_send(chunk) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.dropped.add_one(),
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the underlying hardware stream.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or running the audio capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone capture wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use voicepipe::audio::{AudioCapture, AudioChunk, ChunkSender};
///
/// let (tx, mut rx) = tokio::sync::mpsc::channel::<AudioChunk>(64);
/// let capture = AudioCapture::new(16_000, 1).unwrap();
/// let _handle = capture.start(ChunkSender::new(tx, 16_000, 1)).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop capturing.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl AudioCapture {
    /// Create an [`AudioCapture`] on the system default input device,
    /// requesting exactly `sample_rate` Hz and `channels` channels.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoDevice`] when no input device is available.
    /// An unsupported format surfaces later, from [`start`](Self::start).
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start capturing and forward every callback buffer through `sender`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the requested stream configuration.
    pub fn start(&self, sender: ChunkSender) -> Result<StreamHandle, CaptureError> {
        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                sender.forward(data);
            },
            |err: cpal::StreamError| {
                log::error!("capture: cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Sample rate the stream was requested at, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count the stream was requested at.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
