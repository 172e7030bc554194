//! Transcription function boundary.
//!
//! [`SttEngine`] is the black-box interface the pipeline calls: raw samples
//! in, text out, synchronous, potentially slow, CPU-bound, stateless per
//! call.  It is object-safe and `Send + Sync` so it can live behind an
//! `Arc<dyn SttEngine>` shared with the worker thread.
//!
//! [`MockSttEngine`] (under `#[cfg(test)]`) is a scriptable stand-in for
//! testing the worker and the dispatch path without a model file.

use thiserror::Error;

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// All errors that can arise from the STT subsystem.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    /// The GGML model file was not found at the given path.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// `whisper_rs` failed to initialise a context or per-call state.
    #[error("whisper context initialisation failed: {0}")]
    ContextInit(String),

    /// The inference pass itself failed.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// The engine only accepts 16 kHz input; the segment carried another rate.
    #[error("unsupported sample rate {0} Hz — engine requires 16000 Hz")]
    UnsupportedSampleRate(u32),

    /// The audio is shorter than the minimum 0.5 s (8 000 samples at 16 kHz).
    #[error("audio too short — minimum 0.5 s (8 000 samples at 16 kHz)")]
    AudioTooShort,

    /// The audio exceeds the maximum 60 s (960 000 samples at 16 kHz).
    #[error("audio too long — maximum 60 s (960 000 samples at 16 kHz)")]
    AudioTooLong,
}

// ---------------------------------------------------------------------------
// SttEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech-to-text engines.
///
/// # Contract
///
/// - `samples` is mono f32 PCM in `[-1.0, 1.0]` at `sample_rate` Hz.
/// - The call is synchronous and may take seconds; the caller is expected to
///   run it off any latency-sensitive context.
/// - A failed call affects only the segment in flight; the engine must be
///   usable again for the next call.
pub trait SttEngine: Send + Sync {
    /// Transcribe `samples` and return the text transcript.
    fn transcribe(&self, samples: &[f32], sample_rate: u32) -> Result<String, SttError>;
}

// Compile-time assertion: Box<dyn SttEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SttEngine>) {}
};

// ---------------------------------------------------------------------------
// MockSttEngine  (test-only)
// ---------------------------------------------------------------------------

/// Scriptable test double.
///
/// Responses are served in order from a script; once the script is exhausted
/// the fallback response repeats.  An optional fixed delay per call lets
/// serialization tests measure the worker's one-at-a-time behavior, and a
/// call counter lets tests assert the engine was never invoked.
#[cfg(test)]
pub struct MockSttEngine {
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, SttError>>>,
    fallback: Result<String, SttError>,
    delay: Option<std::time::Duration>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockSttEngine {
    /// A mock that always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self::with_fallback(Ok(text.into()))
    }

    /// A mock that always returns `Err(error)`.
    pub fn err(error: SttError) -> Self {
        Self::with_fallback(Err(error))
    }

    /// A mock that serves `responses` in order, then falls back to an error.
    pub fn script(responses: Vec<Result<String, SttError>>) -> Self {
        let mut mock = Self::with_fallback(Err(SttError::Transcription("script exhausted".into())));
        *mock.script.get_mut().unwrap() = responses.into();
        mock
    }

    /// Sleep for `delay` inside every `transcribe` call.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `transcribe` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn with_fallback(fallback: Result<String, SttError>) -> Self {
        Self {
            script: std::sync::Mutex::new(std::collections::VecDeque::new()),
            fallback,
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
impl SttEngine for MockSttEngine {
    fn transcribe(&self, _samples: &[f32], _sample_rate: u32) -> Result<String, SttError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ok_returns_configured_text() {
        let engine = MockSttEngine::ok("turn left");
        assert_eq!(engine.transcribe(&[0.0; 16], 16_000).unwrap(), "turn left");
        assert_eq!(engine.calls(), 1);
    }

    #[test]
    fn mock_err_returns_configured_error() {
        let engine = MockSttEngine::err(SttError::Transcription("boom".into()));
        let err = engine.transcribe(&[0.0; 16], 16_000).unwrap_err();
        assert!(matches!(err, SttError::Transcription(_)));
    }

    #[test]
    fn mock_script_serves_responses_in_order() {
        let engine = MockSttEngine::script(vec![
            Ok("one".into()),
            Err(SttError::Transcription("bad".into())),
            Ok("three".into()),
        ]);

        assert_eq!(engine.transcribe(&[], 16_000).unwrap(), "one");
        assert!(engine.transcribe(&[], 16_000).is_err());
        assert_eq!(engine.transcribe(&[], 16_000).unwrap(), "three");
        assert_eq!(engine.calls(), 3);
    }

    #[test]
    fn box_dyn_stt_engine_compiles() {
        // If this test compiles, the trait is object-safe.
        let engine: Box<dyn SttEngine> = Box::new(MockSttEngine::ok("ok"));
        let _ = engine.transcribe(&[0.0; 16], 16_000);
    }

    #[test]
    fn stt_error_display_mentions_the_cause() {
        let e = SttError::ModelNotFound("/some/path.bin".into());
        assert!(e.to_string().contains("/some/path.bin"));

        let e = SttError::UnsupportedSampleRate(44_100);
        assert!(e.to_string().contains("44100"));
    }
}
