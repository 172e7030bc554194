//! Application entry point — push-to-talk voice-command pipeline.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the tokio runtime (multi-thread, 2 workers).
//! 4. Per [`RunMode`], wire channels → recorder task → transcription worker
//!    thread → dispatch loop (or pipe relay), start the capture stream and
//!    the hotkey listener, then block on the mode's terminal loop until
//!    ctrl-c.
//!
//! The cpal stream handle is `!Send`, so capture is started on the main
//! thread and kept alive there; everything async runs inside `block_on`.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use voicepipe::audio::{AudioCapture, AudioChunk, ChunkSender, StreamHandle};
use voicepipe::bridge::{result_bridge, ResultReceiver};
use voicepipe::config::{AppConfig, AppPaths, RunMode};
use voicepipe::dispatch::{AgentClient, CommandProcessor, DispatchLoop};
use voicepipe::hotkey::{parse_key, HotkeyEvent, HotkeyListener};
use voicepipe::queue::segment_queue;
use voicepipe::recorder::{Recorder, RecorderRunner};
use voicepipe::stt::{SttEngine, SttError, TranscribeParams, TranscriptionWorker, WhisperEngine};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voicepipe starting up");

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 2 workers: the recorder task and the dispatch loop are both light.
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    match config.run_mode {
        RunMode::Direct => run_direct(&rt, config),
        RunMode::PipeProducer => run_pipe_producer(&rt, config),
        RunMode::PipeConsumer => run_pipe_consumer(&rt, config),
    }
}

// ---------------------------------------------------------------------------
// Capture front end (Direct and PipeProducer modes)
// ---------------------------------------------------------------------------

/// Everything upstream of the result bridge: capture, recorder, worker.
///
/// Holds the RAII handles; dropping this tears the front end down.
struct FrontEnd {
    results: ResultReceiver,
    _worker: TranscriptionWorker,
    _listener: HotkeyListener,
    _stream: Option<StreamHandle>,
}

/// Wire key events → recorder → segment queue → worker → bridge, start the
/// capture stream and the hotkey listener.
fn start_front_end(rt: &tokio::runtime::Runtime, config: &AppConfig) -> FrontEnd {
    let (key_tx, key_rx) = mpsc::channel::<HotkeyEvent>(16);
    let (chunk_tx, chunk_rx) =
        mpsc::channel::<AudioChunk>(config.audio.chunk_channel_capacity.max(1));
    let (queue, consumer) = segment_queue();
    let (bridge, results) = result_bridge();

    let sender = ChunkSender::new(chunk_tx, config.audio.sample_rate, config.audio.channels);
    let dropped = sender.drop_counter();

    let recorder = Recorder::new(
        config.audio.sample_rate,
        config.audio.channels,
        config.audio.max_recording_secs,
    );
    rt.spawn(RecorderRunner::new(recorder, key_rx, chunk_rx, dropped, queue).run());

    let worker = TranscriptionWorker::spawn(load_engine(config), consumer, bridge);

    // Degrade gracefully without a microphone: the pipeline still runs, it
    // just never sees a chunk.
    let stream = match AudioCapture::new(config.audio.sample_rate, config.audio.channels) {
        Ok(capture) => match capture.start(sender) {
            Ok(handle) => {
                log::info!(
                    "audio capture started ({} Hz, {} ch)",
                    config.audio.sample_rate,
                    config.audio.channels
                );
                Some(handle)
            }
            Err(e) => {
                log::warn!("failed to start audio stream: {e}");
                None
            }
        },
        Err(e) => {
            log::warn!("audio capture unavailable: {e}");
            None
        }
    };

    let key = parse_key(&config.hotkey.push_to_talk_key).unwrap_or_else(|| {
        log::warn!(
            "unknown push-to-talk key {:?}, falling back to Space",
            config.hotkey.push_to_talk_key
        );
        rdev::Key::Space
    });
    let listener = HotkeyListener::start(key, key_tx);
    log::info!(
        "hold [{}] to speak a command; release to transcribe",
        config.hotkey.push_to_talk_key
    );

    FrontEnd {
        results,
        _worker: worker,
        _listener: listener,
        _stream: stream,
    }
}

/// Load the Whisper model, or fall back to a stub engine so the process
/// still starts (and logs a useful error per segment) without a model file.
fn load_engine(config: &AppConfig) -> Arc<dyn SttEngine> {
    let model_path = AppPaths::new()
        .models_dir
        .join(format!("{}.bin", config.stt.model));

    let params = TranscribeParams {
        language: config.stt.language.clone(),
        ..TranscribeParams::default()
    };

    match WhisperEngine::load(&model_path, params) {
        Ok(engine) => {
            log::info!("whisper model loaded: {}", model_path.display());
            Arc::new(engine)
        }
        Err(e) => {
            log::warn!(
                "could not load whisper model ({}): {e}; transcription will fail until a model is installed",
                model_path.display()
            );
            Arc::new(NoModelStt {
                path: model_path.display().to_string(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Run modes
// ---------------------------------------------------------------------------

fn run_direct(rt: &tokio::runtime::Runtime, config: AppConfig) -> anyhow::Result<()> {
    let front = start_front_end(rt, &config);

    let processor: Arc<dyn CommandProcessor> = Arc::new(AgentClient::from_config(&config.agent));
    let dispatch = DispatchLoop::new(processor);
    log::info!("agent ready, dispatching to {}", config.agent.base_url);

    rt.block_on(async {
        tokio::select! {
            _ = dispatch.run(front.results) => {}
            _ = tokio::signal::ctrl_c() => log::info!("ctrl-c received, shutting down"),
        }
    });
    Ok(())
}

#[cfg(unix)]
fn run_pipe_producer(rt: &tokio::runtime::Runtime, config: AppConfig) -> anyhow::Result<()> {
    use voicepipe::relay::{forward_results, PipeRelay};

    let relay = Arc::new(
        PipeRelay::create(&config.relay.pipe_path)
            .with_context(|| format!("creating relay pipe {}", config.relay.pipe_path))?,
    );
    let front = start_front_end(rt, &config);
    log::info!("forwarding transcripts into {}", config.relay.pipe_path);

    rt.block_on(async {
        tokio::select! {
            _ = forward_results(front.results, relay) => {}
            _ = tokio::signal::ctrl_c() => log::info!("ctrl-c received, shutting down"),
        }
    });
    Ok(())
}

#[cfg(unix)]
fn run_pipe_consumer(rt: &tokio::runtime::Runtime, config: AppConfig) -> anyhow::Result<()> {
    use voicepipe::relay::{PipeRelay, PipeReader};

    // Create the FIFO if it is missing so either side can start first.
    let relay = PipeRelay::create(&config.relay.pipe_path)
        .with_context(|| format!("creating relay pipe {}", config.relay.pipe_path))?;

    let (bridge, results) = result_bridge();
    let _reader = PipeReader::spawn(relay.path(), bridge);

    let processor: Arc<dyn CommandProcessor> = Arc::new(AgentClient::from_config(&config.agent));
    let dispatch = DispatchLoop::new(processor);
    log::info!(
        "agent ready, waiting for records on {}",
        config.relay.pipe_path
    );

    rt.block_on(async {
        tokio::select! {
            _ = dispatch.run(results) => {}
            _ = tokio::signal::ctrl_c() => log::info!("ctrl-c received, shutting down"),
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn run_pipe_producer(_rt: &tokio::runtime::Runtime, _config: AppConfig) -> anyhow::Result<()> {
    anyhow::bail!("pipe modes require unix named pipes")
}

#[cfg(not(unix))]
fn run_pipe_consumer(_rt: &tokio::runtime::Runtime, _config: AppConfig) -> anyhow::Result<()> {
    anyhow::bail!("pipe modes require unix named pipes")
}

// ---------------------------------------------------------------------------
// NoModelStt — fallback SttEngine when the model file is not present
// ---------------------------------------------------------------------------

struct NoModelStt {
    path: String,
}

impl SttEngine for NoModelStt {
    fn transcribe(&self, _samples: &[f32], _sample_rate: u32) -> Result<String, SttError> {
        Err(SttError::ModelNotFound(self.path.clone()))
    }
}
