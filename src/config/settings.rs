//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// RunMode
// ---------------------------------------------------------------------------

/// Selects which deployment variant this process runs.
///
/// | Variant      | Pipeline                                             |
/// |--------------|------------------------------------------------------|
/// | Direct       | capture → STT → dispatch loop, all in-process        |
/// | PipeProducer | capture → STT → named pipe (no dispatch)             |
/// | PipeConsumer | named pipe → dispatch loop (no capture, no STT)      |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunMode {
    /// Everything in one process.
    Direct,
    /// Transcribe and forward text into the named pipe.
    PipeProducer,
    /// Read text records from the named pipe and dispatch them.
    PipeConsumer,
}

impl Default for RunMode {
    fn default() -> Self {
        Self::Direct
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for audio capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Capture sample rate in Hz (must be 16 000 — the engine's fixed rate).
    pub sample_rate: u32,
    /// Capture channel count (must be 1).
    pub channels: u16,
    /// Expected maximum recording length in seconds; used as the capture
    /// buffer preallocation hint, not a hard cap.
    pub max_recording_secs: f32,
    /// Capacity of the bounded callback → recorder chunk channel.  A full
    /// channel drops chunks (counted and reported at finalize time).
    pub chunk_channel_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            max_recording_secs: 60.0,
            chunk_channel_capacity: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Push-to-talk key binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Trigger key name (e.g. `"Space"`, `"F9"`); parsed by
    /// [`crate::hotkey::parse_key`].
    pub push_to_talk_key: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            push_to_talk_key: "Space".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper STT engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// GGML model file stem under the models dir (e.g. `"ggml-base"`).
    pub model: String,
    /// Primary speech language as an ISO-639-1 code, or `"auto"` for
    /// Whisper's built-in language detection.
    pub language: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "ggml-base".into(),
            language: "auto".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AgentConfig
// ---------------------------------------------------------------------------

/// Settings for the downstream command processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of an OpenAI-compatible API endpoint.
    pub base_url: String,
    /// API key — `None` or empty for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// System message sent with every command.
    pub instructions: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a reply before timing out.
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            instructions: "Use the tools to execute the command, then provide a summary \
                           of all the steps you took."
                .into(),
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// RelayConfig
// ---------------------------------------------------------------------------

/// Settings for the named-pipe relay (pipe modes only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Filesystem path of the FIFO shared between producer and consumer.
    pub pipe_path: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            pipe_path: "/tmp/agent_pipe".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voicepipe::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Selected deployment variant.
    pub run_mode: RunMode,
    /// Audio capture settings.
    pub audio: AudioConfig,
    /// Push-to-talk binding.
    pub hotkey: HotkeyConfig,
    /// STT engine settings.
    pub stt: SttConfig,
    /// Command processor settings.
    pub agent: AgentConfig,
    /// Named-pipe relay settings.
    pub relay: RelayConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// A default `AppConfig` must survive a TOML round trip without loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.run_mode, loaded.run_mode);
        assert_eq!(original.audio.sample_rate, loaded.audio.sample_rate);
        assert_eq!(original.audio.channels, loaded.audio.channels);
        assert_eq!(
            original.audio.chunk_channel_capacity,
            loaded.audio.chunk_channel_capacity
        );
        assert_eq!(
            original.hotkey.push_to_talk_key,
            loaded.hotkey.push_to_talk_key
        );
        assert_eq!(original.stt.model, loaded.stt.model);
        assert_eq!(original.stt.language, loaded.stt.language);
        assert_eq!(original.agent.base_url, loaded.agent.base_url);
        assert_eq!(original.agent.api_key, loaded.agent.api_key);
        assert_eq!(original.agent.instructions, loaded.agent.instructions);
        assert_eq!(original.agent.timeout_secs, loaded.agent.timeout_secs);
        assert_eq!(original.relay.pipe_path, loaded.relay.pipe_path);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.run_mode, default.run_mode);
        assert_eq!(config.audio.sample_rate, default.audio.sample_rate);
        assert_eq!(
            config.hotkey.push_to_talk_key,
            default.hotkey.push_to_talk_key
        );
    }

    #[test]
    fn default_values_match_the_fixed_capture_format() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.run_mode, RunMode::Direct);
        assert_eq!(cfg.audio.sample_rate, 16_000);
        assert_eq!(cfg.audio.channels, 1);
        assert_eq!(cfg.hotkey.push_to_talk_key, "Space");
        assert_eq!(cfg.stt.model, "ggml-base");
        assert_eq!(cfg.stt.language, "auto");
        assert_eq!(cfg.relay.pipe_path, "/tmp/agent_pipe");
        assert!(cfg.agent.api_key.is_none());
    }

    /// Modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.run_mode = RunMode::PipeProducer;
        cfg.hotkey.push_to_talk_key = "F9".into();
        cfg.stt.language = "en".into();
        cfg.agent.base_url = "http://localhost:11434".into();
        cfg.agent.api_key = Some("sk-test".into());
        cfg.relay.pipe_path = "/tmp/other_pipe".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.run_mode, RunMode::PipeProducer);
        assert_eq!(loaded.hotkey.push_to_talk_key, "F9");
        assert_eq!(loaded.stt.language, "en");
        assert_eq!(loaded.agent.base_url, "http://localhost:11434");
        assert_eq!(loaded.agent.api_key, Some("sk-test".into()));
        assert_eq!(loaded.relay.pipe_path, "/tmp/other_pipe");
    }
}
