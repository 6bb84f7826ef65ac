//! Probe configuration records
//!
//! The upstream payloads are fixed per probe kind, but every knob lives here
//! so tests (and operators) can point the verifier at another endpoint or
//! model without touching the probe logic.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default upstream API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Wall-clock bound applied to each probe
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const SPEECH_PATH: &str = "/audio/speech";

/// Chat-completion probe payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatProbeConfig {
    pub model: String,
    pub system_prompt: String,
    /// Short message designed to elicit a minimal, predictable reply
    pub user_prompt: String,
    pub max_tokens: u32,
}

impl Default for ChatProbeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            system_prompt: "You are a connectivity check. Answer with the single word OK."
                .to_string(),
            user_prompt: "Reply with OK.".to_string(),
            max_tokens: 5,
        }
    }
}

/// Text-to-speech probe payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechProbeConfig {
    pub model: String,
    pub input: String,
    pub voice: String,
    /// Output encoding requested from the API ("pcm" is raw 16-bit mono)
    pub response_format: String,
    pub speed: f32,
    /// Sample rate of the PCM stream, used to estimate audio duration
    pub sample_rate_hz: u32,
}

impl Default for SpeechProbeConfig {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            input: "Connection test.".to_string(),
            voice: "alloy".to_string(),
            response_format: "pcm".to_string(),
            speed: 1.0,
            sample_rate_hz: 24_000,
        }
    }
}

impl SpeechProbeConfig {
    pub fn is_pcm(&self) -> bool {
        self.response_format.eq_ignore_ascii_case("pcm")
    }
}

/// Everything the verifier needs besides the credential itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub base_url: String,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Run both probes at the same time instead of one after the other
    #[serde(default)]
    pub concurrent: bool,
    #[serde(default)]
    pub chat: ChatProbeConfig,
    #[serde(default)]
    pub speech: SpeechProbeConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrent: false,
            chat: ChatProbeConfig::default(),
            speech: SpeechProbeConfig::default(),
        }
    }
}

impl VerifierConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn with_chat(mut self, chat: ChatProbeConfig) -> Self {
        self.chat = chat;
        self
    }

    pub fn with_speech(mut self, speech: SpeechProbeConfig) -> Self {
        self.speech = speech;
        self
    }

    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), CHAT_COMPLETIONS_PATH)
    }

    pub fn speech_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), SPEECH_PATH)
    }

    /// Load defaults overridden by `KEYPROBE_*` environment variables
    ///
    /// Recognised:
    /// - KEYPROBE_BASE_URL
    /// - KEYPROBE_TIMEOUT_SECS (positive, fractional allowed)
    /// - KEYPROBE_CONCURRENT (1/0, true/false, yes/no)
    /// - KEYPROBE_CHAT_MODEL, KEYPROBE_TTS_MODEL, KEYPROBE_TTS_VOICE
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`VerifierConfig::from_env`] with an arbitrary variable source.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(base_url) = get("KEYPROBE_BASE_URL") {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::invalid(
                    "KEYPROBE_BASE_URL",
                    &base_url,
                    "expected an http:// or https:// URL",
                ));
            }
            config.base_url = base_url;
        }

        if let Some(raw) = get("KEYPROBE_TIMEOUT_SECS") {
            let secs: f64 = raw.parse().map_err(|_| {
                ConfigError::invalid("KEYPROBE_TIMEOUT_SECS", &raw, "expected a number of seconds")
            })?;
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::invalid(
                    "KEYPROBE_TIMEOUT_SECS",
                    &raw,
                    "timeout must be positive",
                ));
            }
            config.timeout = Duration::from_secs_f64(secs);
        }

        if let Some(raw) = get("KEYPROBE_CONCURRENT") {
            config.concurrent = parse_flag(&raw)
                .ok_or_else(|| ConfigError::invalid("KEYPROBE_CONCURRENT", &raw, "expected a boolean"))?;
        }

        if let Some(model) = get("KEYPROBE_CHAT_MODEL") {
            config.chat.model = model;
        }
        if let Some(model) = get("KEYPROBE_TTS_MODEL") {
            config.speech.model = model;
        }
        if let Some(voice) = get("KEYPROBE_TTS_VOICE") {
            config.speech.voice = voice;
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(var: &str, value: &str, reason: &str) -> Self {
        ConfigError::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
