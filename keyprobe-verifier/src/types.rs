//! Wire types for the two upstream calls and the values a passing probe yields

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::{ChatProbeConfig, SpeechProbeConfig};

// ============================================================================
// Chat completion
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl From<&ChatProbeConfig> for ChatCompletionRequest {
    fn from(config: &ChatProbeConfig) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![
                ChatMessage::system(&config.system_prompt),
                ChatMessage::user(&config.user_prompt),
            ],
            max_tokens: config.max_tokens,
        }
    }
}

/// Only the fields the probe reads; everything else is ignored.
/// A missing or null `choices` decodes as an empty list.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub choices: Vec<ChatChoice>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Successful chat probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    /// Content of the first choice
    pub text: String,
    /// Model the server reports having used
    pub model: Option<String>,
}

impl fmt::Display for ChatReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reply {:?}", self.text.trim())?;
        if let Some(model) = &self.model {
            write!(f, " from {}", model)?;
        }
        Ok(())
    }
}

// ============================================================================
// Speech synthesis
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub input: String,
    pub voice: String,
    pub response_format: String,
    pub speed: f32,
}

impl From<&SpeechProbeConfig> for SpeechRequest {
    fn from(config: &SpeechProbeConfig) -> Self {
        Self {
            model: config.model.clone(),
            input: config.input.clone(),
            voice: config.voice.clone(),
            response_format: config.response_format.clone(),
            speed: config.speed,
        }
    }
}

/// Successful speech probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechAudio {
    /// Size of the returned audio payload
    pub byte_len: usize,
    pub content_type: Option<String>,
}

impl SpeechAudio {
    /// Playback length assuming 16-bit mono PCM at `sample_rate_hz`
    pub fn estimated_duration(&self, sample_rate_hz: u32) -> Duration {
        if sample_rate_hz == 0 {
            return Duration::ZERO;
        }
        let bytes_per_second = f64::from(sample_rate_hz) * 2.0;
        Duration::from_secs_f64(self.byte_len as f64 / bytes_per_second)
    }
}

impl fmt::Display for SpeechAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes of audio", self.byte_len)?;
        if let Some(content_type) = &self.content_type {
            write!(f, " ({})", content_type)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_wire_shape() {
        let request = ChatCompletionRequest::from(&ChatProbeConfig::default());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["max_tokens"], 5);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "Reply with OK.");
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_speech_request_wire_shape() {
        let request = SpeechRequest::from(&SpeechProbeConfig::default());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "model": "tts-1",
                "input": "Connection test.",
                "voice": "alloy",
                "response_format": "pcm",
                "speed": 1.0
            })
        );
    }

    #[test]
    fn test_chat_response_ignores_extra_fields() {
        let body = r#"{
            "id": "chatcmpl-123",
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "OK"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 1, "total_tokens": 21}
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.model.as_deref(), Some("gpt-4o-mini-2024-07-18"));
        assert_eq!(response.choices[0].message.content.as_deref(), Some("OK"));
    }

    #[test]
    fn test_chat_response_missing_or_null_choices_is_empty() {
        for body in [r#"{"id": "x"}"#, r#"{"choices": null}"#, r#"{"choices": []}"#] {
            let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
            assert!(response.choices.is_empty(), "{body}");
        }
    }

    #[test]
    fn test_chat_response_rejects_non_object_bodies() {
        assert!(serde_json::from_str::<ChatCompletionResponse>("[]").is_err());
        assert!(serde_json::from_str::<ChatCompletionResponse>(r#"{"choices": "OK"}"#).is_err());
    }

    #[test]
    fn test_pcm_duration_estimate() {
        let audio = SpeechAudio {
            byte_len: 48_000,
            content_type: None,
        };
        assert_eq!(audio.estimated_duration(24_000), Duration::from_secs(1));
        assert_eq!(audio.estimated_duration(0), Duration::ZERO);
    }

    #[test]
    fn test_display() {
        let reply = ChatReply {
            text: "OK\n".to_string(),
            model: Some("gpt-4o-mini".to_string()),
        };
        assert_eq!(reply.to_string(), r#"reply "OK" from gpt-4o-mini"#);

        let audio = SpeechAudio {
            byte_len: 4096,
            content_type: Some("audio/pcm".to_string()),
        };
        assert_eq!(audio.to_string(), "4096 bytes of audio (audio/pcm)");
    }
}
