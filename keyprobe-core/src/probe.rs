//! Probe identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream capability exercised by a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Chat completion round-trip
    Chat,
    /// Text-to-speech round-trip
    Speech,
}

impl ProbeKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProbeKind::Chat => "chat completion",
            ProbeKind::Speech => "speech synthesis",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" | "completion" => Ok(ProbeKind::Chat),
            "speech" | "tts" => Ok(ProbeKind::Speech),
            _ => Err(format!("Unknown probe: {}", s)),
        }
    }
}
