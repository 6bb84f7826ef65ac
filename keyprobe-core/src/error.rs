//! Error taxonomy for credential probes

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad class of a probe failure, used by reporters and exit-status policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Credential absent/empty or the verifier could not be set up
    Configuration,
    /// Connection, DNS or timeout failure
    Transport,
    /// Upstream answered with a non-200 status
    Protocol,
    /// Response body was not the expected JSON
    Decoding,
    /// Well-formed success that carried nothing usable
    Semantic,
    /// The run was interrupted by the caller
    Cancelled,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Configuration => "configuration error",
            FailureKind::Transport => "transport error",
            FailureKind::Protocol => "protocol error",
            FailureKind::Decoding => "decoding error",
            FailureKind::Semantic => "semantic error",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure of a single probe (or of the run before any probe started)
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    #[error("API error (status {status}): {body}")]
    Protocol { status: u16, body: String },

    #[error("Parse error: {0}")]
    Decoding(String),

    #[error("Empty response: {0}")]
    Semantic(String),

    #[error("Cancelled before the probe completed")]
    Cancelled,
}

impl ProbeError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        ProbeError::Configuration(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        ProbeError::Transport(msg.into())
    }

    pub fn timeout(after: Duration) -> Self {
        ProbeError::Timeout { after }
    }

    pub fn protocol(status: u16, body: impl Into<String>) -> Self {
        ProbeError::Protocol {
            status,
            body: body.into(),
        }
    }

    pub fn decoding(msg: impl Into<String>) -> Self {
        ProbeError::Decoding(msg.into())
    }

    pub fn semantic(msg: impl Into<String>) -> Self {
        ProbeError::Semantic(msg.into())
    }

    /// Taxonomy class of this error. Timeouts are transport failures.
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Configuration(_) => FailureKind::Configuration,
            ProbeError::Transport(_) | ProbeError::Timeout { .. } => FailureKind::Transport,
            ProbeError::Protocol { .. } => FailureKind::Protocol,
            ProbeError::Decoding(_) => FailureKind::Decoding,
            ProbeError::Semantic(_) => FailureKind::Semantic,
            ProbeError::Cancelled => FailureKind::Cancelled,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout { .. })
    }

    /// HTTP status carried by a protocol failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ProbeError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_transport_kind() {
        let err = ProbeError::timeout(Duration::from_secs(10));
        assert_eq!(err.kind(), FailureKind::Transport);
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Request timed out after 10s");
    }

    #[test]
    fn test_protocol_error_keeps_status_and_body() {
        let err = ProbeError::protocol(429, r#"{"error":"rate limited"}"#);
        assert_eq!(err.kind(), FailureKind::Protocol);
        assert_eq!(err.status(), Some(429));
        assert_eq!(
            err.to_string(),
            r#"API error (status 429): {"error":"rate limited"}"#
        );
    }

    #[test]
    fn test_kinds_are_distinct() {
        assert_eq!(ProbeError::decoding("bad json").kind(), FailureKind::Decoding);
        assert_eq!(ProbeError::semantic("no choices").kind(), FailureKind::Semantic);
        assert_eq!(ProbeError::transport("refused").kind(), FailureKind::Transport);
        assert_eq!(
            ProbeError::configuration("missing").kind(),
            FailureKind::Configuration
        );
        assert_eq!(ProbeError::Cancelled.kind(), FailureKind::Cancelled);
        assert_eq!(ProbeError::semantic("x").status(), None);
    }

    #[test]
    fn test_failure_kind_serializes_lowercase() {
        let json = serde_json::to_string(&FailureKind::Semantic).unwrap();
        assert_eq!(json, r#""semantic""#);
    }
}
