//! Credential verification against the upstream speech/chat API
//!
//! Given a [`Credential`](keyprobe_core::Credential), [`CredentialVerifier`]
//! checks its format and then exercises two independent capabilities:
//! a minimal chat completion and a short text-to-speech request.

pub mod config;
pub mod report;
pub mod types;
pub mod verifier;

pub use config::{ChatProbeConfig, ConfigError, SpeechProbeConfig, VerifierConfig};
pub use report::{ProbeReport, ProbeSummary, ReportSummary, VerificationReport};
pub use types::{ChatReply, SpeechAudio};
pub use verifier::CredentialVerifier;
