//! Structured outcome of a verification run, handed to the reporter

use chrono::{DateTime, Utc};
use keyprobe_core::{FailureKind, FormatCheck, FormatWarning, ProbeError, ProbeKind, ProbeResult};
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;

use crate::types::{ChatReply, SpeechAudio};

/// Result of one probe plus how long the exchange took
#[derive(Debug)]
pub struct ProbeReport<T> {
    pub result: ProbeResult<T>,
    pub elapsed: Duration,
}

impl<T> ProbeReport<T> {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&ProbeError> {
        self.result.as_ref().err()
    }
}

impl<T: Display> ProbeReport<T> {
    pub fn summary(&self, probe: ProbeKind) -> ProbeSummary {
        let (detail, failure) = match &self.result {
            Ok(value) => (value.to_string(), None),
            Err(e) => (e.to_string(), Some(e.kind())),
        };
        ProbeSummary {
            probe,
            passed: failure.is_none(),
            failure,
            status: self.error().and_then(ProbeError::status),
            detail,
            elapsed_ms: u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Everything one run produced. Immutable once built.
#[derive(Debug)]
pub struct VerificationReport {
    pub checked_at: DateTime<Utc>,
    pub format: FormatCheck,
    pub chat: ProbeReport<ChatReply>,
    pub speech: ProbeReport<SpeechAudio>,
}

impl VerificationReport {
    pub fn all_passed(&self) -> bool {
        self.chat.passed() && self.speech.passed()
    }

    /// Failed probes in execution order
    pub fn failures(&self) -> impl Iterator<Item = (ProbeKind, &ProbeError)> {
        [
            (ProbeKind::Chat, self.chat.error()),
            (ProbeKind::Speech, self.speech.error()),
        ]
        .into_iter()
        .filter_map(|(kind, err)| err.map(|e| (kind, e)))
    }

    /// Flat, serializable view of the run
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            checked_at: self.checked_at,
            format: self.format,
            warnings: self.format.warnings(),
            probes: vec![
                self.chat.summary(ProbeKind::Chat),
                self.speech.summary(ProbeKind::Speech),
            ],
            all_passed: self.all_passed(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeSummary {
    pub probe: ProbeKind,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub detail: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub checked_at: DateTime<Utc>,
    pub format: FormatCheck,
    pub warnings: Vec<FormatWarning>,
    pub probes: Vec<ProbeSummary>,
    pub all_passed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(chat: ProbeResult<ChatReply>, speech: ProbeResult<SpeechAudio>) -> VerificationReport {
        VerificationReport {
            checked_at: Utc::now(),
            format: FormatCheck::of("sk-short"),
            chat: ProbeReport {
                result: chat,
                elapsed: Duration::from_millis(120),
            },
            speech: ProbeReport {
                result: speech,
                elapsed: Duration::from_millis(340),
            },
        }
    }

    #[test]
    fn test_one_failure_does_not_hide_the_other() {
        let report = report(
            Err(ProbeError::protocol(401, "invalid key")),
            Ok(SpeechAudio {
                byte_len: 4096,
                content_type: None,
            }),
        );

        assert!(!report.all_passed());
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, ProbeKind::Chat);
        assert_eq!(failures[0].1.status(), Some(401));
    }

    #[test]
    fn test_pass_state_needs_no_display() {
        struct Opaque;

        let report = ProbeReport {
            result: Ok::<_, ProbeError>(Opaque),
            elapsed: Duration::from_millis(5),
        };
        assert!(report.passed());
        assert!(report.error().is_none());
    }

    #[test]
    fn test_elapsed_saturates_instead_of_truncating() {
        let report = ProbeReport {
            result: Ok::<_, ProbeError>(SpeechAudio {
                byte_len: 1,
                content_type: None,
            }),
            elapsed: Duration::MAX,
        };
        assert_eq!(report.summary(ProbeKind::Speech).elapsed_ms, u64::MAX);
    }

    #[test]
    fn test_summary_serializes() {
        let report = report(
            Ok(ChatReply {
                text: "OK".to_string(),
                model: None,
            }),
            Err(ProbeError::semantic("no data received")),
        );

        let value = serde_json::to_value(report.summary()).unwrap();
        assert_eq!(value["all_passed"], false);
        assert_eq!(value["format"]["length"], 8);
        assert_eq!(value["warnings"][0]["warning"], "too_short");
        assert_eq!(value["probes"][0]["probe"], "chat");
        assert_eq!(value["probes"][0]["passed"], true);
        assert!(value["probes"][0].get("failure").is_none());
        assert_eq!(value["probes"][1]["failure"], "semantic");
        assert_eq!(value["probes"][1]["elapsed_ms"], 340);
    }
}
