//! API credential and its advisory format check

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;

/// Prefix conventionally carried by well-formed keys
pub const EXPECTED_PREFIX: &str = "sk-";

/// Keys shorter than this are reported as suspiciously short
pub const MIN_EXPECTED_LENGTH: usize = 20;

/// Secret token used as a bearer credential against the upstream API.
///
/// The empty credential is representable and means "not configured";
/// the verifier refuses to probe with it.
pub struct Credential {
    secret: SecretString,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(token.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.secret.expose_secret().is_empty()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.secret.expose_secret().chars().count()
    }

    /// Raw token, for building the Authorization header only
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    /// Display-safe rendering: `sk-abcd...wxyz`
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.expose().chars().collect();
        match chars.len() {
            0 => "<empty>".to_string(),
            n if n > 12 => {
                let head: String = chars[..7].iter().collect();
                let tail: String = chars[n - 4..].iter().collect();
                format!("{}...{}", head, tail)
            }
            _ => "***".to_string(),
        }
    }

    pub fn format_check(&self) -> FormatCheck {
        FormatCheck::of(self.expose())
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("masked", &self.masked())
            .finish()
    }
}

/// Result of the advisory format check. Never gates the probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatCheck {
    pub is_empty: bool,
    pub has_expected_prefix: bool,
    pub length: usize,
}

impl FormatCheck {
    pub fn of(token: &str) -> Self {
        Self {
            is_empty: token.is_empty(),
            has_expected_prefix: token.starts_with(EXPECTED_PREFIX),
            length: token.chars().count(),
        }
    }

    pub fn is_too_short(&self) -> bool {
        self.length < MIN_EXPECTED_LENGTH
    }

    /// Warnings in display order
    pub fn warnings(&self) -> Vec<FormatWarning> {
        let mut warnings = Vec::new();
        if self.is_empty {
            warnings.push(FormatWarning::Empty);
        }
        if self.is_too_short() {
            warnings.push(FormatWarning::TooShort {
                length: self.length,
            });
        }
        if !self.has_expected_prefix {
            warnings.push(FormatWarning::UnexpectedPrefix);
        }
        warnings
    }

    pub fn looks_valid(&self) -> bool {
        self.warnings().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum FormatWarning {
    Empty,
    TooShort { length: usize },
    UnexpectedPrefix,
}

impl fmt::Display for FormatWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatWarning::Empty => write!(f, "key is empty"),
            FormatWarning::TooShort { length } => write!(
                f,
                "key is too short ({} chars, expected at least {})",
                length, MIN_EXPECTED_LENGTH
            ),
            FormatWarning::UnexpectedPrefix => {
                write!(f, "key does not start with '{}'", EXPECTED_PREFIX)
            }
        }
    }
}
