//! Core types for keyprobe
//!
//! Shared by the verifier and the command-line front end: the credential
//! being checked, its advisory format check, and the failure taxonomy every
//! probe reports through.

pub mod credential;
pub mod error;
pub mod probe;

pub use credential::{Credential, FormatCheck, FormatWarning, EXPECTED_PREFIX, MIN_EXPECTED_LENGTH};
pub use error::{FailureKind, ProbeError, ProbeResult};
pub use probe::ProbeKind;
