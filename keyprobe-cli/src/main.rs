//! keyprobe
//!
//! Checks that the configured API key works end-to-end: a format check, one
//! chat completion and one speech synthesis call.
//!
//! Exit status: 0 all probes passed, 1 no key configured, 2 a probe failed,
//! 3 invalid configuration, 4 any other error, 130 interrupted.

mod output;
mod settings;

use std::process::ExitCode;

use anyhow::Context;
use keyprobe_core::{ProbeError, ProbeResult};
use keyprobe_verifier::{ConfigError, CredentialVerifier, VerificationReport, VerifierConfig};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::output::OutputFormat;
use crate::settings::Settings;

const EXIT_MISSING_KEY: u8 = 1;
const EXIT_PROBE_FAILED: u8 = 2;
const EXIT_BAD_CONFIG: u8 = 3;
const EXIT_ERROR: u8 = 4;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so the report on stdout stays readable (and parseable as JSON)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,keyprobe=info")),
        )
        .init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(failure_exit_code(&e))
        }
    }
}

async fn run() -> anyhow::Result<u8> {
    let settings = Settings::discover();

    let format = output_format(settings.lookup("KEYPROBE_OUTPUT"))?;
    let config = VerifierConfig::from_lookup(|name| settings.lookup(name))
        .context("Invalid keyprobe configuration")?;
    debug!("Verifier configuration: {:?}", config);

    let loaded = settings.credential();
    let outcome = match loaded.credential {
        Some(credential) => {
            if let Some(source) = &loaded.source {
                info!("Using API key from {}", source);
            }
            let verifier = CredentialVerifier::new(config).context("Failed to set up verifier")?;
            if format == OutputFormat::Text {
                output::print_header(&credential, loaded.source.as_ref(), verifier.config());
            }
            let outcome = verifier.verify_until(&credential, interrupted()).await;
            if let (Ok(report), OutputFormat::Text) = (&outcome, format) {
                output::print_report(report, verifier.config());
            }
            outcome
        }
        None => Err(ProbeError::configuration("API key is not configured")),
    };

    match (&outcome, format) {
        (Ok(report), OutputFormat::Json) => output::print_json(report)?,
        (Ok(_), OutputFormat::Text) => {}
        (Err(e), OutputFormat::Json) => output::print_json_error(e)?,
        (Err(ProbeError::Cancelled), OutputFormat::Text) => output::print_cancelled(),
        (Err(ProbeError::Configuration(_)), OutputFormat::Text) => {
            output::print_missing_credential(settings.searched())
        }
        (Err(e), OutputFormat::Text) => eprintln!("Error: {}", e),
    }

    Ok(exit_code(&outcome))
}

fn output_format(raw: Option<String>) -> Result<OutputFormat, ConfigError> {
    match raw {
        Some(raw) => raw
            .parse::<OutputFormat>()
            .map_err(|reason: String| ConfigError::invalid("KEYPROBE_OUTPUT", &raw, &reason)),
        None => Ok(OutputFormat::Text),
    }
}

/// Exit status for a finished (or abandoned) run
fn exit_code(outcome: &ProbeResult<VerificationReport>) -> u8 {
    match outcome {
        Ok(report) if report.all_passed() => 0,
        Ok(_) => EXIT_PROBE_FAILED,
        Err(ProbeError::Cancelled) => EXIT_INTERRUPTED,
        Err(ProbeError::Configuration(_)) => EXIT_MISSING_KEY,
        Err(_) => EXIT_ERROR,
    }
}

/// Exit status when the run could not produce an outcome at all
fn failure_exit_code(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<ConfigError>().is_some() {
        EXIT_BAD_CONFIG
    } else {
        EXIT_ERROR
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
