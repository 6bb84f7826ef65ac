//! Console reporter

use std::path::PathBuf;
use std::time::Duration;

use keyprobe_core::{Credential, ProbeError, ProbeKind};
use keyprobe_verifier::{ProbeReport, VerificationReport, VerifierConfig};

use crate::settings::{SettingSource, API_KEY_VAR};

const RULE_WIDTH: usize = 50;

/// How the report is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "human" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

pub fn print_header(credential: &Credential, source: Option<&SettingSource>, config: &VerifierConfig) {
    println!("🔑 API key check");
    println!("{}", "=".repeat(RULE_WIDTH));
    match source {
        Some(source) => println!("Key:      {} (from {})", credential.masked(), source),
        None => println!("Key:      {}", credential.masked()),
    }
    println!("Endpoint: {}", config.base_url);
    println!("Timeout:  {}s", config.timeout.as_secs_f64());
    println!();
}

pub fn print_missing_credential(searched: &[PathBuf]) {
    println!("❌ {} is not set", API_KEY_VAR);
    println!("   Looked in the process environment and:");
    for path in searched {
        println!("     - {}", path.display());
    }
    println!("   Set {} or add it to one of those files.", API_KEY_VAR);
}

pub fn print_report(report: &VerificationReport, config: &VerifierConfig) {
    println!("Format");
    println!("{}", "-".repeat(RULE_WIDTH));
    let warnings = report.format.warnings();
    if warnings.is_empty() {
        println!("✅ looks valid ({} chars)", report.format.length);
    } else {
        for warning in &warnings {
            println!("⚠️  {}", warning);
        }
        println!("   (advisory only, probes still run)");
    }
    println!();

    print_probe(ProbeKind::Chat, &report.chat, &config.chat.model, |reply| {
        reply.to_string()
    });
    print_probe(ProbeKind::Speech, &report.speech, &config.speech.model, |audio| {
        if config.speech.is_pcm() {
            format!(
                "{} (~{:.1}s at {} Hz)",
                audio,
                audio.estimated_duration(config.speech.sample_rate_hz).as_secs_f64(),
                config.speech.sample_rate_hz
            )
        } else {
            audio.to_string()
        }
    });

    let failed = report.failures().count();
    println!("{}", "=".repeat(RULE_WIDTH));
    if failed == 0 {
        println!("✅ All probes passed");
    } else {
        println!("❌ {} of 2 probes failed", failed);
    }
}

fn print_probe<T>(kind: ProbeKind, report: &ProbeReport<T>, model: &str, describe: impl Fn(&T) -> String) {
    println!("{} ({})", capitalize(kind.display_name()), model);
    println!("{}", "-".repeat(RULE_WIDTH));
    match &report.result {
        Ok(value) => println!("✅ {} in {}", describe(value), format_elapsed(report.elapsed)),
        Err(e) => {
            println!("❌ {} after {}", e.kind(), format_elapsed(report.elapsed));
            println!("   {}", e);
            if let Some(hint) = hint(e) {
                println!("   {}", hint);
            }
        }
    }
    println!();
}

pub fn print_json(report: &VerificationReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&report.summary())?);
    Ok(())
}

/// JSON rendering of a run that produced no report
pub fn print_json_error(e: &ProbeError) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&error_json(e))?);
    Ok(())
}

fn error_json(e: &ProbeError) -> serde_json::Value {
    serde_json::json!({
        "all_passed": false,
        "error": {
            "kind": e.kind(),
            "detail": e.to_string(),
        }
    })
}

pub fn print_cancelled() {
    println!();
    println!("⚠️  Cancelled, no result");
}

fn hint(e: &ProbeError) -> Option<&'static str> {
    match e {
        ProbeError::Protocol { status: 401, .. } => Some("The key was rejected; check it has not been revoked."),
        ProbeError::Protocol { status: 403, .. } => Some("The key lacks access to this model or endpoint."),
        ProbeError::Protocol { status: 429, .. } => Some("Rate limited or out of quota."),
        ProbeError::Timeout { .. } => Some("Raise KEYPROBE_TIMEOUT_SECS if the network is slow."),
        _ => None,
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
