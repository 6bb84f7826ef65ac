//! Credential verifier
//!
//! Runs the advisory format check, then one chat-completion call and one
//! text-to-speech call against the upstream API. Every failure is recovered
//! at the probe boundary and classified; neither probe can stop the other.

use std::future::Future;
use std::time::Instant;

use chrono::Utc;
use keyprobe_core::{Credential, FormatCheck, ProbeError, ProbeResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use crate::config::VerifierConfig;
use crate::report::{ProbeReport, VerificationReport};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatReply, SpeechAudio, SpeechRequest};

/// Verifies that a credential can authenticate against both upstream probes
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    client: Client,
    config: VerifierConfig,
}

impl CredentialVerifier {
    /// Create a verifier. The HTTP client (and its timeout) is shared by both probes.
    pub fn new(config: VerifierConfig) -> ProbeResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("keyprobe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Advisory only: never blocks the probes
    pub fn validate_format(&self, credential: &Credential) -> FormatCheck {
        credential.format_check()
    }

    /// One chat-completion round-trip, no retries
    #[instrument(skip(self, credential), fields(model = %self.config.chat.model))]
    pub async fn probe_chat_completion(&self, credential: &Credential) -> ProbeResult<ChatReply> {
        ensure_configured(credential)?;

        let url = self.config.chat_url();
        let request = ChatCompletionRequest::from(&self.config.chat);
        debug!("Sending chat probe to {} (max_tokens={})", url, request.max_tokens);

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if status != StatusCode::OK {
            warn!("Chat probe rejected with status {}", status);
            return Err(ProbeError::protocol(status.as_u16(), body));
        }

        let decoded: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ProbeError::decoding(format!("Failed to parse chat response: {}", e)))?;

        let choice = decoded
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::semantic("no choices returned"))?;

        let reply = ChatReply {
            text: choice.message.content.unwrap_or_default(),
            model: decoded.model,
        };
        info!("Chat probe passed: {} chars", reply.text.len());
        Ok(reply)
    }

    /// One text-to-speech round-trip, no retries
    #[instrument(skip(self, credential), fields(model = %self.config.speech.model, voice = %self.config.speech.voice))]
    pub async fn probe_speech_synthesis(&self, credential: &Credential) -> ProbeResult<SpeechAudio> {
        ensure_configured(credential)?;

        let url = self.config.speech_url();
        let request = SpeechRequest::from(&self.config.speech);
        debug!("Sending speech probe to {} (format={})", url, request.response_format);

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        if status != StatusCode::OK {
            warn!("Speech probe rejected with status {}", status);
            return Err(ProbeError::protocol(
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }

        if body.is_empty() {
            return Err(ProbeError::semantic("no data received"));
        }

        info!("Speech probe passed: {} bytes", body.len());
        Ok(SpeechAudio {
            byte_len: body.len(),
            content_type,
        })
    }

    /// Full run: format check then both probes.
    ///
    /// An empty credential is rejected before any request is made.
    #[instrument(skip(self, credential), fields(concurrent = self.config.concurrent))]
    pub async fn verify(&self, credential: &Credential) -> ProbeResult<VerificationReport> {
        ensure_configured(credential)?;

        let format = self.validate_format(credential);
        for warning in format.warnings() {
            warn!("Credential format: {}", warning);
        }

        let (chat, speech) = if self.config.concurrent {
            tokio::join!(
                timed(self.probe_chat_completion(credential)),
                timed(self.probe_speech_synthesis(credential)),
            )
        } else {
            let chat = timed(self.probe_chat_completion(credential)).await;
            let speech = timed(self.probe_speech_synthesis(credential)).await;
            (chat, speech)
        };

        let report = VerificationReport {
            checked_at: Utc::now(),
            format,
            chat,
            speech,
        };
        info!(
            "Verification finished: chat={}, speech={}",
            pass_fail(report.chat.passed()),
            pass_fail(report.speech.passed())
        );
        Ok(report)
    }

    /// Like [`CredentialVerifier::verify`], but gives up as soon as `shutdown`
    /// resolves. In-flight requests are dropped, which closes their connections.
    pub async fn verify_until<F>(
        &self,
        credential: &Credential,
        shutdown: F,
    ) -> ProbeResult<VerificationReport>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            report = self.verify(credential) => report,
            _ = shutdown => {
                warn!("Verification cancelled");
                Err(ProbeError::Cancelled)
            }
        }
    }

    fn classify(&self, e: reqwest::Error) -> ProbeError {
        if e.is_timeout() {
            warn!("Probe timed out after {:?}", self.config.timeout);
            ProbeError::timeout(self.config.timeout)
        } else {
            warn!("Probe transport failure: {}", e);
            ProbeError::transport(error_chain(&e))
        }
    }
}

fn ensure_configured(credential: &Credential) -> ProbeResult<()> {
    if credential.is_empty() {
        return Err(ProbeError::configuration("API key is not configured"));
    }
    Ok(())
}

async fn timed<T, F>(probe: F) -> ProbeReport<T>
where
    F: Future<Output = ProbeResult<T>>,
{
    let started = Instant::now();
    let result = probe.await;
    ProbeReport {
        result,
        elapsed: started.elapsed(),
    }
}

/// reqwest's top-level message hides the interesting part (refused, DNS, TLS)
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn pass_fail(passed: bool) -> &'static str {
    if passed {
        "pass"
    } else {
        "fail"
    }
}
