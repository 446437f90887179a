//! Inference gateway — one outbound call per diagnosis request.
//!
//! The external model is an opaque oracle: we send the narrative and encoded
//! images under a fixed system instruction and a strict output schema, and
//! hand whatever text comes back to the normalizer. The call carries an
//! explicit cancellation token so an abandoned submission aborts its
//! outbound request, and transient failures (connect, timeout, 5xx/429) are
//! retried a bounded number of times with exponential backoff.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use super::prompt::{build_user_prompt, response_schema, DIAGNOSIS_SYSTEM_PROMPT};
use crate::config::Config;
use crate::models::{DiagnosisRequest, EncodedImage};

// ──────────────────────────────────────────────
// Error taxonomy
// ──────────────────────────────────────────────

/// Failures from the inference service boundary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Cannot reach the inference service at {0}")]
    Connect(String),

    #[error("Inference request timed out after {0}s")]
    Timeout(u64),

    #[error("Inference service returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Inference service returned a success status with no text payload")]
    EmptyResponse,

    #[error("Could not decode the inference service envelope: {0}")]
    ResponseParsing(String),

    #[error("Inference call cancelled by the caller")]
    Cancelled,
}

impl GatewayError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Timeout(_) => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

// ──────────────────────────────────────────────
// Cancellation
// ──────────────────────────────────────────────

/// Cancellation signal for an in-flight inference call.
///
/// Cloneable observer half of a watch channel. The call aborts when
/// [`CancelHandle::cancel`] fires OR the handle is dropped, so an abandoned
/// submission never leaks an outbound request.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
    // Keeps the channel open for tokens that must never fire.
    _keep_alive: Option<Arc<watch::Sender<bool>>>,
}

impl CancelToken {
    /// A token that can never fire. For call sites with no abandonment path.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keep_alive: Some(Arc::new(tx)),
        }
    }

    /// Has the signal fired (or the handle been dropped)?
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the signal fires. Never resolves for [`Self::never`].
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // wait_for errors when the sender is dropped — that counts as
        // cancellation too.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Caller-side handle that cancels the paired [`CancelToken`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a linked cancellation handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle { tx },
        CancelToken {
            rx,
            _keep_alive: None,
        },
    )
}

// ──────────────────────────────────────────────
// Retry policy
// ──────────────────────────────────────────────

/// Bounded retry with exponential backoff for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Backoff before the given retry (1-based): base × 2^(retry-1).
    fn backoff_for(&self, retry: u32) -> Duration {
        self.backoff * (1u32 << retry.saturating_sub(1).min(16))
    }
}

/// Run `attempt` under the retry policy, aborting on cancellation.
///
/// Only transient errors are retried; everything else (and every success)
/// returns immediately. The backoff sleep is itself cancellable.
pub async fn call_with_retry<F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancelToken,
    mut attempt: F,
) -> Result<String, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<String, GatewayError>>,
{
    let mut retries = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(GatewayError::Cancelled),
            result = attempt() => result,
        };

        match result {
            Err(error) if error.is_transient() && retries < policy.max_retries => {
                retries += 1;
                let delay = policy.backoff_for(retries);
                tracing::warn!(
                    retry = retries,
                    max = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient inference failure, backing off"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            other => return other,
        }
    }
}

// ──────────────────────────────────────────────
// InferenceClient trait
// ──────────────────────────────────────────────

/// Seam for the external inference service.
///
/// Production uses [`GeminiClient`]; tests use [`MockInferenceClient`].
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Run one diagnosis inference. Returns the raw text payload.
    async fn diagnose(
        &self,
        request: &DiagnosisRequest,
        cancel: &CancelToken,
    ) -> Result<String, GatewayError>;
}

// ──────────────────────────────────────────────
// Wire types (Gemini generateContent)
// ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn image(image: &EncodedImage) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Concatenated text of the first candidate, if any non-blank text exists.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let text: String = candidate
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

// ──────────────────────────────────────────────
// GeminiClient
// ──────────────────────────────────────────────

/// HTTP client for the hosted Gemini `generateContent` endpoint.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
            retry,
            client,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.inference_base_url,
            &config.api_key,
            &config.inference_model,
            config.request_timeout_secs,
            RetryPolicy {
                max_retries: config.max_retries,
                backoff: Duration::from_millis(config.retry_backoff_ms),
            },
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_body(&self, request: &DiagnosisRequest) -> GenerateContentRequest {
        let mut parts = vec![Part::text(build_user_prompt(&request.narrative))];
        parts.extend(request.images.iter().map(Part::image));

        GenerateContentRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part::text(DIAGNOSIS_SYSTEM_PROMPT)],
            },
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        }
    }

    async fn attempt(&self, body: &GenerateContentRequest) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::Connect(self.base_url.clone())
                } else if e.is_timeout() {
                    GatewayError::Timeout(self.timeout_secs)
                } else {
                    GatewayError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ResponseParsing(e.to_string()))?;

        extract_text(parsed).ok_or(GatewayError::EmptyResponse)
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn diagnose(
        &self,
        request: &DiagnosisRequest,
        cancel: &CancelToken,
    ) -> Result<String, GatewayError> {
        let start = std::time::Instant::now();
        tracing::debug!(
            model = %self.model,
            narrative_len = request.narrative.len(),
            image_count = request.images.len(),
            "inference call starting"
        );

        let body = self.build_body(request);
        let result = call_with_retry(&self.retry, cancel, || self.attempt(&body)).await;

        match &result {
            Ok(text) => tracing::info!(
                model = %self.model,
                elapsed_ms = %start.elapsed().as_millis(),
                response_len = text.len(),
                "inference call complete"
            ),
            Err(error) => tracing::error!(
                model = %self.model,
                elapsed_ms = %start.elapsed().as_millis(),
                error = %error,
                "inference call failed"
            ),
        }

        result
    }
}

// ──────────────────────────────────────────────
// MockInferenceClient (testing)
// ──────────────────────────────────────────────

/// Mock inference client — plays back a scripted failure sequence, then a
/// fixed response.
pub struct MockInferenceClient {
    response: String,
    script: Mutex<VecDeque<GatewayError>>,
    calls: AtomicUsize,
}

impl MockInferenceClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail with the given errors (in order) before succeeding.
    pub fn with_failures(self, failures: Vec<GatewayError>) -> Self {
        Self {
            script: Mutex::new(failures.into()),
            ..self
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn diagnose(
        &self,
        _request: &DiagnosisRequest,
        cancel: &CancelToken,
    ) -> Result<String, GatewayError> {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().expect("mock script lock").pop_front();
        match next {
            Some(error) => Err(error),
            None => Ok(self.response.clone()),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
