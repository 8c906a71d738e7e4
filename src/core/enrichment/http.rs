//! HTTP enrichment backend
//!
//! Speaks the Gemini `generateContent` protocol: system instruction and
//! user content as typed parts, an optional JSON response mime type,
//! and the usual vendor status conventions for auth, throttling, and
//! transient failures.

use super::{EnrichmentBackend, EnrichmentRequest, EnrichmentResponse};
use crate::config::models::{BackendConfig, CredentialConfig};
use crate::utils::error::{BackendError, PipelineError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

const BACKEND_NAME: &str = "gemini";

/// Reqwest-backed vendor client shared by every worker
pub struct HttpEnrichmentBackend {
    client: Client,
    request_timeout: Duration,
}

impl HttpEnrichmentBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| PipelineError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    fn request_url(credential: &CredentialConfig) -> String {
        format!(
            "{}/models/{}:generateContent",
            credential.endpoint.trim_end_matches('/'),
            credential.model_id
        )
    }

    fn request_body(request: &EnrichmentRequest) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.user_content }]
            }]
        });
        if let Some(instruction) = &request.instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }
        if request.structured_output {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }
        body
    }
}

#[async_trait]
impl EnrichmentBackend for HttpEnrichmentBackend {
    async fn generate(
        &self,
        credential: &CredentialConfig,
        request: EnrichmentRequest,
    ) -> std::result::Result<EnrichmentResponse, BackendError> {
        let url = Self::request_url(credential);
        let body = Self::request_body(&request);

        debug!(
            credential = %credential.name,
            model = %credential.model_id,
            structured = request.structured_output,
            "Sending enrichment request"
        );

        let response = timeout(
            self.request_timeout,
            self.client
                .post(&url)
                .query(&[("key", credential.secret.as_str())])
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| BackendError::transient(BACKEND_NAME, "request timed out"))?
        .map_err(|e| BackendError::transient(BACKEND_NAME, format!("network error: {}", e)))?;

        let status = response.status();
        let payload = response.text().await.map_err(|e| {
            BackendError::transient(BACKEND_NAME, format!("failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            return Err(map_error_status(status, &payload));
        }

        let value: Value = serde_json::from_str(&payload).map_err(|e| {
            BackendError::transient(BACKEND_NAME, format!("response was not valid JSON: {}", e))
        })?;
        Ok(decode_response(&value))
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }
}

/// Map a non-success vendor status to the backend error taxonomy
fn map_error_status(status: StatusCode, payload: &str) -> BackendError {
    let message = extract_error_message(payload).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    });

    match status.as_u16() {
        401 | 403 => BackendError::auth(BACKEND_NAME, message),
        429 => BackendError::RateLimited {
            backend: BACKEND_NAME,
            message,
            retry_after: extract_retry_after(payload),
        },
        400 | 404 | 422 => BackendError::malformed_request(BACKEND_NAME, message),
        _ => BackendError::transient(
            BACKEND_NAME,
            format!("status {}: {}", status.as_u16(), message),
        ),
    }
}

fn extract_error_message(payload: &str) -> Option<String> {
    let value: Value = serde_json::from_str(payload).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Pull a retry hint out of a 429 body.
///
/// Accepts both a plain `retry_after` seconds field and the structured
/// RetryInfo detail (`"retryDelay": "30s"`) the vendor actually sends.
fn extract_retry_after(payload: &str) -> Option<u64> {
    let value: Value = serde_json::from_str(payload).ok()?;
    let error = value.get("error")?;

    if let Some(seconds) = error.get("retry_after").and_then(Value::as_u64) {
        return Some(seconds);
    }

    for detail in error.get("details")?.as_array()? {
        if let Some(delay) = detail.get("retryDelay").and_then(Value::as_str) {
            if let Some(seconds) = delay
                .strip_suffix('s')
                .and_then(|d| d.parse::<f64>().ok())
            {
                return Some(seconds.ceil() as u64);
            }
        }
    }
    None
}

/// Flatten a generateContent response into text, image URLs, and usage
fn decode_response(value: &Value) -> EnrichmentResponse {
    let mut text = String::new();
    let mut image_urls = Vec::new();

    if let Some(parts) = value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        for part in parts {
            if let Some(fragment) = part.get("text").and_then(Value::as_str) {
                text.push_str(fragment);
            }
            if let Some(uri) = part.pointer("/fileData/fileUri").and_then(Value::as_str) {
                image_urls.push(uri.to_string());
            }
        }
    }

    let tokens_used = value
        .pointer("/usageMetadata/totalTokenCount")
        .and_then(Value::as_u64)
        .map(|tokens| tokens as u32);

    EnrichmentResponse {
        text,
        image_urls,
        tokens_used,
    }
}
