use async_trait::async_trait;
use serde_json::json;

use codemend_types::{CodemendError, Result};

use crate::{CompletionRequest, Credentials};

// ---------------------------------------------------------------------------
// Evaluator trait
// ---------------------------------------------------------------------------

/// Capability interface for the remote evaluation service.
///
/// The pipeline only ever sees this trait, so verdict, test-synthesis, and
/// fix-synthesis logic can all be exercised with deterministic doubles.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Send one completion request and return the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

// ---------------------------------------------------------------------------
// HttpEvaluator
// ---------------------------------------------------------------------------

/// Live HTTP implementation of [`Evaluator`].
///
/// Posts a chat-style body to the configured endpoint, authenticating with
/// an `api-key` header. All transport failures, timeouts included, surface
/// as errors; retry policy is the caller's concern.
#[derive(Debug)]
pub struct HttpEvaluator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpEvaluator {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: credentials.api_url,
            api_key: credentials.api_key,
        }
    }
}

#[async_trait]
impl Evaluator for HttpEvaluator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = json!({
            "messages": request.messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        tracing::debug!(
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "evaluator request"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CodemendError::RequestTimeout {
                        timeout_ms: request.timeout.as_millis() as u64,
                    }
                } else {
                    CodemendError::ServiceError {
                        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CodemendError::ServiceError {
                status: status.as_u16(),
                message,
            });
        }

        let reply: serde_json::Value = response.json().await.map_err(|e| {
            CodemendError::ServiceError {
                status: status.as_u16(),
                message: format!("invalid reply body: {e}"),
            }
        })?;
        extract_completion(&reply)
    }
}

/// Pull the generated text out of the single completion slot.
fn extract_completion(reply: &serde_json::Value) -> Result<String> {
    reply["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| CodemendError::ServiceError {
            status: 200,
            message: "reply missing choices[0].message.content".to_string(),
        })
}
