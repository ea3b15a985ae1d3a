//! Token encoders.
//!
//! A [`TokenEncoder`] runs the pretrained model over a padded batch of
//! tokenized inputs and returns one vector per token position. The remote
//! implementation talks to an inference server over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EncodingError, Result};
use crate::tokenizer::TokenizedText;

/// Per-token output of the encoder for one input, one vector per position.
pub type TokenStates = Vec<Vec<f32>>;

/// Trait for models producing per-token representations.
#[async_trait]
pub trait TokenEncoder: Send + Sync {
    /// Name of the model behind this encoder.
    fn model(&self) -> &str;

    /// Longest sequence the model can represent, special tokens included.
    fn max_tokens(&self) -> usize;

    /// Encode a batch whose items all share the same (padded) length.
    async fn encode(&self, batch: &[TokenizedText]) -> Result<Vec<TokenStates>>;
}

/// Encoder backed by an HTTP inference server.
///
/// The server receives `POST {base_url}/encode` with the padded ids and
/// attention masks and answers with the last hidden state of every input.
pub struct RemoteTokenEncoder {
    /// API base URL.
    base_url: String,

    /// Optional bearer token.
    api_key: Option<String>,

    /// HTTP client.
    client: reqwest::Client,

    /// Model name sent with every request.
    model: String,

    /// Positional limit of the model.
    max_tokens: usize,

    /// Per-request timeout.
    timeout: Duration,
}

impl RemoteTokenEncoder {
    /// Create an encoder for `model` served at `base_url`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client: reqwest::Client::new(),
            model: model.into(),
            max_tokens: 512,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model's positional limit.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn map_send_error(&self, err: reqwest::Error) -> EncodingError {
        if err.is_timeout() {
            EncodingError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            EncodingError::Http(err)
        }
    }
}

#[async_trait]
impl TokenEncoder for RemoteTokenEncoder {
    fn model(&self) -> &str {
        &self.model
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    async fn encode(&self, batch: &[TokenizedText]) -> Result<Vec<TokenStates>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Encoding batch of {} inputs with model: {}",
            batch.len(),
            self.model
        );

        let body = EncodeRequest {
            model: &self.model,
            input_ids: batch.iter().map(|t| t.ids.as_slice()).collect(),
            attention_mask: batch.iter().map(|t| t.attention_mask.as_slice()).collect(),
        };

        let mut request = self
            .client
            .post(format!("{}/encode", self.base_url))
            .timeout(self.timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EncodingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EncodingError::ApiRequest(format!(
                "encoder returned {status}: {error_text}"
            )));
        }

        let result: EncodeResponse = response.json().await.map_err(|e| self.map_send_error(e))?;

        if result.last_hidden_state.len() != batch.len() {
            return Err(EncodingError::InvalidResponse(format!(
                "expected {} hidden states, got {}",
                batch.len(),
                result.last_hidden_state.len()
            )));
        }
        for (states, input) in result.last_hidden_state.iter().zip(batch) {
            if states.len() != input.len() {
                return Err(EncodingError::TokenCountMismatch {
                    expected: input.len(),
                    actual: states.len(),
                });
            }
        }

        info!("Encoded {} inputs", batch.len());
        Ok(result.last_hidden_state)
    }
}

/// Request body of the encode endpoint.
#[derive(Debug, Serialize)]
struct EncodeRequest<'a> {
    model: &'a str,
    input_ids: Vec<&'a [u32]>,
    attention_mask: Vec<&'a [u8]>,
}

/// Response body of the encode endpoint.
#[derive(Debug, Deserialize)]
struct EncodeResponse {
    last_hidden_state: Vec<TokenStates>,
}
