use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::{Completion, GenerationParams, Oracle, OracleError};

/// Oracle speaking the OpenAI-compatible `chat/completions` protocol.
///
/// Each prompt is sent as a single user message; no conversation state is
/// kept between calls.
pub struct HttpOracle {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl HttpOracle {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            timeout: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, prompt: &str, params: &GenerationParams) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": params.temperature,
            "top_p": params.top_p,
            "max_tokens": params.max_tokens,
        });
        if !params.stop_sequences.is_empty() {
            body["stop"] = serde_json::json!(params.stop_sequences);
        }
        if let Some(seed) = params.seed {
            body["seed"] = serde_json::json!(seed);
        }
        body
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    fn name(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        let mut request = self.client.get(format!("{}/models", self.base_url));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }
        request
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, OracleError> {
        let start = Instant::now();
        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            temperature = params.temperature,
            "Sending completion request"
        );

        let mut request = self
            .client
            .post(self.endpoint())
            .json(&self.request_body(prompt, params));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout(self.timeout.unwrap_or_default())
            } else {
                OracleError::Transport(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status { code, body });
        }

        let resp_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::Transport(format!("Malformed response body: {}", e)))?;

        let text = content_of(&resp_json).ok_or(OracleError::EmptyResponse)?;
        let duration = start.elapsed();

        debug!(
            model = %self.model,
            response_len = text.len(),
            duration_ms = duration.as_millis(),
            "Completion received"
        );

        Ok(Completion::new(text, duration))
    }
}

fn content_of(resp_json: &serde_json::Value) -> Option<String> {
    resp_json["choices"][0]["message"]["content"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
