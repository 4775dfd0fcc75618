use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::{Completion, GenerationParams, Oracle, OracleError};

/// Wraps another oracle and retries transient failures with exponential
/// backoff. Configuration errors and client-side HTTP errors are returned
/// immediately.
pub struct RetryingOracle<O> {
    inner: O,
    max_retries: u32,
    backoff: Duration,
}

impl<O: Oracle> RetryingOracle<O> {
    pub fn new(inner: O, max_retries: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_retries,
            backoff,
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

fn is_transient(err: &OracleError) -> bool {
    match err {
        OracleError::Transport(_) | OracleError::Timeout(_) | OracleError::EmptyResponse => true,
        OracleError::Status { code, .. } => *code == 429 || *code >= 500,
        OracleError::Spawn(_) | OracleError::Config(_) => false,
    }
}

#[async_trait]
impl<O: Oracle> Oracle for RetryingOracle<O> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, OracleError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(prompt, params).await {
                Ok(completion) => return Ok(completion),
                Err(e) if attempt < self.max_retries && is_transient(&e) => {
                    let delay = self.backoff * 2u32.saturating_pow(attempt);
                    warn!(
                        oracle = self.inner.name(),
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Oracle call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
