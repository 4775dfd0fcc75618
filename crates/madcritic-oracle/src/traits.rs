use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::Completion;

/// Errors that can occur while calling an oracle.
///
/// Every variant means the oracle returned no usable text. Callers treat
/// these as transport failures: they are never retried by the debate core.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle transport failed: {0}")]
    Transport(String),

    #[error("Oracle returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle returned an empty completion")]
    EmptyResponse,

    #[error("Failed to spawn oracle process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Oracle configuration error: {0}")]
    Config(String),
}

/// Sampling parameters passed with every completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub stop_sequences: Vec<String>,
    /// Forwarded to adapters that support seeded sampling
    pub seed: Option<u64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::actor()
    }
}

impl GenerationParams {
    /// Stochastic sampling with a long budget, used for reasoning rounds.
    pub fn actor() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 2048,
            stop_sequences: Vec::new(),
            seed: None,
        }
    }

    /// Greedy decoding with a short budget, used for critic scoring.
    pub fn critic() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: 512,
            stop_sequences: Vec::new(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequences.push(stop.into());
        self
    }

    /// Whether these parameters request greedy decoding.
    pub fn is_deterministic(&self) -> bool {
        self.temperature == 0.0
    }
}

/// Supported oracle backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    Http,
    Command,
}

impl std::fmt::Display for OracleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleKind::Http => write!(f, "http"),
            OracleKind::Command => write!(f, "command"),
        }
    }
}

impl std::str::FromStr for OracleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" | "openai" => Ok(OracleKind::Http),
            "command" | "cmd" | "process" => Ok(OracleKind::Command),
            _ => Err(format!("Unknown oracle kind: {}", s)),
        }
    }
}

/// The sole point of contact with a language model.
///
/// Given a prompt and generation parameters, returns a text completion.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Human-readable name (e.g. the model identifier)
    fn name(&self) -> &str;

    /// Complete a single prompt
    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, OracleError>;

    /// Check whether the backend is reachable / installed
    async fn is_available(&self) -> bool;
}
