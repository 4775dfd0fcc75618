use std::time::Duration;
use thiserror::Error;

use madcritic_oracle::OracleError;

/// Invalid debate configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("agents must be at least 1")]
    NoAgents,

    #[error("rounds must be at least 1")]
    NoRounds,

    #[error("role set must not be empty")]
    EmptyRoles,

    #[error("max_concurrent_calls must be at least 1")]
    NoConcurrency,

    #[error("restart_threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),
}

/// A single agent's oracle call failed during a round
#[derive(Error, Debug)]
pub enum RoundError {
    #[error("agent {agent} failed in round {round}: {source}")]
    Oracle {
        agent: usize,
        round: usize,
        #[source]
        source: OracleError,
    },

    #[error("call limiter closed before agent {agent} could run")]
    LimiterClosed { agent: usize },
}

/// Question-level failures. These stop one question, never the run.
#[derive(Error, Debug)]
pub enum DebateError {
    #[error("Configuration error: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Debate interrupted after {completed_rounds} completed rounds")]
    Interrupted { completed_rounds: usize },

    #[error("Debate timed out after {elapsed:?} ({completed_rounds} completed rounds)")]
    TimedOut {
        completed_rounds: usize,
        elapsed: Duration,
    },
}
