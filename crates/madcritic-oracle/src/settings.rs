use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{CommandOracle, HttpOracle, Oracle, OracleError, OracleKind, RetryingOracle};

/// How to reach an oracle backend.
///
/// This is the shape of the `[oracle]` and `[critic_oracle]` tables in
/// `madcritic.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleSettings {
    pub kind: OracleKind,
    /// Base URL of an OpenAI-compatible endpoint (http)
    pub base_url: Option<String>,
    /// Model identifier sent with each request (http)
    pub model: Option<String>,
    /// Environment variable holding the bearer token (http)
    pub api_key_env: String,
    /// Executable to run (command)
    pub command: Option<PathBuf>,
    /// Extra arguments for the executable (command)
    pub args: Vec<String>,
    /// Per-call timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            kind: OracleKind::Http,
            base_url: None,
            model: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            command: None,
            args: Vec::new(),
            timeout: None,
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl OracleSettings {
    pub fn http(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind: OracleKind::Http,
            base_url: Some(base_url.into()),
            model: Some(model.into()),
            ..Default::default()
        }
    }

    pub fn command(command: impl Into<PathBuf>) -> Self {
        Self {
            kind: OracleKind::Command,
            command: Some(command.into()),
            ..Default::default()
        }
    }

    /// Check that the fields required by `kind` are present.
    pub fn validate(&self) -> Result<(), OracleError> {
        match self.kind {
            OracleKind::Http => {
                if self.base_url.as_deref().map_or(true, str::is_empty) {
                    return Err(OracleError::Config(
                        "http oracle requires base_url".to_string(),
                    ));
                }
                if self.model.as_deref().map_or(true, str::is_empty) {
                    return Err(OracleError::Config("http oracle requires model".to_string()));
                }
            }
            OracleKind::Command => {
                if self.command.is_none() {
                    return Err(OracleError::Config(
                        "command oracle requires command".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn with_retries<O: Oracle + 'static>(oracle: O, settings: &OracleSettings) -> Box<dyn Oracle> {
    if settings.max_retries == 0 {
        Box::new(oracle)
    } else {
        Box::new(RetryingOracle::new(
            oracle,
            settings.max_retries,
            settings.retry_backoff,
        ))
    }
}

/// Create an oracle from settings
pub fn create_oracle(settings: &OracleSettings) -> Result<Box<dyn Oracle>, OracleError> {
    settings.validate()?;

    match settings.kind {
        OracleKind::Http => {
            let base_url = settings.base_url.clone().unwrap_or_default();
            let model = settings.model.clone().unwrap_or_default();
            let mut oracle = HttpOracle::new(base_url, model);
            if let Ok(key) = std::env::var(&settings.api_key_env) {
                if !key.is_empty() {
                    oracle = oracle.with_api_key(key);
                }
            }
            if let Some(timeout) = settings.timeout {
                oracle = oracle.with_timeout(timeout);
            }
            Ok(with_retries(oracle, settings))
        }
        OracleKind::Command => {
            let command = settings.command.clone().unwrap_or_default();
            let mut oracle = CommandOracle::new(command).with_args(settings.args.clone());
            if let Some(timeout) = settings.timeout {
                oracle = oracle.with_timeout(timeout);
            }
            Ok(with_retries(oracle, settings))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_requires_base_url_and_model() {
        let settings = OracleSettings::default();
        assert!(matches!(settings.validate(), Err(OracleError::Config(_))));

        let settings = OracleSettings {
            base_url: Some("http://localhost:8000/v1".into()),
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        assert!(OracleSettings::http("http://localhost:8000/v1", "qwen")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_command_requires_command() {
        let settings = OracleSettings {
            kind: OracleKind::Command,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        assert!(OracleSettings::command("llm").validate().is_ok());
    }

    #[test]
    fn test_create_command_oracle_name() {
        let settings = OracleSettings {
            max_retries: 0,
            ..OracleSettings::command("/opt/bin/run-model")
        };
        let oracle = create_oracle(&settings).unwrap();
        assert_eq!(oracle.name(), "run-model");
    }

    #[test]
    fn test_settings_from_toml() {
        let settings: OracleSettings = toml::from_str(
            r#"
kind = "http"
base_url = "http://localhost:8000/v1"
model = "qwen2.5-7b"
timeout = "90s"
retry_backoff = "250ms"
"#,
        )
        .unwrap();
        assert_eq!(settings.timeout, Some(Duration::from_secs(90)));
        assert_eq!(settings.retry_backoff, Duration::from_millis(250));
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.api_key_env, "OPENAI_API_KEY");
    }
}
