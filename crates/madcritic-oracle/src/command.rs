use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::{Completion, GenerationParams, Oracle, OracleError, ProcessSpawner};

/// Oracle backed by an external command.
///
/// The prompt is written to the command's stdin and the completion is read
/// from stdout. Generation parameters travel as `MADCRITIC_*` environment
/// variables so wrapper scripts can forward them to whatever model they run.
pub struct CommandOracle {
    name: String,
    binary_path: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandOracle {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        let binary_path = binary_path.into();
        let name = binary_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| binary_path.display().to_string());
        Self {
            name,
            binary_path,
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn env_for(params: &GenerationParams) -> Vec<(String, String)> {
        let mut env = vec![
            (
                "MADCRITIC_TEMPERATURE".to_string(),
                params.temperature.to_string(),
            ),
            ("MADCRITIC_TOP_P".to_string(), params.top_p.to_string()),
            (
                "MADCRITIC_MAX_TOKENS".to_string(),
                params.max_tokens.to_string(),
            ),
        ];
        if !params.stop_sequences.is_empty() {
            env.push((
                "MADCRITIC_STOP".to_string(),
                params.stop_sequences.join("\n"),
            ));
        }
        if let Some(seed) = params.seed {
            env.push(("MADCRITIC_SEED".to_string(), seed.to_string()));
        }
        env
    }
}

#[async_trait]
impl Oracle for CommandOracle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        resolve_binary(&self.binary_path).is_some()
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, OracleError> {
        debug!(
            oracle = self.name(),
            prompt_len = prompt.len(),
            "Executing command oracle"
        );

        let env = Self::env_for(params);
        let output =
            ProcessSpawner::run(&self.binary_path, &self.args, &env, prompt, self.timeout).await?;

        if !output.success() {
            return Err(OracleError::Transport(format!(
                "{} exited with code {}: {}",
                self.name,
                output.exit_code,
                output.stderr.trim()
            )));
        }

        if output.stdout.trim().is_empty() {
            return Err(OracleError::EmptyResponse);
        }

        Ok(Completion::new(output.stdout, output.duration))
    }
}

/// Locate `binary` as given, or on `PATH` when it is a bare name.
///
/// Nothing is executed; wrapper scripts need not understand any flags.
fn resolve_binary(binary: &Path) -> Option<PathBuf> {
    if binary.is_absolute() || binary.components().count() > 1 {
        return binary.is_file().then(|| binary.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_carries_params() {
        let params = GenerationParams::critic().with_seed(7).with_stop("END");
        let env = CommandOracle::env_for(&params);
        let get = |k: &str| {
            env.iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get("MADCRITIC_TEMPERATURE").as_deref(), Some("0"));
        assert_eq!(get("MADCRITIC_MAX_TOKENS").as_deref(), Some("512"));
        assert_eq!(get("MADCRITIC_SEED").as_deref(), Some("7"));
        assert_eq!(get("MADCRITIC_STOP").as_deref(), Some("END"));
    }

    #[test]
    fn test_name_from_binary() {
        let oracle = CommandOracle::new("/usr/local/bin/llm-wrapper");
        assert_eq!(oracle.name(), "llm-wrapper");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cat_echoes_prompt() {
        let oracle = CommandOracle::new("cat");
        let completion = oracle
            .complete("The answer is \\boxed{4}", &GenerationParams::actor())
            .await
            .unwrap();
        assert_eq!(completion.text, "The answer is \\boxed{4}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_transport_error() {
        let oracle = CommandOracle::new("false");
        let err = oracle
            .complete("anything", &GenerationParams::actor())
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Transport(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_unavailable() {
        let oracle = CommandOracle::new("/nonexistent/madcritic-model-wrapper");
        assert!(!oracle.is_available().await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_binary_on_path_available_without_running() {
        // `false` exits non-zero for any flag, so availability must not run it
        let oracle = CommandOracle::new("false");
        assert!(oracle.is_available().await);
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = std::env::temp_dir();
        assert_eq!(resolve_binary(&dir.join("no-such-wrapper-bin")), None);
    }
}
