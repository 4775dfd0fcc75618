use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::{Completion, GenerationParams, Oracle, OracleError};

struct Rule {
    needle: String,
    replies: VecDeque<Result<String, OracleError>>,
    last: Option<String>,
}

#[derive(Default)]
struct State {
    rules: Vec<Rule>,
    failures: VecDeque<OracleError>,
    calls: Vec<ScriptedCall>,
}

/// A prompt seen by a [`ScriptedOracle`], with the params it was sent with
#[derive(Debug, Clone)]
pub struct ScriptedCall {
    pub prompt: String,
    pub params: GenerationParams,
}

/// Deterministic in-memory oracle for tests and dry runs.
///
/// Replies are chosen by the first rule whose needle occurs in the prompt.
/// Each rule pops from its own reply queue and repeats its last reply once
/// the queue runs dry. Prompts matching no rule get the fallback reply.
pub struct ScriptedOracle {
    fallback: String,
    state: Mutex<State>,
}

impl ScriptedOracle {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Answer prompts containing `needle` with `reply`.
    pub fn on(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.push_rule(needle.into(), Ok(reply.into()))
    }

    /// Fail prompts containing `needle` once with `err`.
    pub fn fail_on(self, needle: impl Into<String>, err: OracleError) -> Self {
        self.push_rule(needle.into(), Err(err))
    }

    /// Fail the next call regardless of prompt.
    pub fn fail_next(self, err: OracleError) -> Self {
        self.lock().failures.push_back(err);
        self
    }

    fn push_rule(self, needle: String, reply: Result<String, OracleError>) -> Self {
        {
            let mut state = self.lock();
            match state.rules.iter_mut().find(|r| r.needle == needle) {
                Some(rule) => rule.replies.push_back(reply),
                None => state.rules.push(Rule {
                    needle,
                    replies: VecDeque::from([reply]),
                    last: None,
                }),
            }
        }
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded prompts containing `needle`
    pub fn count_matching(&self, needle: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.prompt.contains(needle))
            .count()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, OracleError> {
        let mut state = self.lock();
        state.calls.push(ScriptedCall {
            prompt: prompt.to_string(),
            params: params.clone(),
        });

        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }

        let reply = match state.rules.iter_mut().find(|r| prompt.contains(&r.needle)) {
            Some(rule) => match rule.replies.pop_front() {
                Some(Ok(text)) => {
                    rule.last = Some(text.clone());
                    Ok(text)
                }
                Some(Err(e)) => Err(e),
                None => Ok(rule.last.clone().unwrap_or_else(|| self.fallback.clone())),
            },
            None => Ok(self.fallback.clone()),
        }?;

        Ok(Completion::new(reply, Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rules_queue_then_repeat() {
        let oracle = ScriptedOracle::new("fallback")
            .on("alpha", "first")
            .on("alpha", "second");
        let params = GenerationParams::actor();

        assert_eq!(oracle.complete("alpha?", &params).await.unwrap().text, "first");
        assert_eq!(oracle.complete("alpha?", &params).await.unwrap().text, "second");
        assert_eq!(oracle.complete("alpha?", &params).await.unwrap().text, "second");
        assert_eq!(oracle.complete("beta?", &params).await.unwrap().text, "fallback");
        assert_eq!(oracle.count_matching("alpha"), 3);
    }

    #[tokio::test]
    async fn test_fail_on_consumes_once() {
        let oracle = ScriptedOracle::new("fallback")
            .fail_on("flaky", OracleError::EmptyResponse)
            .on("flaky", "recovered");
        let params = GenerationParams::actor();

        assert!(oracle.complete("flaky", &params).await.is_err());
        assert_eq!(oracle.complete("flaky", &params).await.unwrap().text, "recovered");
    }

    #[tokio::test]
    async fn test_records_params() {
        let oracle = ScriptedOracle::new("x");
        oracle
            .complete("p", &GenerationParams::critic())
            .await
            .unwrap();
        assert_eq!(oracle.calls()[0].params, GenerationParams::critic());
    }
}
