use madcritic_oracle::{GenerationParams, Oracle, OracleError};
use tracing::{debug, info, warn};

use crate::{parse_global, parse_local, Candidate, CriticPrompts, Critique};

/// The critic oracle call failed to produce any text.
///
/// Parse problems never surface here; they yield a fallback [`Critique`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvaluationError {
    #[error("Critic oracle call failed: {0}")]
    Oracle(String),
}

impl From<OracleError> for EvaluationError {
    fn from(err: OracleError) -> Self {
        EvaluationError::Oracle(err.to_string())
    }
}

/// Scores candidate solutions through a critic oracle
pub struct CriticScorer<'a> {
    oracle: &'a dyn Oracle,
    params: GenerationParams,
}

impl<'a> CriticScorer<'a> {
    /// Build a scorer. Sampling is pinned to greedy decoding regardless of
    /// what `params` asks for.
    pub fn new(oracle: &'a dyn Oracle, mut params: GenerationParams) -> Self {
        if params.temperature != 0.0 || params.top_p != 1.0 {
            warn!(
                temperature = params.temperature,
                top_p = params.top_p,
                "Critic sampling overridden to temperature 0.0, top_p 1.0"
            );
            params.temperature = 0.0;
            params.top_p = 1.0;
        }
        Self { oracle, params }
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Score one solution in isolation
    pub async fn score_solution(
        &self,
        question: &str,
        solution: &str,
    ) -> Result<Critique, EvaluationError> {
        let prompt = CriticPrompts::local(question, solution);
        debug!(prompt_len = prompt.len(), "Running local critic");

        let completion = self.oracle.complete(&prompt, &self.params).await?;
        let critique = parse_local(&completion.text);

        info!(
            logic = critique.logic_score,
            computation = critique.computation_score,
            status = ?critique.parse_status,
            duration_secs = completion.duration.as_secs_f64(),
            "Critic completed"
        );

        Ok(critique)
    }

    /// Score every candidate in one oracle call.
    ///
    /// The result is indexed by agent index and has `agent_count` entries;
    /// agents absent from `candidates` hold a fallback critique.
    pub async fn score_global(
        &self,
        question: &str,
        candidates: &[Candidate<'_>],
        agent_count: usize,
    ) -> Result<Vec<Critique>, EvaluationError> {
        let prompt = CriticPrompts::global(question, candidates);
        debug!(
            prompt_len = prompt.len(),
            candidates = candidates.len(),
            "Running global critic"
        );

        let completion = self.oracle.complete(&prompt, &self.params).await?;
        let critiques = parse_global(&completion.text, agent_count);

        let fallbacks = candidates
            .iter()
            .filter(|c| critiques.get(c.index).map_or(true, Critique::is_fallback))
            .count();
        info!(
            candidates = candidates.len(),
            fallbacks,
            duration_secs = completion.duration.as_secs_f64(),
            "Global critic completed"
        );

        Ok(critiques)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParseStatus;
    use madcritic_oracle::ScriptedOracle;

    #[tokio::test]
    async fn test_score_solution_missing_key() {
        let oracle = ScriptedOracle::new(r#"blah {"logic_score": 8} blah"#);
        let scorer = CriticScorer::new(&oracle, GenerationParams::critic());

        let critique = scorer.score_solution("q", "s").await.unwrap();
        assert_eq!(critique.logic_score, 8.0);
        assert_eq!(critique.computation_score, 0.0);
        assert_eq!(critique.parse_status, ParseStatus::Partial);
    }

    #[tokio::test]
    async fn test_forces_greedy_sampling() {
        let oracle = ScriptedOracle::new("{}");
        let scorer = CriticScorer::new(&oracle, GenerationParams::actor());
        scorer.score_solution("q", "s").await.unwrap();

        let call = &oracle.calls()[0];
        assert_eq!(call.params.temperature, 0.0);
        assert_eq!(call.params.top_p, 1.0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_error() {
        let oracle = ScriptedOracle::new("{}").fail_next(OracleError::EmptyResponse);
        let scorer = CriticScorer::new(&oracle, GenerationParams::critic());
        let err = scorer.score_solution("q", "s").await.unwrap_err();
        assert!(matches!(err, EvaluationError::Oracle(_)));
    }

    #[tokio::test]
    async fn test_repeated_calls_identical() {
        let oracle = ScriptedOracle::new(r#"{"logic_score": 7, "computation_score": 6}"#);
        let scorer = CriticScorer::new(&oracle, GenerationParams::critic());
        let first = scorer.score_solution("q", "s").await.unwrap();
        let second = scorer.score_solution("q", "s").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(oracle.calls()[0].prompt, oracle.calls()[1].prompt);
    }

    #[tokio::test]
    async fn test_score_global() {
        let oracle = ScriptedOracle::new(
            r#"{"agents":[{"id":0,"logic_score":9,"computation_score":9,"critique":"ok"}]}"#,
        );
        let scorer = CriticScorer::new(&oracle, GenerationParams::critic());
        let candidates = [
            Candidate {
                index: 0,
                solution: "4",
                answer: Some("4"),
            },
            Candidate {
                index: 1,
                solution: "5",
                answer: Some("5"),
            },
        ];
        let critiques = scorer.score_global("q", &candidates, 2).await.unwrap();
        assert_eq!(critiques[0].logic_score, 9.0);
        assert!(critiques[1].is_fallback());
        assert_eq!(oracle.call_count(), 1);
    }
}
