use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use madcritic_critic::{Candidate, CriticScorer, Critique};
use madcritic_logging::{LogEvent, Logger};
use madcritic_oracle::Oracle;

use crate::{
    aggregate, AgentState, Answer, ConfigError, CriticMode, DebateConfig, DebateContext,
    DebateError, DebatePhase, DebateTranscript, Question, RoundExecutor, RoundInput, RoundRecord,
};

/// Drives N agents through R rounds for one question at a time.
///
/// `run` takes `&self`, so one orchestrator can serve many questions
/// concurrently; each call owns its own [`DebateContext`].
pub struct DebateOrchestrator<'a> {
    actor: &'a dyn Oracle,
    scorer: CriticScorer<'a>,
    config: DebateConfig,
    logger: Arc<Logger>,
    limiter: Arc<Semaphore>,
    interrupted: Arc<AtomicBool>,
}

impl<'a> DebateOrchestrator<'a> {
    pub fn new(
        actor: &'a dyn Oracle,
        critic: &'a dyn Oracle,
        config: DebateConfig,
        logger: Arc<Logger>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let scorer = CriticScorer::new(critic, config.critic_params.clone());
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_calls));
        Ok(Self {
            actor,
            scorer,
            config,
            logger,
            limiter,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an oracle call limiter with other orchestrations
    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Observe an externally owned interrupt flag
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// Get a handle to signal interruption
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    /// Run the full debate for `question`.
    ///
    /// Interruption and the question timeout take effect at round
    /// boundaries; a round cut short by the timeout is discarded.
    pub async fn run(&self, question: &Question) -> Result<DebateTranscript, DebateError> {
        let started = Instant::now();
        let deadline = self
            .config
            .question_timeout
            .map(|limit| tokio::time::Instant::now() + limit);
        let mut context = DebateContext::new(self.config.rounds);

        while let DebatePhase::Round(round) = context.advance() {
            if self.interrupted.load(Ordering::SeqCst) {
                info!(question_id = %question.id, round, "Debate interrupted");
                return Err(DebateError::Interrupted {
                    completed_rounds: context.completed_rounds(),
                });
            }

            let pending = self.run_round(
                question,
                round,
                context.last_round(),
                context.restart_pending(),
            );
            let record = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, pending).await {
                    Ok(record) => record,
                    Err(_) => {
                        warn!(
                            question_id = %question.id,
                            round,
                            "Question timed out, discarding partial round"
                        );
                        return Err(DebateError::TimedOut {
                            completed_rounds: context.completed_rounds(),
                            elapsed: started.elapsed(),
                        });
                    }
                },
                None => pending.await,
            };

            let restart = self.should_restart(&record);
            if restart {
                info!(
                    question_id = %question.id,
                    round,
                    "All solutions scored low, next round restarts"
                );
            }
            context.set_restart_pending(restart);
            context.push_round(record);
        }

        let rounds = context.into_rounds();
        let gold = &question.gold_answer;
        let initial_decision = decide(rounds.first(), gold);
        let decision = decide(rounds.last(), gold);
        let duration_secs = started.elapsed().as_secs_f64();

        self.logger.log(&LogEvent::QuestionFinalized {
            question_id: question.id.clone(),
            initial_majority: initial_decision.majority_answer.as_ref().map(Answer::to_string),
            majority: decision.majority_answer.as_ref().map(Answer::to_string),
            gold: gold.to_string(),
            correct: decision.is_correct,
            duration_secs,
        });

        Ok(DebateTranscript {
            question: question.clone(),
            rounds,
            initial_decision,
            decision,
            duration_secs,
        })
    }

    /// Every agent's turn for `round`, then the critic barrier if enabled
    async fn run_round(
        &self,
        question: &Question,
        round: usize,
        prior: Option<&RoundRecord>,
        restart: bool,
    ) -> RoundRecord {
        let executor = RoundExecutor::new(self.actor, &self.config.actor);
        let inputs: Vec<RoundInput<'_>> = (0..self.config.agents)
            .map(|agent| RoundInput {
                question,
                round_number: round,
                agent_index: agent,
                role: self.config.role_for(agent),
                prior,
                critic_enabled: self.config.critic.is_enabled(),
                restart,
            })
            .collect();

        let kind = inputs
            .first()
            .map(|i| i.prompt_kind().to_string())
            .unwrap_or_default();
        self.logger.log(&LogEvent::RoundStarted {
            question_id: question.id.clone(),
            round,
            prompt: kind,
        });

        let turns = inputs.into_iter().map(|input| {
            let executor = &executor;
            async move {
                let result = match self.limiter.acquire().await {
                    Ok(_permit) => executor.run_round(input).await,
                    Err(_) => Err(crate::RoundError::LimiterClosed {
                        agent: input.agent_index,
                    }),
                };
                match result {
                    Ok(state) => {
                        self.logger.log(&LogEvent::AgentCompleted {
                            question_id: question.id.clone(),
                            round,
                            agent: state.agent_index,
                            answer: state.extracted_answer.as_ref().map(Answer::to_string),
                            duration_secs: state.duration_secs,
                        });
                        state
                    }
                    Err(e) => {
                        warn!(
                            question_id = %question.id,
                            round,
                            agent = input.agent_index,
                            error = %e,
                            "Agent call failed"
                        );
                        self.logger.log(&LogEvent::AgentFailed {
                            question_id: question.id.clone(),
                            round,
                            agent: input.agent_index,
                            error: e.to_string(),
                        });
                        AgentState::failed(
                            input.agent_index,
                            round,
                            input.role,
                            input.prompt_kind(),
                            e.to_string(),
                        )
                    }
                }
            }
        });
        let mut states = join_all(turns).await;

        if self.config.scores_round(round) {
            states = match self.config.critic {
                CriticMode::Global => self.score_global(question, round, states).await,
                _ => self.score_local(question, round, states).await,
            };
            self.log_critic_summary(question, round, &states);
        }

        RoundRecord::new(round, states)
    }

    async fn score_local(
        &self,
        question: &Question,
        round: usize,
        states: Vec<AgentState>,
    ) -> Vec<AgentState> {
        let scored = states.into_iter().map(|state| async move {
            if state.is_failed() {
                return state;
            }
            let _permit = match self.limiter.acquire().await {
                Ok(permit) => permit,
                Err(_) => return state.with_critic_failure("call limiter closed"),
            };
            let result = self
                .scorer
                .score_solution(&question.prompt_text, &state.raw_text)
                .await;
            match result {
                Ok(critique) => state.with_scores(critique),
                Err(e) => {
                    warn!(
                        question_id = %question.id,
                        round,
                        agent = state.agent_index,
                        error = %e,
                        "Critic call failed"
                    );
                    self.logger.log(&LogEvent::CriticFailed {
                        question_id: question.id.clone(),
                        round,
                        agent: Some(state.agent_index),
                        error: e.to_string(),
                    });
                    state.with_critic_failure(e.to_string())
                }
            }
        });
        join_all(scored).await
    }

    async fn score_global(
        &self,
        question: &Question,
        round: usize,
        states: Vec<AgentState>,
    ) -> Vec<AgentState> {
        let result = {
            let candidates: Vec<Candidate<'_>> = states
                .iter()
                .filter(|s| !s.is_failed())
                .map(|s| Candidate {
                    index: s.agent_index,
                    solution: &s.raw_text,
                    answer: s.extracted_answer.as_ref().map(Answer::as_str),
                })
                .collect();
            if candidates.is_empty() {
                debug!(question_id = %question.id, round, "No solutions to score");
                return states;
            }
            match self.limiter.acquire().await {
                Ok(_permit) => {
                    self.scorer
                        .score_global(&question.prompt_text, &candidates, self.config.agents)
                        .await
                }
                Err(_) => Err(madcritic_critic::EvaluationError::Oracle(
                    "call limiter closed".to_string(),
                )),
            }
        };

        match result {
            Ok(critiques) => states
                .into_iter()
                .map(|state| {
                    if state.is_failed() {
                        return state;
                    }
                    let critique = critiques
                        .get(state.agent_index)
                        .cloned()
                        .unwrap_or_else(Critique::fallback);
                    state.with_scores(critique)
                })
                .collect(),
            Err(e) => {
                warn!(question_id = %question.id, round, error = %e, "Global critic call failed");
                self.logger.log(&LogEvent::CriticFailed {
                    question_id: question.id.clone(),
                    round,
                    agent: None,
                    error: e.to_string(),
                });
                let message = e.to_string();
                states
                    .into_iter()
                    .map(|state| {
                        if state.is_failed() {
                            state
                        } else {
                            state.with_critic_failure(message.clone())
                        }
                    })
                    .collect()
            }
        }
    }

    fn log_critic_summary(&self, question: &Question, round: usize, states: &[AgentState]) {
        let scored: Vec<&Critique> = states.iter().filter_map(|s| s.scores.as_ref()).collect();
        if scored.is_empty() {
            return;
        }
        let mean_score = scored.iter().map(|c| c.combined()).sum::<f64>() / scored.len() as f64;
        let fallbacks = scored.iter().filter(|c| c.is_fallback()).count();
        self.logger.log(&LogEvent::CriticCompleted {
            question_id: question.id.clone(),
            round,
            mode: self.config.critic.to_string(),
            mean_score,
            fallbacks,
        });
    }

    /// True when a restart threshold is set and every solved agent with a
    /// usable critique in `record` was scored below it.
    ///
    /// Fallback critiques and critic failures carry no signal and are left
    /// out; a round with no usable critique never restarts.
    fn should_restart(&self, record: &RoundRecord) -> bool {
        let Some(threshold) = self.config.restart_threshold else {
            return false;
        };
        if record.round_number >= self.config.rounds {
            return false;
        }
        let mut scored = record
            .solved()
            .filter_map(|s| s.scores.as_ref())
            .filter(|c| !c.is_fallback())
            .peekable();
        if scored.peek().is_none() {
            return false;
        }
        scored.all(|c| c.combined() < threshold)
    }
}

fn decide(record: Option<&RoundRecord>, gold: &Answer) -> crate::Decision {
    let states = record.map(|r| r.states.as_slice()).unwrap_or(&[]);
    aggregate(states, gold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PromptKind, Role};
    use madcritic_critic::ParseStatus;
    use madcritic_oracle::{OracleError, ScriptedOracle};
    use std::time::Duration;

    fn question(gold: &str) -> Question {
        Question::new(
            "q1",
            "Compute 2+2, then add 3.",
            Answer::parse(gold).unwrap(),
        )
    }

    fn logger() -> Arc<Logger> {
        Arc::new(Logger::quiet())
    }

    #[tokio::test]
    async fn test_unanimous_no_flip() {
        let actor = ScriptedOracle::new("2+2=4, 4+3=7. \\boxed{7}");
        let critic = ScriptedOracle::new("{}");
        let orchestrator =
            DebateOrchestrator::new(&actor, &critic, DebateConfig::new(3, 2), logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert_eq!(transcript.rounds.len(), 2);
        assert_eq!(transcript.initial_decision.majority_answer, Answer::parse("7"));
        assert_eq!(transcript.decision.majority_answer, Answer::parse("7"));
        assert!(transcript.initial_decision.is_correct);
        assert!(transcript.decision.is_correct);
        assert_eq!(actor.call_count(), 6);
        assert_eq!(critic.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_agent_keeps_slot() {
        let actor = ScriptedOracle::new("\\boxed{7}")
            .fail_next(OracleError::Transport("connection reset".into()));
        let critic = ScriptedOracle::new("{}");
        let orchestrator =
            DebateOrchestrator::new(&actor, &critic, DebateConfig::new(3, 3), logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert_eq!(transcript.rounds.len(), 3);
        for (i, record) in transcript.rounds.iter().enumerate() {
            assert_eq!(record.round_number, i + 1);
            assert_eq!(record.states.len(), 3);
        }
        assert_eq!(transcript.agent_failures(), 1);
        assert_eq!(transcript.initial_decision.abstentions, 1);
        assert!(transcript.decision.is_correct);
    }

    #[tokio::test]
    async fn test_local_critic_scores_every_solution() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new(r#"{"logic_score": 9, "computation_score": 8}"#);
        let config = DebateConfig::new(2, 2).with_critic(CriticMode::Local);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert_eq!(critic.call_count(), 4);
        for record in &transcript.rounds {
            for state in &record.states {
                let scores = state.scores.as_ref().unwrap();
                assert_eq!(scores.logic_score, 9.0);
                assert_eq!(scores.parse_status, ParseStatus::Parsed);
            }
        }
        // Round 2 prompts carry round 1 critiques
        assert_eq!(actor.count_matching("Critic: Logic: 9.0/10"), 2);
        assert!(critic.calls().iter().all(|c| c.params.temperature == 0.0));
    }

    #[tokio::test]
    async fn test_global_critic_one_call_per_round() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new(
            r#"{"agents":[{"id":0,"logic_score":9,"computation_score":9},{"id":1,"score":4}]}"#,
        );
        let config = DebateConfig::new(3, 2).with_critic(CriticMode::Global);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert_eq!(critic.call_count(), 2);
        let first = &transcript.rounds[0];
        assert_eq!(first.states[0].scores.as_ref().unwrap().logic_score, 9.0);
        assert_eq!(first.states[1].scores.as_ref().unwrap().computation_score, 4.0);
        assert!(first.states[2].scores.as_ref().unwrap().is_fallback());
        assert_eq!(transcript.critic_fallbacks(), 2);
    }

    #[tokio::test]
    async fn test_critic_failure_does_not_abort() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new("{}").fail_next(OracleError::EmptyResponse);
        let config = DebateConfig::new(1, 1).with_critic(CriticMode::Local);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        let state = &transcript.rounds[0].states[0];
        assert!(state.scores.is_none());
        assert!(state.critic_failure.is_some());
        assert!(transcript.decision.is_correct);
    }

    #[tokio::test]
    async fn test_global_critic_failure_marks_every_solution() {
        let actor = ScriptedOracle::new("\\boxed{7}")
            .fail_next(OracleError::Transport("connection reset".into()));
        let critic = ScriptedOracle::new("{}").fail_next(OracleError::EmptyResponse);
        let config = DebateConfig::new(3, 1).with_critic(CriticMode::Global);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert_eq!(critic.call_count(), 1);
        let states = &transcript.rounds[0].states;
        assert_eq!(states.iter().filter(|s| s.is_failed()).count(), 1);
        for state in states {
            assert!(state.scores.is_none());
            if state.is_failed() {
                assert!(state.critic_failure.is_none());
            } else {
                assert!(state.critic_failure.is_some());
            }
        }
        assert_eq!(transcript.decision.majority_answer, Answer::parse("7"));
        assert!(transcript.decision.is_correct);
    }

    #[tokio::test]
    async fn test_seeded_agents_sample_differently() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new("{}");
        let config = DebateConfig::new(3, 2).with_seed(42);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();
        orchestrator.run(&question("7")).await.unwrap();

        let calls = actor.calls();
        let first_round: Vec<_> = calls
            .iter()
            .filter(|c| c.prompt.contains("Solve the following"))
            .map(|c| (c.prompt.clone(), c.params.seed))
            .collect();
        assert_eq!(first_round.len(), 3);
        let distinct: std::collections::HashSet<_> = first_round.iter().collect();
        assert_eq!(distinct.len(), 3);
        assert!(calls.iter().all(|c| c.params.seed.is_some()));

        // Same base seed, same per-call seeds
        let again = ScriptedOracle::new("\\boxed{7}");
        let config = DebateConfig::new(3, 2).with_seed(42);
        let orchestrator = DebateOrchestrator::new(&again, &critic, config, logger()).unwrap();
        orchestrator.run(&question("7")).await.unwrap();
        let mut before: Vec<_> = calls.iter().map(|c| c.params.seed).collect();
        let mut after: Vec<_> = again.calls().iter().map(|c| c.params.seed).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_flip_wrong_to_correct() {
        let actor = ScriptedOracle::new("\\boxed{14}")
            .on("Solve the following", "\\boxed{10}")
            .on("OTHER AGENTS", "On reflection \\boxed{14}");
        let critic = ScriptedOracle::new("{}");
        let orchestrator =
            DebateOrchestrator::new(&actor, &critic, DebateConfig::new(3, 2), logger()).unwrap();

        let transcript = orchestrator.run(&question("14")).await.unwrap();
        assert_eq!(transcript.initial_decision.majority_answer, Answer::parse("10"));
        assert!(!transcript.initial_decision.is_correct);
        assert_eq!(transcript.decision.majority_answer, Answer::parse("14"));
        assert!(transcript.decision.is_correct);
    }

    #[tokio::test]
    async fn test_restart_when_all_scores_low() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new(r#"{"logic_score": 2, "computation_score": 3}"#);
        let config = DebateConfig::new(2, 2)
            .with_critic(CriticMode::Local)
            .with_restart_threshold(5.0);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert!(transcript.rounds[1]
            .states
            .iter()
            .all(|s| s.prompt_kind == PromptKind::Restart));
        assert_eq!(actor.count_matching("from scratch"), 2);
    }

    #[tokio::test]
    async fn test_no_restart_when_one_score_high() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new(r#"{"logic_score": 2, "computation_score": 3}"#)
            .on("Proposed Solution", r#"{"logic_score": 2, "computation_score": 3}"#)
            .on("Proposed Solution", r#"{"logic_score": 9, "computation_score": 9}"#);
        let config = DebateConfig::new(2, 2)
            .with_critic(CriticMode::Local)
            .with_restart_threshold(5.0);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert!(transcript.rounds[1]
            .states
            .iter()
            .all(|s| s.prompt_kind == PromptKind::Debate));
    }

    #[tokio::test]
    async fn test_fallback_critiques_do_not_trigger_restart() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new("The solutions look plausible.");
        let config = DebateConfig::new(2, 2)
            .with_critic(CriticMode::Global)
            .with_restart_threshold(5.0);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert!(transcript.rounds[0]
            .states
            .iter()
            .all(|s| s.scores.as_ref().is_some_and(Critique::is_fallback)));
        assert!(transcript.rounds[1]
            .states
            .iter()
            .all(|s| s.prompt_kind == PromptKind::Debate));
    }

    #[tokio::test]
    async fn test_restart_ignores_agent_missing_from_global_critique() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new(
            r#"{"agents":[{"id":0,"logic_score":2,"computation_score":3}]}"#,
        );
        let config = DebateConfig::new(2, 2)
            .with_critic(CriticMode::Global)
            .with_restart_threshold(5.0);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert!(transcript.rounds[0].states[1]
            .scores
            .as_ref()
            .is_some_and(Critique::is_fallback));
        assert!(transcript.rounds[1]
            .states
            .iter()
            .all(|s| s.prompt_kind == PromptKind::Restart));
    }

    #[tokio::test]
    async fn test_no_restart_when_scored_agent_is_high() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new(
            r#"{"agents":[{"id":0,"logic_score":9,"computation_score":9}]}"#,
        );
        let config = DebateConfig::new(2, 2)
            .with_critic(CriticMode::Global)
            .with_restart_threshold(5.0);
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let transcript = orchestrator.run(&question("7")).await.unwrap();
        assert!(transcript.rounds[1]
            .states
            .iter()
            .all(|s| s.prompt_kind == PromptKind::Debate));
    }

    #[tokio::test]
    async fn test_interrupt_before_first_round() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new("{}");
        let orchestrator =
            DebateOrchestrator::new(&actor, &critic, DebateConfig::new(3, 2), logger()).unwrap();
        orchestrator.interrupt_handle().store(true, Ordering::SeqCst);

        let err = orchestrator.run(&question("7")).await.unwrap_err();
        assert!(matches!(err, DebateError::Interrupted { completed_rounds: 0 }));
        assert_eq!(actor.call_count(), 0);
    }

    struct SlowOracle;

    #[async_trait::async_trait]
    impl Oracle for SlowOracle {
        fn name(&self) -> &str {
            "slow"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn complete(
            &self,
            _prompt: &str,
            _params: &madcritic_oracle::GenerationParams,
        ) -> Result<madcritic_oracle::Completion, OracleError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(madcritic_oracle::Completion::new("\\boxed{1}".into(), Duration::ZERO))
        }
    }

    #[tokio::test]
    async fn test_timeout_discards_partial_round() {
        let actor = SlowOracle;
        let critic = ScriptedOracle::new("{}");
        let config = DebateConfig::new(2, 2).with_question_timeout(Duration::from_millis(20));
        let orchestrator = DebateOrchestrator::new(&actor, &critic, config, logger()).unwrap();

        let err = orchestrator.run(&question("7")).await.unwrap_err();
        assert!(matches!(err, DebateError::TimedOut { completed_rounds: 0, .. }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let actor = ScriptedOracle::new("x");
        let critic = ScriptedOracle::new("x");
        let result = DebateOrchestrator::new(&actor, &critic, DebateConfig::new(0, 1), logger());
        assert!(matches!(result, Err(ConfigError::NoAgents)));
    }

    #[test]
    fn test_roles_assigned() {
        let config = DebateConfig::new(3, 1).with_roles(vec![Role::Logician, Role::Programmer]);
        assert_eq!(config.role_for(2), Role::Logician);
    }
}
