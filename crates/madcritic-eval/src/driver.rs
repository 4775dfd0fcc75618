use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use madcritic_core::{DebateError, DebateOrchestrator, DebateTranscript, Question};
use madcritic_logging::{LogEvent, Logger};

/// Why a question produced no transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    Timeout,
    Interrupted,
    Config,
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCause::Timeout => write!(f, "timeout"),
            FailureCause::Interrupted => write!(f, "interrupted"),
            FailureCause::Config => write!(f, "config"),
        }
    }
}

impl From<&DebateError> for FailureCause {
    fn from(err: &DebateError) -> Self {
        match err {
            DebateError::InvalidConfig(_) => FailureCause::Config,
            DebateError::Interrupted { .. } => FailureCause::Interrupted,
            DebateError::TimedOut { .. } => FailureCause::Timeout,
        }
    }
}

/// Result of running one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuestionOutcome {
    Completed(DebateTranscript),
    Failed {
        question_id: String,
        cause: FailureCause,
        message: String,
    },
}

impl QuestionOutcome {
    pub fn from_result(question_id: &str, result: Result<DebateTranscript, DebateError>) -> Self {
        match result {
            Ok(transcript) => QuestionOutcome::Completed(transcript),
            Err(e) => QuestionOutcome::Failed {
                question_id: question_id.to_string(),
                cause: FailureCause::from(&e),
                message: e.to_string(),
            },
        }
    }

    pub fn question_id(&self) -> &str {
        match self {
            QuestionOutcome::Completed(t) => &t.question.id,
            QuestionOutcome::Failed { question_id, .. } => question_id,
        }
    }

    pub fn transcript(&self) -> Option<&DebateTranscript> {
        match self {
            QuestionOutcome::Completed(t) => Some(t),
            QuestionOutcome::Failed { .. } => None,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.transcript().is_some_and(|t| t.decision.is_correct)
    }

    /// Interrupted questions never ran to an answer; resuming runs them again.
    pub fn is_settled(&self) -> bool {
        !matches!(
            self,
            QuestionOutcome::Failed {
                cause: FailureCause::Interrupted,
                ..
            }
        )
    }
}

/// Runs a debate over many questions with bounded concurrency.
///
/// Every question gets an outcome; a failed question never stops the run.
pub struct EvalDriver<'a> {
    orchestrator: DebateOrchestrator<'a>,
    concurrency: usize,
    logger: Arc<Logger>,
}

impl<'a> EvalDriver<'a> {
    pub fn new(orchestrator: DebateOrchestrator<'a>, logger: Arc<Logger>) -> Self {
        Self {
            orchestrator,
            concurrency: 1,
            logger,
        }
    }

    /// Questions in flight at once (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.orchestrator.interrupt_handle()
    }

    pub fn was_interrupted(&self) -> bool {
        self.orchestrator.interrupt_handle().load(Ordering::SeqCst)
    }

    pub fn orchestrator(&self) -> &DebateOrchestrator<'a> {
        &self.orchestrator
    }

    pub async fn run(&self, questions: &[Question]) -> Vec<QuestionOutcome> {
        self.run_with(questions, |_| {}).await
    }

    /// Run every question, handing each outcome to `on_outcome` as soon as
    /// it is known. Returned outcomes are in input order.
    pub async fn run_with<F>(
        &self,
        questions: &[Question],
        mut on_outcome: F,
    ) -> Vec<QuestionOutcome>
    where
        F: FnMut(&QuestionOutcome),
    {
        let started = Instant::now();
        let total = questions.len();
        info!(
            questions = total,
            concurrency = self.concurrency,
            "Starting evaluation"
        );

        let mut pending = stream::iter(questions.iter().enumerate())
            .map(|(position, question)| async move {
                self.logger.log(&LogEvent::QuestionStarted {
                    question_id: question.id.clone(),
                    position: position + 1,
                    total,
                });
                let result = self.orchestrator.run(question).await;
                (position, QuestionOutcome::from_result(&question.id, result))
            })
            .buffer_unordered(self.concurrency);

        let mut outcomes: Vec<(usize, QuestionOutcome)> = Vec::with_capacity(total);
        while let Some((position, outcome)) = pending.next().await {
            if let QuestionOutcome::Failed {
                question_id,
                cause,
                message,
            } = &outcome
            {
                self.logger.log(&LogEvent::QuestionFailed {
                    question_id: question_id.clone(),
                    cause: cause.to_string(),
                    error: message.clone(),
                });
            }
            on_outcome(&outcome);
            outcomes.push((position, outcome));
        }
        outcomes.sort_by_key(|(position, _)| *position);

        let outcomes: Vec<QuestionOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();
        let completed = outcomes.iter().filter(|o| o.transcript().is_some()).count();
        let correct = outcomes.iter().filter(|o| o.is_correct()).count();
        let accuracy = if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        };
        self.logger.log(&LogEvent::RunCompleted {
            completed,
            failed: total - completed,
            accuracy,
            duration_secs: started.elapsed().as_secs_f64(),
        });

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use madcritic_core::{Answer, DebateConfig};
    use madcritic_oracle::ScriptedOracle;

    fn questions() -> Vec<Question> {
        vec![
            Question::new("a", "alpha: 3+4", Answer::parse("7").unwrap()),
            Question::new("b", "beta: 2*5", Answer::parse("10").unwrap()),
            Question::new("c", "gamma: 9-1", Answer::parse("8").unwrap()),
        ]
    }

    #[tokio::test]
    async fn test_outcomes_in_input_order() {
        let actor = ScriptedOracle::new("\\boxed{0}")
            .on("alpha", "\\boxed{7}")
            .on("beta", "\\boxed{10}");
        let critic = ScriptedOracle::new("{}");
        let logger = Arc::new(Logger::quiet());
        let orchestrator =
            DebateOrchestrator::new(&actor, &critic, DebateConfig::new(2, 1), logger.clone())
                .unwrap();
        let driver = EvalDriver::new(orchestrator, logger).with_concurrency(3);

        let mut seen = 0;
        let outcomes = driver.run_with(&questions(), |_| seen += 1).await;
        assert_eq!(seen, 3);
        let ids: Vec<&str> = outcomes.iter().map(QuestionOutcome::question_id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(outcomes[0].is_correct());
        assert!(outcomes[1].is_correct());
        assert!(!outcomes[2].is_correct());
    }

    #[tokio::test]
    async fn test_interrupt_marks_questions_failed() {
        let actor = ScriptedOracle::new("\\boxed{7}");
        let critic = ScriptedOracle::new("{}");
        let logger = Arc::new(Logger::quiet());
        let orchestrator =
            DebateOrchestrator::new(&actor, &critic, DebateConfig::new(2, 2), logger.clone())
                .unwrap();
        let driver = EvalDriver::new(orchestrator, logger);
        driver.interrupt_handle().store(true, Ordering::SeqCst);

        let outcomes = driver.run(&questions()).await;
        assert_eq!(outcomes.len(), 3);
        assert!(driver.was_interrupted());
        for outcome in &outcomes {
            assert!(matches!(
                outcome,
                QuestionOutcome::Failed {
                    cause: FailureCause::Interrupted,
                    ..
                }
            ));
        }
        assert_eq!(actor.call_count(), 0);
    }

    #[test]
    fn test_outcome_serializes_with_status() {
        let outcome = QuestionOutcome::Failed {
            question_id: "q9".to_string(),
            cause: FailureCause::Timeout,
            message: "too slow".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["cause"], "timeout");
        let back: QuestionOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
