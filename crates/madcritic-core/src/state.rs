use serde::{Deserialize, Serialize};

use madcritic_critic::Critique;

use crate::{Answer, Decision, PromptKind, Question, Role};

/// One agent's output for one round.
///
/// Built once by the round executor (and completed with its critique by the
/// orchestrator before the round is recorded); never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub agent_index: usize,
    pub round_number: usize,
    pub role: Role,
    pub prompt_kind: PromptKind,
    pub raw_text: String,
    pub extracted_answer: Option<Answer>,
    /// Present only when the critic scored this round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Critique>,
    /// The oracle call for this agent failed; `raw_text` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// The critic call for this solution failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critic_failure: Option<String>,
    pub duration_secs: f64,
}

impl AgentState {
    /// A slot for an agent whose oracle call failed
    pub fn failed(
        agent_index: usize,
        round_number: usize,
        role: Role,
        prompt_kind: PromptKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            agent_index,
            round_number,
            role,
            prompt_kind,
            raw_text: String::new(),
            extracted_answer: None,
            scores: None,
            failure: Some(error.into()),
            critic_failure: None,
            duration_secs: 0.0,
        }
    }

    pub fn with_scores(mut self, scores: Critique) -> Self {
        self.scores = Some(scores);
        self
    }

    pub fn with_critic_failure(mut self, error: impl Into<String>) -> Self {
        self.critic_failure = Some(error.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// All agents' states for one round, in agent-index order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_number: usize,
    pub states: Vec<AgentState>,
}

impl RoundRecord {
    pub fn new(round_number: usize, mut states: Vec<AgentState>) -> Self {
        states.sort_by_key(|s| s.agent_index);
        Self {
            round_number,
            states,
        }
    }

    pub fn state(&self, agent_index: usize) -> Option<&AgentState> {
        self.states.get(agent_index)
    }

    /// Every state except `agent_index`'s own
    pub fn peers_of(&self, agent_index: usize) -> impl Iterator<Item = &AgentState> {
        self.states
            .iter()
            .filter(move |s| s.agent_index != agent_index)
    }

    pub fn answers(&self) -> impl Iterator<Item = Option<&Answer>> {
        self.states.iter().map(|s| s.extracted_answer.as_ref())
    }

    pub fn failure_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_failed()).count()
    }

    /// States with a solution, excluding failed oracle calls
    pub fn solved(&self) -> impl Iterator<Item = &AgentState> {
        self.states.iter().filter(|s| !s.is_failed())
    }
}

/// Where a question's debate currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "round", rename_all = "snake_case")]
pub enum DebatePhase {
    Init,
    Round(usize),
    Finalized,
}

impl DebatePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, DebatePhase::Finalized)
    }

    /// The single valid successor in a debate of `total_rounds` rounds.
    pub fn next(self, total_rounds: usize) -> Option<DebatePhase> {
        match self {
            DebatePhase::Init if total_rounds == 0 => Some(DebatePhase::Finalized),
            DebatePhase::Init => Some(DebatePhase::Round(1)),
            DebatePhase::Round(r) if r < total_rounds => Some(DebatePhase::Round(r + 1)),
            DebatePhase::Round(_) => Some(DebatePhase::Finalized),
            DebatePhase::Finalized => None,
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DebatePhase::Init => write!(f, "init"),
            DebatePhase::Round(r) => write!(f, "round {}", r),
            DebatePhase::Finalized => write!(f, "finalized"),
        }
    }
}

/// Mutable per-question state owned by one orchestration task
#[derive(Debug)]
pub struct DebateContext {
    phase: DebatePhase,
    total_rounds: usize,
    rounds: Vec<RoundRecord>,
    restart_pending: bool,
}

impl DebateContext {
    pub fn new(total_rounds: usize) -> Self {
        Self {
            phase: DebatePhase::Init,
            total_rounds,
            rounds: Vec::with_capacity(total_rounds),
            restart_pending: false,
        }
    }

    pub fn phase(&self) -> DebatePhase {
        self.phase
    }

    /// Move to the next phase and return it
    pub fn advance(&mut self) -> DebatePhase {
        if let Some(next) = self.phase.next(self.total_rounds) {
            self.phase = next;
        }
        self.phase
    }

    pub fn completed_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn last_round(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    pub fn push_round(&mut self, record: RoundRecord) {
        self.rounds.push(record);
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    pub fn set_restart_pending(&mut self, pending: bool) {
        self.restart_pending = pending;
    }

    pub fn into_rounds(self) -> Vec<RoundRecord> {
        self.rounds
    }
}

/// The frozen record of one question's debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateTranscript {
    pub question: Question,
    pub rounds: Vec<RoundRecord>,
    /// Majority vote over round 1
    pub initial_decision: Decision,
    /// Majority vote over the final round
    pub decision: Decision,
    pub duration_secs: f64,
}

impl DebateTranscript {
    pub fn first_round(&self) -> Option<&RoundRecord> {
        self.rounds.first()
    }

    pub fn final_round(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    pub fn agent_failures(&self) -> usize {
        self.rounds.iter().map(RoundRecord::failure_count).sum()
    }

    /// Critiques that fell back to defaults across all rounds
    pub fn critic_fallbacks(&self) -> usize {
        self.rounds
            .iter()
            .flat_map(|r| r.states.iter())
            .filter(|s| s.scores.as_ref().is_some_and(Critique::is_fallback))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_walk() {
        let mut ctx = DebateContext::new(2);
        assert_eq!(ctx.phase(), DebatePhase::Init);
        assert_eq!(ctx.advance(), DebatePhase::Round(1));
        assert_eq!(ctx.advance(), DebatePhase::Round(2));
        assert_eq!(ctx.advance(), DebatePhase::Finalized);
        assert_eq!(ctx.advance(), DebatePhase::Finalized);
        assert!(ctx.phase().is_terminal());
    }

    #[test]
    fn test_round_record_orders_by_agent() {
        let states = vec![
            AgentState::failed(2, 1, Role::Default, PromptKind::Initial, "x"),
            AgentState::failed(0, 1, Role::Default, PromptKind::Initial, "x"),
            AgentState::failed(1, 1, Role::Default, PromptKind::Initial, "x"),
        ];
        let record = RoundRecord::new(1, states);
        let order: Vec<usize> = record.states.iter().map(|s| s.agent_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(record.peers_of(1).count(), 2);
        assert_eq!(record.failure_count(), 3);
    }

    #[test]
    fn test_phase_serializes() {
        let json = serde_json::to_value(DebatePhase::Round(2)).unwrap();
        assert_eq!(json["phase"], "round");
        assert_eq!(json["round"], 2);
    }
}
