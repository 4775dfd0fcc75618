use std::borrow::Cow;

use madcritic_oracle::{GenerationParams, Oracle};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{
    extract_answer, AgentState, DebatePrompts, PromptKind, Question, Role, RoundError,
    RoundRecord,
};

/// Inputs for one agent's turn in one round
#[derive(Clone, Copy)]
pub struct RoundInput<'a> {
    pub question: &'a Question,
    pub round_number: usize,
    pub agent_index: usize,
    pub role: Role,
    /// The previous round in full; `None` for round 1. The agent's own prior
    /// state is the entry at `agent_index`, every other entry is a peer.
    pub prior: Option<&'a RoundRecord>,
    /// Attach critiques from `prior` to the prompt
    pub critic_enabled: bool,
    /// Use the from-scratch prompt instead of the debate prompt
    pub restart: bool,
}

impl<'a> RoundInput<'a> {
    pub fn prompt_kind(&self) -> PromptKind {
        match self.prior {
            None => PromptKind::Initial,
            Some(_) if self.restart => PromptKind::Restart,
            Some(_) => PromptKind::Debate,
        }
    }

    /// Build the prompt this agent sees
    pub fn build_prompt(&self) -> String {
        let question = self.question.prompt_text.as_str();
        match (self.prompt_kind(), self.prior) {
            (PromptKind::Debate, Some(prior)) => DebatePrompts::debate(
                question,
                prior.state(self.agent_index),
                prior.peers_of(self.agent_index),
                self.critic_enabled,
                self.role,
            ),
            (PromptKind::Restart, Some(prior)) => {
                DebatePrompts::restart(question, prior.state(self.agent_index), self.role)
            }
            _ => DebatePrompts::initial(question, self.role),
        }
    }
}

/// Runs one reasoning agent for one round
pub struct RoundExecutor<'a> {
    oracle: &'a dyn Oracle,
    params: &'a GenerationParams,
}

impl<'a> RoundExecutor<'a> {
    pub fn new(oracle: &'a dyn Oracle, params: &'a GenerationParams) -> Self {
        Self { oracle, params }
    }

    /// Produce this agent's state for the round.
    ///
    /// An oracle failure is returned as an error rather than an empty answer
    /// so the caller can record the slot as failed.
    pub async fn run_round(&self, input: RoundInput<'_>) -> Result<AgentState, RoundError> {
        let prompt = input.build_prompt();
        let prompt_kind = input.prompt_kind();
        let params = self.params_for(&input);

        debug!(
            question_id = %input.question.id,
            round = input.round_number,
            agent = input.agent_index,
            kind = %prompt_kind,
            prompt_len = prompt.len(),
            "Running agent"
        );

        let completion = self
            .oracle
            .complete(&prompt, &params)
            .await
            .map_err(|source| RoundError::Oracle {
                agent: input.agent_index,
                round: input.round_number,
                source,
            })?;

        let extracted_answer = extract_answer(&completion.text);
        if extracted_answer.is_none() {
            debug!(
                question_id = %input.question.id,
                round = input.round_number,
                agent = input.agent_index,
                "No parseable answer in completion"
            );
        }

        Ok(AgentState {
            agent_index: input.agent_index,
            round_number: input.round_number,
            role: input.role,
            prompt_kind,
            raw_text: completion.text,
            extracted_answer,
            scores: None,
            failure: None,
            critic_failure: None,
            duration_secs: completion.duration.as_secs_f64(),
        })
    }
}

impl RoundExecutor<'_> {
    /// Sampling parameters for one call.
    ///
    /// A configured seed is a base: every (question, agent, round) gets its
    /// own derived seed so agents sharing a prompt still sample differently.
    fn params_for(&self, input: &RoundInput<'_>) -> Cow<'_, GenerationParams> {
        match self.params.seed {
            Some(base) => {
                let mut params = self.params.clone();
                params.seed = Some(call_seed(
                    base,
                    &input.question.id,
                    input.agent_index,
                    input.round_number,
                ));
                Cow::Owned(params)
            }
            None => Cow::Borrowed(self.params),
        }
    }
}

/// Stable per-call seed from the run seed and the call's coordinates
pub(crate) fn call_seed(base: u64, question_id: &str, agent: usize, round: usize) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(question_id.as_bytes());
    hasher.update([0u8]);
    hasher.update((agent as u64).to_le_bytes());
    hasher.update((round as u64).to_le_bytes());
    hasher
        .finalize()
        .iter()
        .take(8)
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}
