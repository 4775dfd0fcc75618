use serde::{Deserialize, Serialize};

use crate::AgentState;

/// Reasoning persona assigned to an agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Default,
    Logician,
    Programmer,
    Skeptic,
}

impl Role {
    fn preamble(&self) -> &'static str {
        match self {
            Role::Default => "",
            Role::Logician => {
                "You are a meticulous logician. Define every quantity before using it, \
                 write the governing equations explicitly, and justify each deduction.\n\n"
            }
            Role::Programmer => {
                "You are a careful programmer. Treat the problem as a computation: name \
                 each variable, trace its value step by step as a program would, and \
                 double-check every arithmetic operation.\n\n"
            }
            Role::Skeptic => {
                "You are a skeptic. Look for traps in the wording, question every \
                 assumption, and verify the result by an independent check before \
                 committing to it.\n\n"
            }
        }
    }

    fn reminder(&self) -> &'static str {
        match self {
            Role::Default => "",
            Role::Logician => "Remember: verify that each step follows logically from the last.\n",
            Role::Programmer => "Remember: recompute every number yourself before trusting it.\n",
            Role::Skeptic => "Remember: agreement among agents is not evidence of correctness.\n",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Default => write!(f, "default"),
            Role::Logician => write!(f, "logician"),
            Role::Programmer => write!(f, "programmer"),
            Role::Skeptic => write!(f, "skeptic"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "solver" => Ok(Role::Default),
            "logician" | "logic" => Ok(Role::Logician),
            "programmer" | "coder" => Ok(Role::Programmer),
            "skeptic" | "sceptic" => Ok(Role::Skeptic),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Which prompt family produced a round's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Round 1: independent solve
    Initial,
    /// Round 2+: defend or adopt given peers' solutions
    Debate,
    /// Round 2+ after every solution scored low: solve again from scratch
    Restart,
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptKind::Initial => write!(f, "initial"),
            PromptKind::Debate => write!(f, "debate"),
            PromptKind::Restart => write!(f, "restart"),
        }
    }
}

const ANSWER_FORMAT: &str = "Put your final answer in the form \\boxed{answer}, with the answer as a single number.";

/// Prompt templates for reasoning agents
pub struct DebatePrompts;

impl DebatePrompts {
    /// Round 1 prompt: the question alone
    pub fn initial(question: &str, role: Role) -> String {
        format!(
            "{preamble}Solve the following math problem. Explain your reasoning step by step.\n\n\
             Problem: {question}\n\n\
             {ANSWER_FORMAT}",
            preamble = role.preamble(),
        )
    }

    /// Round 2+ prompt: own previous solution plus every peer's, with
    /// critiques when `show_scores` is set.
    ///
    /// The agent decides for itself whether to defend or adopt; no numeric
    /// cutoff is imposed here.
    pub fn debate<'a>(
        question: &str,
        own: Option<&AgentState>,
        peers: impl IntoIterator<Item = &'a AgentState>,
        show_scores: bool,
        role: Role,
    ) -> String {
        let mut prompt = String::new();
        prompt.push_str(role.preamble());
        prompt.push_str(&format!("Problem: {}\n\n", question));

        prompt.push_str("--- YOUR PREVIOUS SOLUTION ---\n");
        match own {
            Some(state) if !state.is_failed() => {
                prompt.push_str(&state.raw_text);
                prompt.push('\n');
                if show_scores {
                    if let Some(ref critique) = state.scores {
                        prompt.push_str(&format!("Critic: {}\n", critique.summary_line()));
                    }
                }
            }
            _ => prompt.push_str("(You did not produce a solution last round.)\n"),
        }

        prompt.push_str("\n--- OTHER AGENTS' SOLUTIONS ---\n");
        let mut any_peer = false;
        for peer in peers {
            if peer.is_failed() {
                continue;
            }
            any_peer = true;
            prompt.push_str(&format!("\nAgent {}'s solution:\n", peer.agent_index));
            prompt.push_str(&peer.raw_text);
            prompt.push('\n');
            if show_scores {
                if let Some(ref critique) = peer.scores {
                    prompt.push_str(&format!("Critic: {}\n", critique.summary_line()));
                }
            }
        }
        if !any_peer {
            prompt.push_str("No other agent produced a solution last round.\n");
        }

        prompt.push_str("\n--- YOUR TASK ---\n");
        prompt.push_str(
            "Re-examine your solution against the others. If you are confident your \
             answer is correct, defend it and explain where the other solutions go wrong. \
             Adopt another agent's answer only if its reasoning is demonstrably better",
        );
        if show_scores {
            prompt.push_str(
                " (its critic scores are clearly higher than yours) and your own re-check \
                 confirms it",
            );
        }
        prompt.push_str(". Do not conform just because most agents agree.\n");
        prompt.push_str(role.reminder());
        prompt.push_str(ANSWER_FORMAT);
        prompt
    }

    /// Prompt used when every solution in the previous round scored low
    pub fn restart(question: &str, own: Option<&AgentState>, role: Role) -> String {
        let mut prompt = String::new();
        prompt.push_str(role.preamble());

        match own.filter(|s| !s.is_failed()) {
            Some(state) => {
                let answer = state
                    .extracted_answer
                    .as_ref()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "none".to_string());
                prompt.push_str(&format!(
                    "Your previous solution (answer: {}) was judged unreliable.\n",
                    answer
                ));
                if let Some(ref critique) = state.scores {
                    prompt.push_str(&format!("Critic: {}\n", critique.summary_line()));
                }
            }
            None => prompt.push_str("Your previous attempt produced no solution.\n"),
        }

        prompt.push_str(&format!(
            "\nEvery agent's solution scored low, so start over. Do not reuse the earlier \
             setup; read the problem again carefully and solve it from scratch.\n\n\
             Problem: {}\n\n{}",
            question, ANSWER_FORMAT
        ));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use madcritic_critic::Critique;

    fn state(agent: usize, text: &str, scores: Option<Critique>) -> AgentState {
        AgentState {
            agent_index: agent,
            round_number: 1,
            role: Role::Default,
            prompt_kind: PromptKind::Initial,
            raw_text: text.to_string(),
            extracted_answer: crate::extract_answer(text),
            scores,
            failure: None,
            critic_failure: None,
            duration_secs: 0.0,
        }
    }

    #[test]
    fn test_initial_has_only_question() {
        let prompt = DebatePrompts::initial("What is 2+2?", Role::Default);
        assert!(prompt.contains("What is 2+2?"));
        assert!(prompt.contains("\\boxed{answer}"));
        assert!(!prompt.contains("OTHER AGENTS"));
    }

    #[test]
    fn test_role_preamble() {
        let prompt = DebatePrompts::initial("q", Role::Skeptic);
        assert!(prompt.starts_with("You are a skeptic."));
    }

    #[test]
    fn test_debate_includes_peers_and_scores() {
        let own = state(0, "I got \\boxed{10}", Some(Critique::new(4.0, 5.0, "setup wrong")));
        let peer = state(1, "I got \\boxed{14}", Some(Critique::new(9.0, 9.0, "none")));
        let failed = AgentState::failed(2, 1, Role::Default, PromptKind::Initial, "timeout");

        let prompt = DebatePrompts::debate("q", Some(&own), [&peer, &failed], true, Role::Default);
        assert!(prompt.contains("I got \\boxed{10}"));
        assert!(prompt.contains("Agent 1's solution"));
        assert!(prompt.contains("Logic: 9.0/10"));
        assert!(prompt.contains("setup wrong"));
        assert!(!prompt.contains("Agent 2's solution"));
    }

    #[test]
    fn test_debate_hides_scores_without_critic() {
        let own = state(0, "\\boxed{10}", Some(Critique::new(4.0, 5.0, "x")));
        let peer = state(1, "\\boxed{14}", None);
        let prompt = DebatePrompts::debate("q", Some(&own), [&peer], false, Role::Default);
        assert!(!prompt.contains("Critic:"));
        assert!(!prompt.contains("critic scores"));
    }

    #[test]
    fn test_restart_carries_own_critique() {
        let own = state(0, "\\boxed{10}", Some(Critique::new(2.0, 3.0, "wrong rate")));
        let prompt = DebatePrompts::restart("q", Some(&own), Role::Default);
        assert!(prompt.contains("answer: 10"));
        assert!(prompt.contains("wrong rate"));
        assert!(prompt.contains("from scratch"));
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Logician".parse::<Role>().unwrap(), Role::Logician);
        assert!("poet".parse::<Role>().is_err());
    }
}
