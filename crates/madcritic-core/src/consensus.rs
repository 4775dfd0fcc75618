use serde::{Deserialize, Serialize};

use crate::{AgentState, Answer};

/// Tally for one distinct answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub answer: Answer,
    pub votes: usize,
    /// Lowest agent index that gave this answer
    pub first_agent: usize,
}

/// Majority vote over one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// `None` when no agent produced a parseable answer
    pub majority_answer: Option<Answer>,
    pub is_correct: bool,
    /// Distinct answers in first-seen order
    pub votes: Vec<VoteCount>,
    /// Agents with no parseable answer (including failed calls)
    pub abstentions: usize,
}

impl Decision {
    pub fn is_no_answer(&self) -> bool {
        self.majority_answer.is_none()
    }

    /// Every voter agrees and nobody abstained
    pub fn is_unanimous(&self) -> bool {
        self.votes.len() == 1 && self.abstentions == 0
    }
}

/// Tally `answers` (in agent-index order) and pick the mode.
///
/// `None` entries abstain. Ties go to the answer whose first voter has the
/// lowest index.
pub fn tally<'a, I>(answers: I) -> (Option<Answer>, Vec<VoteCount>, usize)
where
    I: IntoIterator<Item = Option<&'a Answer>>,
{
    let mut votes: Vec<VoteCount> = Vec::new();
    let mut abstentions = 0;

    for (agent, answer) in answers.into_iter().enumerate() {
        match answer {
            Some(answer) => match votes.iter_mut().find(|v| &v.answer == answer) {
                Some(count) => count.votes += 1,
                None => votes.push(VoteCount {
                    answer: answer.clone(),
                    votes: 1,
                    first_agent: agent,
                }),
            },
            None => abstentions += 1,
        }
    }

    // `votes` is in first-seen order, so the first maximum wins ties
    let mut best: Option<&VoteCount> = None;
    for count in &votes {
        if best.map_or(true, |b| count.votes > b.votes) {
            best = Some(count);
        }
    }
    let majority = best.map(|b| b.answer.clone());

    (majority, votes, abstentions)
}

/// Majority decision over one round's states, checked against `gold`
pub fn aggregate(states: &[AgentState], gold: &Answer) -> Decision {
    let mut ordered: Vec<&AgentState> = states.iter().collect();
    ordered.sort_by_key(|s| s.agent_index);

    let (majority_answer, votes, abstentions) =
        tally(ordered.iter().map(|s| s.extracted_answer.as_ref()));
    let is_correct = majority_answer.as_ref() == Some(gold);

    Decision {
        majority_answer,
        is_correct,
        votes,
        abstentions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PromptKind, Role};

    fn a(s: &str) -> Answer {
        Answer::parse(s).unwrap()
    }

    fn states(answers: &[Option<&str>]) -> Vec<AgentState> {
        answers
            .iter()
            .enumerate()
            .map(|(i, ans)| AgentState {
                agent_index: i,
                round_number: 1,
                role: Role::Default,
                prompt_kind: PromptKind::Initial,
                raw_text: ans.unwrap_or("no idea").to_string(),
                extracted_answer: ans.map(a),
                scores: None,
                failure: None,
                critic_failure: None,
                duration_secs: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_simple_majority() {
        let decision = aggregate(&states(&[Some("5"), Some("5"), Some("7")]), &a("5"));
        assert_eq!(decision.majority_answer, Some(a("5")));
        assert!(decision.is_correct);
    }

    #[test]
    fn test_sentinel_excluded_from_tally() {
        let decision = aggregate(&states(&[Some("5"), Some("7"), None]), &a("7"));
        assert_eq!(decision.majority_answer, Some(a("5")));
        assert!(!decision.is_correct);
        assert_eq!(decision.abstentions, 1);
    }

    #[test]
    fn test_all_abstain_is_no_answer() {
        for gold in ["0", "5"] {
            let decision = aggregate(&states(&[None, None, None]), &a(gold));
            assert!(decision.is_no_answer());
            assert!(!decision.is_correct);
            assert_eq!(decision.abstentions, 3);
        }
    }

    #[test]
    fn test_tie_break_first_seen() {
        let input = states(&[Some("5"), Some("7"), Some("5"), Some("7")]);
        for _ in 0..10 {
            let decision = aggregate(&input, &a("7"));
            assert_eq!(decision.majority_answer, Some(a("5")));
        }

        let input = states(&[Some("7"), Some("5"), Some("5"), Some("7")]);
        assert_eq!(aggregate(&input, &a("7")).majority_answer, Some(a("7")));
    }

    #[test]
    fn test_tie_break_ignores_input_order() {
        let mut input = states(&[Some("5"), Some("7"), Some("5"), Some("7")]);
        input.reverse();
        assert_eq!(aggregate(&input, &a("7")).majority_answer, Some(a("5")));
    }

    #[test]
    fn test_canonical_equality_in_votes() {
        let decision = aggregate(&states(&[Some("5.0"), Some("5"), Some("5.01")]), &a("5"));
        assert_eq!(decision.votes.len(), 2);
        assert_eq!(decision.votes[0].votes, 2);
        assert!(decision.is_correct);
    }

    #[test]
    fn test_unanimous() {
        assert!(aggregate(&states(&[Some("3"), Some("3")]), &a("3")).is_unanimous());
        assert!(!aggregate(&states(&[Some("3"), None]), &a("3")).is_unanimous());
    }
}
