use std::collections::BTreeSet;

/// One agent's solution as presented to the critic
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Stable agent index, used as the `id` in global-view output
    pub index: usize,
    pub solution: &'a str,
    /// Canonical extracted answer, if any
    pub answer: Option<&'a str>,
}

/// Prompt templates for the critic
pub struct CriticPrompts;

impl CriticPrompts {
    /// Prompt for scoring one solution in isolation
    pub fn local(question: &str, solution: &str) -> String {
        format!(
            r#"You are a Critic agent. Evaluate the proposed solution to a math problem for logical coherence and computation accuracy.

## Problem
{question}

## Proposed Solution
{solution}

## Instructions
First verify one key step of the solution yourself. Then respond with a single JSON object and nothing else:

{{"logic_score": <0-10>, "computation_score": <0-10>, "critique": "<one or two sentences>"}}

- `logic_score`: is the setup of the problem and the chain of reasoning sound? Use 0.5 steps.
- `computation_score`: is every arithmetic step correct? Use 0.5 steps.
- `critique`: name the specific error, or say "none"."#
        )
    }

    /// Prompt for scoring every agent's solution jointly in one call
    pub fn global(question: &str, candidates: &[Candidate<'_>]) -> String {
        let blocks: Vec<String> = candidates
            .iter()
            .map(|c| {
                format!(
                    "Agent {} | Answer: {}\n{}\n",
                    c.index,
                    c.answer.unwrap_or("N/A"),
                    c.solution
                )
            })
            .collect();

        let distinct: BTreeSet<&str> = candidates.iter().filter_map(|c| c.answer).collect();
        let conflict_note = if distinct.len() > 1 {
            format!(
                "Agents gave different answers: {}.",
                distinct.into_iter().collect::<Vec<_>>().join(", ")
            )
        } else {
            "All agents gave the same answer.".to_string()
        };

        let example: Vec<String> = candidates
            .iter()
            .map(|c| {
                format!(
                    r#"{{"id":{},"logic_score":<0-10>,"computation_score":<0-10>,"critique":"<specific error or none>"}}"#,
                    c.index
                )
            })
            .collect();

        format!(
            r#"Problem: {question}

{agents}
{conflict_note}

For each agent, verify step by step:
1. Is the equation setup correct for this problem?
2. Is each calculation step valid?
3. Does the final answer follow from the reasoning?

Scoring rules:
- 8-10: sound logic and a likely correct answer
- 4-7: partially correct reasoning with errors
- 0-3: wrong setup or wrong answer
- If answers differ, at most ONE agent may receive a logic_score of 8 or more
- If every agent's reasoning is flawed, every agent should score 5 or less
- Do not reward clean formatting

Respond with a single JSON object and nothing else:
{{"agents":[{example}]}}"#,
            agents = blocks.join("\n---\n"),
            example = example.join(","),
        )
    }
}
