use colored::Colorize;
use serde::{Deserialize, Serialize};

use madcritic_core::{Answer, Decision, DebateTranscript, RoundRecord};

use crate::{FailureCause, QuestionOutcome};

/// How the majority moved between round 1 and the final round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipCategory {
    CorrectToCorrect,
    CorrectToWrong,
    WrongToCorrect,
    WrongToWrong,
}

impl std::fmt::Display for FlipCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlipCategory::CorrectToCorrect => write!(f, "correct->correct"),
            FlipCategory::CorrectToWrong => write!(f, "correct->wrong"),
            FlipCategory::WrongToCorrect => write!(f, "wrong->correct"),
            FlipCategory::WrongToWrong => write!(f, "wrong->wrong"),
        }
    }
}

pub fn classify_flip(initial: &Decision, last: &Decision) -> FlipCategory {
    match (initial.is_correct, last.is_correct) {
        (true, true) => FlipCategory::CorrectToCorrect,
        (true, false) => FlipCategory::CorrectToWrong,
        (false, true) => FlipCategory::WrongToCorrect,
        (false, false) => FlipCategory::WrongToWrong,
    }
}

pub fn flip_of(transcript: &DebateTranscript) -> FlipCategory {
    classify_flip(&transcript.initial_decision, &transcript.decision)
}

/// Gap between the best combined scores of the two strongest distinct
/// final-round answers. `None` unless at least two scored answers exist.
pub fn stalemate_gap(transcript: &DebateTranscript) -> Option<f64> {
    let last = transcript.final_round()?;
    let mut best: Vec<(&Answer, f64)> = Vec::new();
    for state in &last.states {
        let (Some(answer), Some(scores)) = (&state.extracted_answer, &state.scores) else {
            continue;
        };
        let combined = scores.combined();
        match best.iter_mut().find(|(a, _)| *a == answer) {
            Some(entry) => entry.1 = entry.1.max(combined),
            None => best.push((answer, combined)),
        }
    }
    if best.len() < 2 {
        return None;
    }
    best.sort_by(|a, b| b.1.total_cmp(&a.1));
    Some(best[0].1 - best[1].1)
}

/// Two competing answers scored within `gap` of each other.
///
/// Reporting only; never consulted while a debate runs.
pub fn is_stalemate(transcript: &DebateTranscript, gap: f64) -> bool {
    stalemate_gap(transcript).is_some_and(|g| g < gap)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlipCounts {
    pub correct_to_correct: usize,
    pub correct_to_wrong: usize,
    pub wrong_to_correct: usize,
    pub wrong_to_wrong: usize,
}

impl FlipCounts {
    fn record(&mut self, category: FlipCategory) {
        match category {
            FlipCategory::CorrectToCorrect => self.correct_to_correct += 1,
            FlipCategory::CorrectToWrong => self.correct_to_wrong += 1,
            FlipCategory::WrongToCorrect => self.wrong_to_correct += 1,
            FlipCategory::WrongToWrong => self.wrong_to_wrong += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounts {
    pub timeout: usize,
    pub interrupted: usize,
    pub config: usize,
}

impl FailureCounts {
    pub fn total(&self) -> usize {
        self.timeout + self.interrupted + self.config
    }

    fn record(&mut self, cause: FailureCause) {
        match cause {
            FailureCause::Timeout => self.timeout += 1,
            FailureCause::Interrupted => self.interrupted += 1,
            FailureCause::Config => self.config += 1,
        }
    }
}

/// Mean critic scores over a group of agents
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMeans {
    pub logic: Option<f64>,
    pub computation: Option<f64>,
    pub samples: usize,
}

#[derive(Default)]
struct ScoreAccumulator {
    logic: f64,
    computation: f64,
    samples: usize,
}

impl ScoreAccumulator {
    fn add(&mut self, logic: f64, computation: f64) {
        self.logic += logic;
        self.computation += computation;
        self.samples += 1;
    }

    fn means(&self) -> ScoreMeans {
        if self.samples == 0 {
            return ScoreMeans::default();
        }
        let n = self.samples as f64;
        ScoreMeans {
            logic: Some(self.logic / n),
            computation: Some(self.computation / n),
            samples: self.samples,
        }
    }
}

/// Critic scores split by whether the agent's own answer was right
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub correct: ScoreMeans,
    pub incorrect: ScoreMeans,
}

#[derive(Default)]
struct BreakdownAccumulator {
    correct: ScoreAccumulator,
    incorrect: ScoreAccumulator,
}

impl BreakdownAccumulator {
    fn add_round(&mut self, record: &RoundRecord, gold: &Answer) {
        for state in &record.states {
            let Some(ref scores) = state.scores else {
                continue;
            };
            let group = if state.extracted_answer.as_ref() == Some(gold) {
                &mut self.correct
            } else {
                &mut self.incorrect
            };
            group.add(scores.logic_score, scores.computation_score);
        }
    }

    fn finish(&self) -> ScoreBreakdown {
        ScoreBreakdown {
            correct: self.correct.means(),
            incorrect: self.incorrect.means(),
        }
    }
}

/// Aggregate metrics over one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: FailureCounts,
    /// Final-round majority correct, over all questions
    pub accuracy: f64,
    /// Round-1 majority correct, over all questions
    pub initial_accuracy: f64,
    /// Completed questions whose round-1 majority was wrong
    pub majority_errors: usize,
    pub flips: FlipCounts,
    /// Final decisions where no agent produced an answer
    pub no_answer: usize,
    /// Agent slots whose oracle call failed, summed over rounds
    pub agent_failures: usize,
    pub critic_fallbacks: usize,
    /// Share of agents whose final answer differs from their round-1 answer
    pub answer_change_rate: f64,
    /// Share of completed questions where every final answer is present and equal
    pub consensus_rate: f64,
    pub initial_scores: ScoreBreakdown,
    pub final_scores: ScoreBreakdown,
    pub stalemates: usize,
    pub stalemate_gap: f64,
}

impl EvalSummary {
    pub fn from_outcomes(outcomes: &[QuestionOutcome], stalemate_gap: f64) -> Self {
        let total = outcomes.len();
        let mut failed = FailureCounts::default();
        let mut flips = FlipCounts::default();
        let mut initial_scores = BreakdownAccumulator::default();
        let mut final_scores = BreakdownAccumulator::default();
        let mut completed = 0;
        let mut correct = 0;
        let mut initially_correct = 0;
        let mut majority_errors = 0;
        let mut no_answer = 0;
        let mut agent_failures = 0;
        let mut critic_fallbacks = 0;
        let mut agents_seen = 0;
        let mut answers_changed = 0;
        let mut consensus = 0;
        let mut stalemates = 0;

        for outcome in outcomes {
            let transcript = match outcome {
                QuestionOutcome::Completed(t) => t,
                QuestionOutcome::Failed { cause, .. } => {
                    failed.record(*cause);
                    continue;
                }
            };
            completed += 1;
            let gold = &transcript.question.gold_answer;

            if transcript.decision.is_correct {
                correct += 1;
            }
            if transcript.initial_decision.is_correct {
                initially_correct += 1;
            } else {
                majority_errors += 1;
            }
            if transcript.decision.is_no_answer() {
                no_answer += 1;
            }
            flips.record(flip_of(transcript));
            agent_failures += transcript.agent_failures();
            critic_fallbacks += transcript.critic_fallbacks();
            if is_stalemate(transcript, stalemate_gap) {
                stalemates += 1;
            }

            if let (Some(first), Some(last)) = (transcript.first_round(), transcript.final_round())
            {
                initial_scores.add_round(first, gold);
                final_scores.add_round(last, gold);

                for state in &last.states {
                    agents_seen += 1;
                    let before = first
                        .state(state.agent_index)
                        .and_then(|s| s.extracted_answer.as_ref());
                    if before != state.extracted_answer.as_ref() {
                        answers_changed += 1;
                    }
                }

                let mut answers = last.answers();
                if let Some(Some(head)) = answers.next() {
                    if answers.all(|a| a == Some(head)) {
                        consensus += 1;
                    }
                }
            }
        }

        Self {
            total,
            completed,
            failed,
            accuracy: ratio(correct, total),
            initial_accuracy: ratio(initially_correct, total),
            majority_errors,
            flips,
            no_answer,
            agent_failures,
            critic_fallbacks,
            answer_change_rate: ratio(answers_changed, agents_seen),
            consensus_rate: ratio(consensus, completed),
            initial_scores: initial_scores.finish(),
            final_scores: final_scores.finish(),
            stalemates,
            stalemate_gap,
        }
    }

    pub fn print_summary(&self) {
        println!("{}", "=== Evaluation Summary ===".bright_blue().bold());
        println!(
            "{}  {} total, {} completed, {} failed",
            "Questions:".dimmed(),
            self.total,
            self.completed,
            self.failed.total()
        );
        if self.failed.total() > 0 {
            println!(
                "{}  {} timeout, {} interrupted, {} config",
                "Failures:".dimmed(),
                self.failed.timeout,
                self.failed.interrupted,
                self.failed.config
            );
        }
        println!(
            "{}  {}",
            "Accuracy:".dimmed(),
            format_pct(self.accuracy).bold()
        );
        println!(
            "{}  {}",
            "Round-1 accuracy:".dimmed(),
            format_pct(self.initial_accuracy)
        );
        println!(
            "{}  {}",
            "Consensus rate:".dimmed(),
            format_pct(self.consensus_rate)
        );
        println!(
            "{}  {}",
            "Answer change rate:".dimmed(),
            format_pct(self.answer_change_rate)
        );

        println!();
        println!("{}", "Flips (round 1 -> final):".dimmed());
        println!(
            "  {:<18} {}",
            "correct->correct",
            self.flips.correct_to_correct.to_string().green()
        );
        println!(
            "  {:<18} {}",
            "correct->wrong",
            self.flips.correct_to_wrong.to_string().red()
        );
        println!(
            "  {:<18} {}",
            "wrong->correct",
            self.flips.wrong_to_correct.to_string().green()
        );
        println!(
            "  {:<18} {}",
            "wrong->wrong",
            self.flips.wrong_to_wrong.to_string().red()
        );

        println!();
        println!(
            "{}  {} majority errors, {} no-answer, {} agent failures, {} critic fallbacks",
            "Problems:".dimmed(),
            self.majority_errors,
            self.no_answer,
            self.agent_failures,
            self.critic_fallbacks
        );

        if self.initial_scores.correct.samples + self.initial_scores.incorrect.samples > 0 {
            println!();
            println!("{}", "Critic scores (logic / computation):".dimmed());
            print_breakdown("Round 1", &self.initial_scores);
            print_breakdown("Final", &self.final_scores);
            println!(
                "{}  {} (gap < {:.1})",
                "Stalemates:".dimmed(),
                self.stalemates,
                self.stalemate_gap
            );
        }
    }
}

fn print_breakdown(label: &str, breakdown: &ScoreBreakdown) {
    println!(
        "  {:<8} correct {}   incorrect {}",
        label,
        format_means(&breakdown.correct),
        format_means(&breakdown.incorrect)
    );
}

fn format_means(means: &ScoreMeans) -> String {
    match (means.logic, means.computation) {
        (Some(logic), Some(computation)) => format!("{:.2} / {:.2}", logic, computation),
        _ => "-".to_string(),
    }
}

fn format_pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
