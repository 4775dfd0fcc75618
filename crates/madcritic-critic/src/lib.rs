mod critique;
mod parse;
mod prompts;
mod scorer;

pub use critique::{Critique, ParseStatus, PartialCritique, MAX_SCORE};
pub use parse::{extract_json_block, parse_global, parse_local, recover_json, sanitize_json};
pub use prompts::{Candidate, CriticPrompts};
pub use scorer::{CriticScorer, EvaluationError};
