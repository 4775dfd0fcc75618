mod answer;
mod config;
mod consensus;
mod error;
mod orchestrator;
mod prompts;
mod question;
mod round;
mod state;

pub use answer::{extract_answer, Answer};
pub use config::{CriticMode, DebateConfig};
pub use consensus::{aggregate, tally, Decision, VoteCount};
pub use error::{ConfigError, DebateError, RoundError};
pub use orchestrator::DebateOrchestrator;
pub use prompts::{DebatePrompts, PromptKind, Role};
pub use question::Question;
pub use round::{RoundExecutor, RoundInput};
pub use state::{AgentState, DebateContext, DebatePhase, DebateTranscript, RoundRecord};
