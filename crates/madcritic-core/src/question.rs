use serde::{Deserialize, Serialize};

use crate::Answer;

/// One benchmark problem. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt_text: String,
    pub gold_answer: Answer,
}

impl Question {
    pub fn new(id: impl Into<String>, prompt_text: impl Into<String>, gold_answer: Answer) -> Self {
        Self {
            id: id.into(),
            prompt_text: prompt_text.into(),
            gold_answer,
        }
    }
}
