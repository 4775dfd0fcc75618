use serde::{Deserialize, Serialize};

/// Upper bound of both score dimensions
pub const MAX_SCORE: f64 = 10.0;

/// How much of the critic's structured output could be recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// Both score dimensions were present and numeric
    Parsed,
    /// A structured block was found but some fields fell back to defaults
    Partial,
    /// Nothing usable was found; every field holds its default
    Fallback,
}

/// Structured multi-dimensional assessment of one candidate solution.
///
/// The two dimensions are independent; no relation between them is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    pub logic_score: f64,
    pub computation_score: f64,
    pub critique_text: String,
    #[serde(default = "default_status")]
    pub parse_status: ParseStatus,
}

fn default_status() -> ParseStatus {
    ParseStatus::Parsed
}

impl Critique {
    pub fn new(logic_score: f64, computation_score: f64, critique_text: impl Into<String>) -> Self {
        Self {
            logic_score: clamp_score(logic_score).unwrap_or(0.0),
            computation_score: clamp_score(computation_score).unwrap_or(0.0),
            critique_text: critique_text.into(),
            parse_status: ParseStatus::Parsed,
        }
    }

    /// The all-defaults critique used when the critic output is unusable
    pub fn fallback() -> Self {
        Self {
            logic_score: 0.0,
            computation_score: 0.0,
            critique_text: String::new(),
            parse_status: ParseStatus::Fallback,
        }
    }

    /// Mean of the two dimensions
    pub fn combined(&self) -> f64 {
        (self.logic_score + self.computation_score) / 2.0
    }

    pub fn is_fallback(&self) -> bool {
        self.parse_status == ParseStatus::Fallback
    }

    /// One-line rendering used inside debate prompts
    pub fn summary_line(&self) -> String {
        let text = if self.critique_text.is_empty() {
            "(none)"
        } else {
            self.critique_text.as_str()
        };
        format!(
            "Logic: {:.1}/10 | Computation: {:.1}/10 | Critique: {}",
            self.logic_score, self.computation_score, text
        )
    }
}

/// Clamp into `0..=10`, rejecting NaN and infinities.
pub(crate) fn clamp_score(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value.clamp(0.0, MAX_SCORE))
    } else {
        None
    }
}

/// Keys accepted for the free-text critique, in order of preference
const TEXT_KEYS: [&str; 4] = ["critique", "critique_text", "flaw", "explanation"];

/// A critic record as the oracle actually wrote it.
///
/// Every field is optional and loosely typed; `into_critique` applies the
/// defaults (`0` for scores, empty critique text).
#[derive(Debug, Default)]
pub struct PartialCritique {
    pub logic_score: Option<serde_json::Value>,
    pub computation_score: Option<serde_json::Value>,
    /// Single-score form; fills whichever dimension is missing
    pub score: Option<serde_json::Value>,
    pub critique: Option<serde_json::Value>,
}

impl PartialCritique {
    /// Pick the known keys out of a JSON object, ignoring everything else.
    ///
    /// Each field is looked up on its own, so extra or duplicated keys never
    /// discard the scores.
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            logic_score: map.get("logic_score").cloned(),
            computation_score: map.get("computation_score").cloned(),
            score: map.get("score").cloned(),
            critique: TEXT_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find(|value| !value.is_null())
                .cloned(),
        }
    }

    pub fn into_critique(self) -> Critique {
        let legacy = self.score.as_ref().and_then(score_of);
        let logic = self.logic_score.as_ref().and_then(score_of).or(legacy);
        let computation = self.computation_score.as_ref().and_then(score_of).or(legacy);
        let critique_text = self.critique.as_ref().map(text_of).unwrap_or_default();

        let parse_status = match (logic, computation) {
            (Some(_), Some(_)) => ParseStatus::Parsed,
            (None, None) if critique_text.is_empty() => ParseStatus::Fallback,
            _ => ParseStatus::Partial,
        };

        Critique {
            logic_score: logic.unwrap_or(0.0),
            computation_score: computation.unwrap_or(0.0),
            critique_text,
            parse_status,
        }
    }
}

/// Accepts JSON numbers and numeric strings such as `"8.5"` or `"7/10"`.
fn score_of(value: &serde_json::Value) -> Option<f64> {
    let raw = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let s = s.trim();
            let head = s.split('/').next().unwrap_or(s).trim();
            head.parse::<f64>().ok()
        }
        _ => None,
    }?;
    clamp_score(raw)
}

fn text_of(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
