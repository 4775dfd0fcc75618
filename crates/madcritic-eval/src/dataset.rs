use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use madcritic_core::{Answer, Question};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset {0} has no usable questions")]
    Empty(String),
}

/// One line of a JSONL dataset as written on disk
#[derive(Debug, Deserialize)]
struct RawRecord {
    question: String,
    answer: serde_json::Value,
    #[serde(default)]
    id: Option<serde_json::Value>,
}

/// Questions loaded from a JSONL file
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    questions: Vec<Question>,
    skipped: usize,
}

impl Dataset {
    /// Load a JSONL dataset. Malformed lines are skipped and counted.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();
        Self::parse(name, &contents)
    }

    pub fn parse(name: impl Into<String>, contents: &str) -> Result<Self, DatasetError> {
        let name = name.into();
        let mut questions = Vec::new();
        let mut skipped = 0;

        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line_no, line) {
                Ok(question) => questions.push(question),
                Err(reason) => {
                    warn!(dataset = %name, line = line_no + 1, %reason, "Skipping dataset line");
                    skipped += 1;
                }
            }
        }

        if questions.is_empty() {
            return Err(DatasetError::Empty(name));
        }

        debug!(dataset = %name, questions = questions.len(), skipped, "Loaded dataset");
        Ok(Self {
            name,
            questions,
            skipped,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Lines that could not be turned into a question
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Pick the subset of questions to evaluate
    pub fn select(&self, selection: &Selection) -> Vec<Question> {
        let mut ordered: Vec<&Question> = self.questions.iter().collect();
        if let Some(seed) = selection.seed {
            ordered.sort_by_cached_key(|q| shuffle_key(seed, &q.id));
        }
        let take = selection.sample_count.unwrap_or(usize::MAX);
        ordered
            .into_iter()
            .skip(selection.offset)
            .take(take)
            .cloned()
            .collect()
    }
}

/// Which questions of a dataset to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub offset: usize,
    pub sample_count: Option<usize>,
    /// Reorder reproducibly before slicing
    pub seed: Option<u64>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = Some(count);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn shuffle_key(seed: u64, id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(id.as_bytes());
    hex::encode(hasher.finalize())
}

fn parse_line(line_no: usize, line: &str) -> Result<Question, String> {
    let record: RawRecord = serde_json::from_str(line).map_err(|e| e.to_string())?;

    let gold = match &record.answer {
        serde_json::Value::String(s) => parse_gold(s),
        serde_json::Value::Number(n) => Answer::parse(&n.to_string()),
        _ => None,
    }
    .ok_or_else(|| format!("unusable gold answer: {}", record.answer))?;

    let id = match record.id {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => line_no.to_string(),
    };

    if record.question.trim().is_empty() {
        return Err("empty question".to_string());
    }

    Ok(Question::new(id, record.question, gold))
}

/// Gold answers are either a bare number or a worked solution ending in
/// `#### <number>`.
pub fn parse_gold(raw: &str) -> Option<Answer> {
    let tail = match raw.rfind("####") {
        Some(pos) => &raw[pos + 4..],
        None => raw,
    };
    Answer::parse(tail.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#####"{"question": "What is 2+2?", "answer": "2+2=4\n#### 4"}
{"question": "Big number", "answer": "#### 1,234", "id": "big"}
not json at all
{"question": "No gold", "answer": "unknown"}

{"question": "Numeric gold", "answer": 12.5, "id": 7}
"#####;

    #[test]
    fn test_parse_skips_malformed() {
        let dataset = Dataset::parse("sample", SAMPLE).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.skipped(), 2);

        let ids: Vec<&str> = dataset.questions().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "big", "7"]);
        assert_eq!(dataset.questions()[1].gold_answer.as_str(), "1234");
        assert_eq!(dataset.questions()[2].gold_answer.as_str(), "12.5");
    }

    #[test]
    fn test_empty_dataset_is_error() {
        let result = Dataset::parse("empty", "garbage\n\n");
        assert!(matches!(result, Err(DatasetError::Empty(_))));
    }

    #[test]
    fn test_parse_gold() {
        assert_eq!(parse_gold("work...\n#### 72"), Answer::parse("72"));
        assert_eq!(parse_gold("18"), Answer::parse("18"));
        assert_eq!(parse_gold("#### -3"), Answer::parse("-3"));
        assert_eq!(parse_gold("n/a"), None);
    }

    fn numbered(n: usize) -> Dataset {
        let contents: String = (0..n)
            .map(|i| format!("{{\"question\": \"q{}\", \"answer\": \"{}\"}}\n", i, i))
            .collect();
        Dataset::parse("numbered", &contents).unwrap()
    }

    #[test]
    fn test_select_offset_and_count() {
        let dataset = numbered(10);
        let picked = dataset.select(&Selection::new().with_offset(3).with_sample_count(2));
        let ids: Vec<&str> = picked.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "4"]);

        assert_eq!(dataset.select(&Selection::new()).len(), 10);
        assert!(dataset.select(&Selection::new().with_offset(20)).is_empty());
    }

    #[test]
    fn test_seeded_select_is_reproducible() {
        let dataset = numbered(20);
        let selection = Selection::new().with_seed(42).with_sample_count(5);
        let first: Vec<String> = dataset.select(&selection).into_iter().map(|q| q.id).collect();
        let second: Vec<String> = dataset.select(&selection).into_iter().map(|q| q.id).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);

        let other: Vec<String> = dataset
            .select(&Selection::new().with_seed(7))
            .into_iter()
            .map(|q| q.id)
            .collect();
        let unshuffled: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        assert_ne!(other, unshuffled);
    }
}
