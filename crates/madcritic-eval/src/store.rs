use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{EvalSummary, QuestionOutcome};

/// Each line type in a run JSONL file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunLine {
    RunStart(RunStart),
    Question(QuestionOutcome),
    RunEnd(RunEnd),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStart {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub dataset: String,
    pub questions: usize,
    /// Effective configuration the run was started with
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEnd {
    pub timestamp: DateTime<Utc>,
    pub interrupted: bool,
    pub duration_secs: f64,
    pub summary: EvalSummary,
}

/// A fully parsed run file
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: String,
    pub start: RunStart,
    /// One outcome per question; a later line for the same id replaces the
    /// earlier one
    pub outcomes: Vec<QuestionOutcome>,
    /// The last `run_end` line; missing when the run was killed before
    /// finishing
    pub end: Option<RunEnd>,
}

impl RunRecord {
    /// Ids a resumed run should skip
    pub fn settled_ids(&self) -> HashSet<String> {
        self.outcomes
            .iter()
            .filter(|o| o.is_settled())
            .map(|o| o.question_id().to_string())
            .collect()
    }

    /// Outcomes a resumed run keeps as they are
    pub fn settled_outcomes(&self) -> Vec<QuestionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.is_settled())
            .cloned()
            .collect()
    }
}

/// Writes one evaluation run as JSONL, a line per question outcome.
pub struct RunWriter {
    file: BufWriter<File>,
    path: PathBuf,
    run_id: String,
}

impl RunWriter {
    /// Create `<output_dir>/<UTC timestamp>_<config hash>.jsonl` and write
    /// the `run_start` line.
    pub fn create(
        output_dir: &Path,
        dataset: &str,
        questions: usize,
        config: serde_json::Value,
    ) -> io::Result<Self> {
        fs::create_dir_all(output_dir)?;

        let now = Utc::now();
        let timestamp_str = now.format("%Y-%m-%dT%H-%M-%SZ").to_string();

        let mut hasher = Sha256::new();
        hasher.update(config.to_string().as_bytes());
        let hash = hex::encode(hasher.finalize());
        let short_hash = &hash[..6];

        let path = output_dir.join(format!("{}_{}.jsonl", timestamp_str, short_hash));
        let file = BufWriter::new(File::create(&path)?);
        let run_id = uuid::Uuid::new_v4().to_string();

        let mut writer = Self {
            file,
            path,
            run_id: run_id.clone(),
        };
        writer.write_line(&RunLine::RunStart(RunStart {
            run_id,
            timestamp: now,
            dataset: dataset.to_string(),
            questions,
            config,
        }))?;
        Ok(writer)
    }

    /// Reopen an existing run file for appending.
    ///
    /// Returns the writer together with what the file already holds, so the
    /// caller can skip settled questions. The run id is kept.
    pub fn resume(path: &Path) -> Result<(Self, RunRecord)> {
        let record = read_run(path)?;
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open run file for appending: {:?}", path))?;
        let writer = Self {
            file: BufWriter::new(file),
            path: path.to_path_buf(),
            run_id: record.start.run_id.clone(),
        };
        Ok((writer, record))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn write_outcome(&mut self, outcome: &QuestionOutcome) -> io::Result<()> {
        self.write_line(&RunLine::Question(outcome.clone()))
    }

    /// Write the `run_end` line and return the file path
    pub fn finish(
        mut self,
        summary: &EvalSummary,
        interrupted: bool,
        duration_secs: f64,
    ) -> io::Result<PathBuf> {
        self.write_line(&RunLine::RunEnd(RunEnd {
            timestamp: Utc::now(),
            interrupted,
            duration_secs,
            summary: summary.clone(),
        }))?;
        Ok(self.path)
    }

    fn write_line(&mut self, line: &RunLine) -> io::Result<()> {
        let json = serde_json::to_string(line)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(self.file, "{}", json)?;
        self.file.flush()
    }
}

/// Parse a run file written by [`RunWriter`].
pub fn read_run(path: &Path) -> Result<RunRecord> {
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    let file = File::open(path).with_context(|| format!("Failed to open run file: {:?}", path))?;
    let reader = BufReader::new(file);

    let mut start: Option<RunStart> = None;
    let mut outcomes: Vec<QuestionOutcome> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut end: Option<RunEnd> = None;

    for line in reader.lines() {
        let line = line.with_context(|| "Failed to read line from run file")?;
        if line.trim().is_empty() {
            continue;
        }

        let run_line: RunLine = serde_json::from_str(&line).with_context(|| {
            format!(
                "Failed to parse run line: {}",
                line.chars().take(100).collect::<String>()
            )
        })?;

        match run_line {
            RunLine::RunStart(s) => start = Some(s),
            RunLine::Question(o) => match positions.get(o.question_id()).copied() {
                Some(i) => outcomes[i] = o,
                None => {
                    positions.insert(o.question_id().to_string(), outcomes.len());
                    outcomes.push(o);
                }
            },
            RunLine::RunEnd(e) => end = Some(e),
        }
    }

    let start = start.with_context(|| "Run file missing run_start line")?;

    Ok(RunRecord {
        id,
        start,
        outcomes,
        end,
    })
}

/// `<data dir>/madcritic/runs`, or `./runs` when no data dir is known
pub fn default_output_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("madcritic").join("runs"))
        .unwrap_or_else(|| PathBuf::from("runs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureCause;
    use serde_json::json;

    #[test]
    fn test_file_name_has_config_hash() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RunWriter::create(dir.path(), "gsm", 2, json!({"agents": 3})).unwrap();
        let name = writer.path().file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.ends_with(".jsonl"));
        let hash = name.trim_end_matches(".jsonl").rsplit('_').next().unwrap();
        assert_eq!(hash.len(), 6);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_missing_end_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RunWriter::create(dir.path(), "gsm", 1, json!({})).unwrap();
        writer
            .write_outcome(&QuestionOutcome::Failed {
                question_id: "q1".into(),
                cause: FailureCause::Interrupted,
                message: "stopped".into(),
            })
            .unwrap();
        let path = writer.path().to_path_buf();
        drop(writer);

        let run = read_run(&path).unwrap();
        assert_eq!(run.start.dataset, "gsm");
        assert_eq!(run.outcomes.len(), 1);
        assert!(run.end.is_none());
    }

    #[test]
    fn test_later_line_replaces_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RunWriter::create(dir.path(), "gsm", 2, json!({})).unwrap();
        let interrupted = QuestionOutcome::Failed {
            question_id: "q1".into(),
            cause: FailureCause::Interrupted,
            message: "stopped".into(),
        };
        let timed_out = QuestionOutcome::Failed {
            question_id: "q2".into(),
            cause: FailureCause::Timeout,
            message: "slow".into(),
        };
        writer.write_outcome(&interrupted).unwrap();
        writer.write_outcome(&timed_out).unwrap();
        let path = writer.path().to_path_buf();
        drop(writer);

        let (mut writer, record) = RunWriter::resume(&path).unwrap();
        assert_eq!(record.settled_ids(), HashSet::from(["q2".to_string()]));
        assert_eq!(writer.run_id(), record.start.run_id);

        let retried = QuestionOutcome::Failed {
            question_id: "q1".into(),
            cause: FailureCause::Timeout,
            message: "slow again".into(),
        };
        writer.write_outcome(&retried).unwrap();
        drop(writer);

        let run = read_run(&path).unwrap();
        assert_eq!(run.outcomes.len(), 2);
        assert_eq!(run.outcomes[0], retried);
        assert_eq!(run.outcomes[1], timed_out);
    }

    #[test]
    fn test_resume_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RunWriter::resume(&dir.path().join("absent.jsonl")).is_err());
    }

    #[test]
    fn test_missing_start_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jsonl");
        fs::write(&path, "\n").unwrap();
        assert!(read_run(&path).is_err());
    }
}
