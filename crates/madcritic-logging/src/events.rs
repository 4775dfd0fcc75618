use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured progress events for a debate evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    RunStarted {
        run_id: String,
        dataset: String,
        questions: usize,
        agents: usize,
        rounds: usize,
        critic: String,
    },
    QuestionStarted {
        question_id: String,
        position: usize,
        total: usize,
    },
    RoundStarted {
        question_id: String,
        round: usize,
        /// Which prompt family the round uses (initial, debate, restart)
        prompt: String,
    },
    AgentCompleted {
        question_id: String,
        round: usize,
        agent: usize,
        answer: Option<String>,
        duration_secs: f64,
    },
    AgentFailed {
        question_id: String,
        round: usize,
        agent: usize,
        error: String,
    },
    CriticCompleted {
        question_id: String,
        round: usize,
        mode: String,
        mean_score: f64,
        fallbacks: usize,
    },
    CriticFailed {
        question_id: String,
        round: usize,
        agent: Option<usize>,
        error: String,
    },
    QuestionFinalized {
        question_id: String,
        initial_majority: Option<String>,
        majority: Option<String>,
        gold: String,
        correct: bool,
        duration_secs: f64,
    },
    QuestionFailed {
        question_id: String,
        cause: String,
        error: String,
    },
    RunCompleted {
        completed: usize,
        failed: usize,
        accuracy: f64,
        duration_secs: f64,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

fn answer_or_dash(answer: &Option<String>) -> &str {
    answer.as_deref().unwrap_or("N/A")
}

/// Logger for debate events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    quiet: bool,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            quiet: false,
            file_writer: None,
        }
    }

    /// A logger that writes nothing to the console
    pub fn quiet() -> Self {
        Self {
            format: LogFormat::Compact,
            quiet: true,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            quiet: false,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if self.quiet {
            return;
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::RunStarted {
                dataset,
                questions,
                agents,
                rounds,
                critic,
                ..
            } => {
                let rule = "─".repeat(69);
                let _ = writeln!(stderr);
                let _ = writeln!(stderr, "{}", format!("╭{}╮", rule).bright_blue());
                let _ = writeln!(
                    stderr,
                    "{}  {}",
                    "│".bright_blue(),
                    "madcritic".bold().bright_white()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Dataset:".dimmed(),
                    Self::truncate(dataset, 58).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {} questions, {} agents x {} rounds, critic {}",
                    "│".bright_blue(),
                    "Run:".dimmed(),
                    questions,
                    agents,
                    rounds,
                    critic.bright_magenta()
                );
                let _ = writeln!(stderr, "{}", format!("╰{}╯", rule).bright_blue());
                let _ = writeln!(stderr);
            }
            LogEvent::QuestionStarted {
                question_id,
                position,
                total,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} {}",
                    format!("┌─ [{}/{}]", position + 1, total).bright_blue().bold(),
                    question_id.bold()
                );
            }
            LogEvent::RoundStarted { round, prompt, .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} {}",
                    "▶".bright_cyan(),
                    format!("ROUND {}", round).bright_cyan().bold(),
                    prompt.dimmed()
                );
            }
            LogEvent::AgentCompleted {
                agent,
                answer,
                duration_secs,
                ..
            } => {
                let mark = if answer.is_some() {
                    "✓".bright_green()
                } else {
                    "?".bright_yellow()
                };
                let _ = writeln!(
                    stderr,
                    "    {} agent {} → {} ({:.1}s)",
                    mark,
                    agent,
                    answer_or_dash(answer),
                    duration_secs
                );
            }
            LogEvent::AgentFailed { agent, error, .. } => {
                let _ = writeln!(
                    stderr,
                    "    {} agent {} failed: {}",
                    "✗".bright_red(),
                    agent,
                    error.bright_red()
                );
            }
            LogEvent::CriticCompleted {
                mode,
                mean_score,
                fallbacks,
                ..
            } => {
                let note = if *fallbacks > 0 {
                    format!(", {} unparsed", fallbacks).bright_yellow().to_string()
                } else {
                    String::new()
                };
                let _ = writeln!(
                    stderr,
                    "    {} critic ({}) mean {:.1}{}",
                    "◆".bright_magenta(),
                    mode,
                    mean_score,
                    note
                );
            }
            LogEvent::CriticFailed { agent, error, .. } => {
                let who = agent
                    .map(|a| format!(" for agent {}", a))
                    .unwrap_or_default();
                let _ = writeln!(
                    stderr,
                    "    {} critic failed{}: {}",
                    "✗".bright_red(),
                    who,
                    error.bright_red()
                );
            }
            LogEvent::QuestionFinalized {
                initial_majority,
                majority,
                gold,
                correct,
                duration_secs,
                ..
            } => {
                let verdict = if *correct {
                    "correct".bright_green().bold()
                } else {
                    "wrong".bright_red().bold()
                };
                let _ = writeln!(
                    stderr,
                    "{} {} → {} (gold {}) {} ({:.1}s)",
                    "└─".bright_blue(),
                    answer_or_dash(initial_majority),
                    answer_or_dash(majority),
                    gold,
                    verdict,
                    duration_secs
                );
                let _ = writeln!(stderr);
            }
            LogEvent::QuestionFailed {
                question_id,
                cause,
                error,
            } => {
                let _ = writeln!(
                    stderr,
                    "{} {} {}: {}",
                    "└─".bright_blue(),
                    question_id,
                    cause.bright_red().bold(),
                    error
                );
                let _ = writeln!(stderr);
            }
            LogEvent::RunCompleted { .. } => {
                // The summary table is printed by the caller
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::RunStarted {
                questions,
                agents,
                rounds,
                critic,
                ..
            } => format!(
                "[{}] run:start q={} n={} r={} critic={}",
                timestamp, questions, agents, rounds, critic
            ),
            LogEvent::QuestionStarted { question_id, .. } => {
                format!("[{}] q:start:{}", timestamp, question_id)
            }
            LogEvent::RoundStarted {
                question_id,
                round,
                prompt,
            } => format!("[{}] round:{}:{} {}", timestamp, question_id, round, prompt),
            LogEvent::AgentCompleted {
                question_id,
                round,
                agent,
                answer,
                duration_secs,
            } => format!(
                "[{}] agent:{}:{}:{} ans={} {:.1}s",
                timestamp,
                question_id,
                round,
                agent,
                answer_or_dash(answer),
                duration_secs
            ),
            LogEvent::AgentFailed {
                question_id,
                round,
                agent,
                error,
            } => format!(
                "[{}] agent:fail:{}:{}:{} {}",
                timestamp, question_id, round, agent, error
            ),
            LogEvent::CriticCompleted {
                question_id,
                round,
                mean_score,
                fallbacks,
                ..
            } => format!(
                "[{}] critic:{}:{} mean={:.1} fallbacks={}",
                timestamp, question_id, round, mean_score, fallbacks
            ),
            LogEvent::CriticFailed {
                question_id,
                round,
                error,
                ..
            } => format!(
                "[{}] critic:fail:{}:{} {}",
                timestamp, question_id, round, error
            ),
            LogEvent::QuestionFinalized {
                question_id,
                majority,
                correct,
                ..
            } => format!(
                "[{}] q:done:{} ans={} correct={}",
                timestamp,
                question_id,
                answer_or_dash(majority),
                correct
            ),
            LogEvent::QuestionFailed {
                question_id, cause, ..
            } => format!("[{}] q:fail:{} {}", timestamp, question_id, cause),
            LogEvent::RunCompleted {
                completed,
                failed,
                accuracy,
                duration_secs,
            } => format!(
                "[{}] run:done ok={} failed={} acc={:.3} {:.1}s",
                timestamp, completed, failed, accuracy, duration_secs
            ),
        };
        let _ = writeln!(stderr, "{}", msg);
    }

    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() > max_len {
            let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", head)
        } else {
            s.to_string()
        }
    }
}
