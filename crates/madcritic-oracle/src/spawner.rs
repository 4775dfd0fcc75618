use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::OracleError;

/// Captured result of a child process run
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Utility for running an oracle process that reads its prompt on stdin
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Spawn `binary`, feed `input` on stdin and capture both output streams.
    pub async fn run(
        binary: &Path,
        args: &[String],
        env: &[(String, String)],
        input: &str,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, OracleError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            args = ?args,
            input_len = input.len(),
            "Spawning oracle process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OracleError::Transport("stdin not captured".to_string()))?;
        let stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| OracleError::Transport("stdout not captured".to_string()))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| OracleError::Transport("stderr not captured".to_string()))?;

        let input = input.to_string();
        let writer = tokio::spawn(async move {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await
        });

        let collect = async {
            let mut stdout_reader = BufReader::new(stdout_handle).lines();
            let mut stderr_reader = BufReader::new(stderr_handle).lines();
            let mut stdout = String::new();
            let mut stderr = String::new();
            let mut stdout_open = true;
            let mut stderr_open = true;

            while stdout_open || stderr_open {
                tokio::select! {
                    result = stdout_reader.next_line(), if stdout_open => {
                        let line = result.map_err(|e| {
                            OracleError::Transport(format!("Failed to read stdout: {}", e))
                        })?;
                        match line {
                            Some(line) => {
                                trace!(line = %line, "stdout");
                                push_line(&mut stdout, &line);
                            }
                            None => stdout_open = false,
                        }
                    }
                    result = stderr_reader.next_line(), if stderr_open => {
                        let line = result.map_err(|e| {
                            OracleError::Transport(format!("Failed to read stderr: {}", e))
                        })?;
                        match line {
                            Some(line) => {
                                trace!(line = %line, "stderr");
                                push_line(&mut stderr, &line);
                            }
                            None => stderr_open = false,
                        }
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<_, OracleError>((stdout, stderr, status.code().unwrap_or(-1)))
        };

        let (stdout, stderr, exit_code) = match timeout {
            Some(limit) => tokio::time::timeout(limit, collect)
                .await
                .map_err(|_| OracleError::Timeout(limit))??,
            None => collect.await?,
        };

        // A child that exits without draining stdin yields a broken pipe; only
        // the exit status matters in that case.
        if let Ok(Err(e)) = writer.await {
            trace!(error = %e, "stdin write did not complete");
        }

        let duration = start.elapsed();
        debug!(
            exit_code,
            duration_ms = duration.as_millis(),
            "Oracle process completed"
        );

        Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code,
            duration,
        })
    }
}

fn push_line(buf: &mut String, line: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(line);
}
