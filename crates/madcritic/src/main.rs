use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use madcritic_core::{CriticMode, Role};
use madcritic_logging::LogFormat;
use madcritic_oracle::OracleKind;

mod config;
mod report;
mod run;

/// Exit code for configuration and dataset errors
const EXIT_CONFIG: i32 = 2;
/// Exit code when Ctrl+C stopped the run
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(
    name = "madcritic",
    about = "Multi-agent debate with a critic, evaluated on math word problems",
    version,
    author
)]
struct Cli {
    /// Diagnostic log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a debate evaluation over a dataset
    Run(RunArgs),

    /// Recompute the summary of a finished run file
    Report {
        /// Path to a run .jsonl file
        run_file: PathBuf,

        /// Score gap under which competing answers count as a stalemate
        #[arg(long)]
        stalemate_gap: Option<f64>,

        /// Output the summary as JSON
        #[arg(long)]
        json_output: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// JSONL dataset with `question` and `answer` fields
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Config file (default: ./madcritic.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of reasoning agents
    #[arg(short = 'n', long)]
    agents: Option<usize>,

    /// Number of debate rounds
    #[arg(short, long)]
    rounds: Option<usize>,

    /// Critic mode
    #[arg(long, value_enum)]
    critic: Option<CriticChoice>,

    /// Comma-separated role set cycled over agents
    #[arg(long, value_delimiter = ',')]
    roles: Vec<Role>,

    /// Restart from scratch when every solution scores below this
    #[arg(long)]
    restart_threshold: Option<f64>,

    /// Oracle adapter for both actor and critic
    #[arg(long, value_enum)]
    oracle: Option<OracleChoice>,

    /// Model name for the HTTP oracle
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Executable for the command oracle
    #[arg(long)]
    command: Option<PathBuf>,

    /// Number of questions to run
    #[arg(long)]
    sample_count: Option<usize>,

    /// Skip this many questions first
    #[arg(long)]
    offset: Option<usize>,

    /// Seed for question sampling and actor generation
    #[arg(long)]
    seed: Option<u64>,

    /// Questions in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Oracle calls in flight at once
    #[arg(long)]
    max_concurrent_calls: Option<usize>,

    /// Score gap under which competing answers count as a stalemate
    #[arg(long)]
    stalemate_gap: Option<f64>,

    /// Directory for run files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Continue an earlier run file, skipping questions it already settled
    #[arg(long, conflicts_with = "output_dir")]
    resume: Option<PathBuf>,

    /// Progress output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Mirror progress events as JSON into this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Output the final summary as JSON
    #[arg(long)]
    json_output: bool,

    /// Show the resolved configuration without calling any oracle
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CriticChoice {
    Off,
    Local,
    Global,
}

impl From<CriticChoice> for CriticMode {
    fn from(choice: CriticChoice) -> Self {
        match choice {
            CriticChoice::Off => CriticMode::Disabled,
            CriticChoice::Local => CriticMode::Local,
            CriticChoice::Global => CriticMode::Global,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OracleChoice {
    Http,
    Command,
}

impl From<OracleChoice> for OracleKind {
    fn from(choice: OracleChoice) -> Self {
        match choice {
            OracleChoice::Http => OracleKind::Http,
            OracleChoice::Command => OracleKind::Command,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => {
            madcritic_logging::init_tracing(&cli.log_level, args.log_format.into());
            run::handle_run_command(args).await
        }
        Commands::Report {
            run_file,
            stalemate_gap,
            json_output,
        } => {
            madcritic_logging::init_tracing(&cli.log_level, LogFormat::Pretty);
            report::handle_report_command(&run_file, stalemate_gap, json_output).map(|_| 0)
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            EXIT_CONFIG
        }
    };
    std::process::exit(code);
}
