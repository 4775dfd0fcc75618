use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::warn;

use madcritic_core::{DebateConfig, DebateOrchestrator};
use madcritic_eval::{Dataset, EvalDriver, EvalSettings, EvalSummary, RunWriter};
use madcritic_logging::{LogEvent, Logger};
use madcritic_oracle::{create_oracle, OracleSettings};

use crate::config::ProjectConfig;
use crate::RunArgs;

/// Everything a run needs after merging CLI flags over the config file
struct ResolvedRun {
    debate: DebateConfig,
    oracle: OracleSettings,
    critic_oracle: OracleSettings,
    eval: EvalSettings,
    dataset: PathBuf,
}

pub async fn handle_run_command(args: RunArgs) -> Result<i32> {
    let project = match args.config {
        Some(ref path) => ProjectConfig::load_file(path)?,
        None => {
            let working_dir =
                std::env::current_dir().context("Failed to get current directory")?;
            ProjectConfig::load(&working_dir)?.unwrap_or_default()
        }
    };
    let resolved = resolve(&args, project)?;
    resolved.debate.validate().context("Invalid debate configuration")?;

    let dataset = Dataset::load(&resolved.dataset)
        .with_context(|| format!("Failed to load dataset {}", resolved.dataset.display()))?;
    let questions = dataset.select(&resolved.eval.selection());
    if questions.is_empty() {
        anyhow::bail!(
            "Selection is empty: dataset has {} questions, offset {}",
            dataset.len(),
            resolved.eval.offset
        );
    }

    if args.dry_run {
        print_dry_run(&resolved, &dataset, questions.len());
        return Ok(0);
    }

    let logger = match args.log_file {
        Some(ref path) => Logger::with_file(args.log_format.into(), path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(args.log_format.into()),
    };
    let logger = Arc::new(logger);

    let actor = create_oracle(&resolved.oracle).context("Failed to create actor oracle")?;
    let critic =
        create_oracle(&resolved.critic_oracle).context("Failed to create critic oracle")?;

    if !actor.is_available().await {
        anyhow::bail!(
            "Actor oracle '{}' is not available. Check the endpoint or command.",
            actor.name()
        );
    }
    if resolved.debate.critic.is_enabled() && !critic.is_available().await {
        anyhow::bail!(
            "Critic oracle '{}' is not available. Check the endpoint or command.",
            critic.name()
        );
    }

    let orchestrator = DebateOrchestrator::new(
        actor.as_ref(),
        critic.as_ref(),
        resolved.debate.clone(),
        logger.clone(),
    )?;
    let driver = EvalDriver::new(orchestrator, logger.clone())
        .with_concurrency(resolved.eval.concurrency);

    // Handle Ctrl+C gracefully
    let interrupt_handle = driver.interrupt_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted. Finishing current rounds...");
        interrupt_handle.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let run_config = serde_json::json!({
        "debate": &resolved.debate,
        "oracle": &resolved.oracle,
        "critic_oracle": &resolved.critic_oracle,
        "eval": &resolved.eval,
    });
    let (mut writer, prior, questions) = match args.resume {
        Some(ref path) => {
            let (writer, record) = RunWriter::resume(path)
                .with_context(|| format!("Failed to resume run file {}", path.display()))?;
            if record.start.config != run_config {
                warn!(
                    run_file = %path.display(),
                    "Resuming with a configuration that differs from the original run"
                );
            }
            let settled = record.settled_ids();
            let remaining: Vec<_> = questions
                .into_iter()
                .filter(|q| !settled.contains(&q.id))
                .collect();
            eprintln!(
                "{}  {} settled, {} to run",
                "Resuming:".dimmed(),
                settled.len(),
                remaining.len()
            );
            (writer, record.settled_outcomes(), remaining)
        }
        None => {
            let output_dir = resolved.eval.output_dir();
            let writer =
                RunWriter::create(&output_dir, dataset.name(), questions.len(), run_config)
                    .with_context(|| {
                        format!("Failed to create run file in {}", output_dir.display())
                    })?;
            (writer, Vec::new(), questions)
        }
    };

    logger.log(&LogEvent::RunStarted {
        run_id: writer.run_id().to_string(),
        dataset: dataset.name().to_string(),
        questions: questions.len(),
        agents: resolved.debate.agents,
        rounds: resolved.debate.rounds,
        critic: resolved.debate.critic.to_string(),
    });

    let started = Instant::now();
    let fresh = driver
        .run_with(&questions, |outcome| {
            if let Err(e) = writer.write_outcome(outcome) {
                warn!(
                    question_id = outcome.question_id(),
                    error = %e,
                    "Failed to persist outcome"
                );
            }
        })
        .await;
    let mut outcomes = prior;
    outcomes.extend(fresh);

    let interrupted = driver.was_interrupted();
    let summary = EvalSummary::from_outcomes(&outcomes, resolved.eval.stalemate_gap);
    let path = writer
        .finish(&summary, interrupted, started.elapsed().as_secs_f64())
        .context("Failed to finish run file")?;

    if args.json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        summary.print_summary();
    }
    eprintln!("{}  {}", "Run file:".dimmed(), path.display());

    Ok(if interrupted {
        crate::EXIT_INTERRUPTED
    } else {
        0
    })
}

/// CLI flag > config file > built-in default
fn resolve(args: &RunArgs, project: ProjectConfig) -> Result<ResolvedRun> {
    let mut critic_oracle = project.critic_oracle().clone();
    let ProjectConfig {
        mut debate,
        mut oracle,
        mut eval,
        ..
    } = project;

    if let Some(agents) = args.agents {
        debate.agents = agents;
    }
    if let Some(rounds) = args.rounds {
        debate.rounds = rounds;
    }
    if let Some(critic) = args.critic {
        debate.critic = critic.into();
    }
    if !args.roles.is_empty() {
        debate.roles = args.roles.clone();
    }
    if let Some(threshold) = args.restart_threshold {
        debate.restart_threshold = Some(threshold);
    }
    if let Some(max) = args.max_concurrent_calls {
        debate.max_concurrent_calls = max;
    }
    if let Some(seed) = args.seed {
        debate = debate.with_seed(seed);
        eval.seed = Some(seed);
    }

    // Adapter flags apply to both oracles
    for settings in [&mut oracle, &mut critic_oracle] {
        if let Some(kind) = args.oracle {
            settings.kind = kind.into();
        }
        if let Some(ref model) = args.model {
            settings.model = Some(model.clone());
        }
        if let Some(ref base_url) = args.base_url {
            settings.base_url = Some(base_url.clone());
        }
        if let Some(ref command) = args.command {
            settings.command = Some(command.clone());
        }
    }

    if let Some(count) = args.sample_count {
        eval.sample_count = Some(count);
    }
    if let Some(offset) = args.offset {
        eval.offset = offset;
    }
    if let Some(concurrency) = args.concurrency {
        eval.concurrency = concurrency;
    }
    if let Some(gap) = args.stalemate_gap {
        eval.stalemate_gap = gap;
    }
    if let Some(ref dir) = args.output_dir {
        eval.output_dir = Some(dir.clone());
    }
    if let Some(ref dataset) = args.dataset {
        eval.dataset = Some(dataset.clone());
    }

    let dataset = eval
        .dataset
        .clone()
        .context("No dataset given. Use --dataset or set [eval].dataset in madcritic.toml")?;

    Ok(ResolvedRun {
        debate,
        oracle,
        critic_oracle,
        eval,
        dataset,
    })
}

fn print_dry_run(resolved: &ResolvedRun, dataset: &Dataset, selected: usize) {
    println!("=== Dry Run ===");
    println!(
        "Dataset: {} ({} questions, {} skipped lines, {} selected)",
        resolved.dataset.display(),
        dataset.len(),
        dataset.skipped(),
        selected
    );
    println!(
        "Debate: {} agents, {} rounds, critic {}",
        resolved.debate.agents, resolved.debate.rounds, resolved.debate.critic
    );
    let roles: Vec<String> = resolved.debate.roles.iter().map(|r| r.to_string()).collect();
    println!("Roles: {}", roles.join(", "));
    if let Some(threshold) = resolved.debate.restart_threshold {
        println!("Restart threshold: {:.1}", threshold);
    }
    println!(
        "Actor oracle: {} {}",
        resolved.oracle.kind,
        describe_target(&resolved.oracle)
    );
    if resolved.debate.critic.is_enabled() {
        println!(
            "Critic oracle: {} {}",
            resolved.critic_oracle.kind,
            describe_target(&resolved.critic_oracle)
        );
    }
    println!(
        "Concurrency: {} questions, {} oracle calls",
        resolved.eval.concurrency, resolved.debate.max_concurrent_calls
    );
    println!("Output dir: {}", resolved.eval.output_dir().display());
}

fn describe_target(settings: &OracleSettings) -> String {
    match (&settings.model, &settings.base_url, &settings.command) {
        (Some(model), Some(url), _) => format!("{} @ {}", model, url),
        (_, _, Some(command)) => command.display().to_string(),
        _ => "(incomplete)".to_string(),
    }
}
