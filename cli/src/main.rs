//! CLI entrypoint for sixhats
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use sixhats_application::{
    AuditSink, CompositeAuditSink, NoProgress, Orchestrator, ProgressNotifier, RecordStore,
    RunOutcome,
};
use sixhats_domain::{
    Decision, HilMode, OutputFormat, ResumeSignal, Role, RunId, Scenario, Workspace,
};
use sixhats_infrastructure::{
    ConfigLoader, FileConfig, FileRecordStore, JsonlAuditSink, OfflineAgent, OfflineReducer,
    TracingAuditSink, load_scenario,
};
use sixhats_presentation::{
    Cli, Command, ConsoleFormatter, ProgressReporter, SimpleProgress, StdinResumePrompt,
};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        println!("Configuration sources (lowest to highest priority):");
        for source in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("  {}", source);
        }
        return Ok(());
    }

    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    for issue in &issues {
        if issue.is_error() {
            eprintln!("{}", issue);
        } else {
            warn!("{}", issue);
        }
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("Configuration is invalid");
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();

    let cancel = CancellationToken::new();
    let orchestrator = build_orchestrator(&cli, &config, cancel.clone());

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted; checkpointing the run...");
                cancel.cancel();
            }
        });
    }

    info!("Starting sixhats");

    match command {
        Command::Run {
            scenario,
            tags,
            initiator,
        } => {
            let scenario = load_scenario(scenario)
                .await
                .with_context(|| format!("Failed to load scenario {}", scenario.display()))?;
            let workspace = new_workspace(&orchestrator, scenario, tags, initiator)?;
            println!("Run {}", workspace.run_id());
            let outcome = orchestrator.start(workspace).await?;
            report(&orchestrator, outcome, format).await
        }
        Command::Resume {
            run_id,
            action,
            note,
            actor,
        } => {
            let mut signal = ResumeSignal::new((*action).into()).with_actor(actor);
            if let Some(note) = note {
                signal = signal.with_note(note);
            }
            let outcome = orchestrator.resume(&RunId::new(run_id), signal).await?;
            report(&orchestrator, outcome, format).await
        }
        Command::Continue { run_id } => {
            let outcome = orchestrator.continue_run(&RunId::new(run_id)).await?;
            report(&orchestrator, outcome, format).await
        }
        Command::Show { run_id } => {
            let run_id = RunId::new(run_id);
            let workspace = orchestrator.load(&run_id).await?;
            println!("{}", ConsoleFormatter::render(&workspace, format));
            if let Some(letter) = orchestrator.dead_letter_of(&run_id).await? {
                print!("{}", ConsoleFormatter::format_dead_letter(&letter));
            }
            Ok(())
        }
        Command::List => {
            let runs = orchestrator.list_runs().await?;
            print!("{}", ConsoleFormatter::format_runs(&runs));
            Ok(())
        }
        Command::Contribute {
            run_id,
            role,
            content,
            actor,
        } => {
            let contribution = orchestrator
                .record_human_contribution(
                    &RunId::new(run_id),
                    &Role::from(role.as_str()),
                    actor,
                    content,
                )
                .await?;
            println!("Recorded contribution {}", contribution.contribution_id);
            Ok(())
        }
        Command::Decide {
            run_id,
            statement,
            rationale,
            based_on,
            actor,
        } => {
            let decision = Decision::new(statement, rationale, actor, based_on.clone());
            let decision_id = decision.decision_id.clone();
            orchestrator
                .record_decision(&RunId::new(run_id), decision)
                .await?;
            println!("Recorded decision {}", decision_id);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn build_orchestrator(cli: &Cli, config: &FileConfig, cancel: CancellationToken) -> Orchestrator {
    let store_dir = config.store.resolve_dir();
    info!("Run store: {}", store_dir.display());
    let store: Arc<dyn RecordStore> = Arc::new(FileRecordStore::new(&store_dir));

    let mut sinks: Vec<Box<dyn AuditSink>> = vec![Box::new(TracingAuditSink)];
    if config.audit.enabled {
        if let Some(path) = config.audit.resolve_path(&store_dir) {
            match JsonlAuditSink::open(&path) {
                Some(sink) => sinks.push(Box::new(sink)),
                None => warn!("Audit trail disabled: cannot open {}", path.display()),
            }
        }
    }

    let mut orchestrator_config = config.orchestrator_config();
    if let Some(mode) = cli.hil {
        orchestrator_config = orchestrator_config.with_hil_mode(mode.into());
    }
    let interactive = orchestrator_config.hil.mode == HilMode::Interactive;
    let reducer = OfflineReducer::new(orchestrator_config.fallback_key_points);

    let progress: Arc<dyn ProgressNotifier> = if cli.quiet || !config.output.show_progress {
        Arc::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };

    let mut orchestrator = Orchestrator::new(
        config.protocol(),
        Arc::new(OfflineAgent::new()),
        Arc::new(reducer),
        store,
        orchestrator_config,
    )
    .with_audit_sink(Arc::new(CompositeAuditSink::new(sinks)))
    .with_progress(progress)
    .with_cancellation(cancel);

    if interactive {
        orchestrator = orchestrator.with_resume_signal(Arc::new(StdinResumePrompt::default()));
    }
    orchestrator
}

fn new_workspace(
    orchestrator: &Orchestrator,
    scenario: Scenario,
    tags: &[String],
    initiator: &str,
) -> Result<Workspace> {
    let mut workspace = Workspace::new(scenario, orchestrator.protocol())?;
    workspace.set_initiator(initiator)?;
    for tag in tags {
        workspace.add_tag(tag)?;
    }
    Ok(workspace)
}

async fn report(orchestrator: &Orchestrator, outcome: RunOutcome, format: OutputFormat) -> Result<()> {
    println!("{}", ConsoleFormatter::render(outcome.workspace(), format));

    match outcome {
        RunOutcome::Completed(_) => Ok(()),
        RunOutcome::Suspended(workspace) => {
            let run_id = workspace.run_id();
            eprintln!("Run {} is waiting for a human decision.", run_id);
            eprintln!(
                "Answer it with: sixhats resume {} --action <retry|skip|abort>",
                run_id
            );
            Ok(())
        }
        RunOutcome::Cancelled(workspace) => {
            eprintln!(
                "Run {} was interrupted; continue it with: sixhats continue {}",
                workspace.run_id(),
                workspace.run_id()
            );
            Ok(())
        }
        RunOutcome::Failed { workspace, reason } => {
            if let Ok(Some(letter)) = orchestrator.dead_letter_of(workspace.run_id()).await {
                eprint!("{}", ConsoleFormatter::format_dead_letter(&letter));
            }
            bail!("Run {} failed: {}", workspace.run_id(), reason)
        }
    }
}
