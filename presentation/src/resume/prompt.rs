//! Interactive resume prompt for suspended runs.
//!
//! When a phase fails critically under `interactive` HiL mode, the user sees:
//!
//! ```text
//! ═══════════════════════════════════════════════════════════════
//!   Run Waiting For Human
//! ═══════════════════════════════════════════════════════════════
//!
//! Phase 3 (Black Hat) failed: all_agents_failed
//!   every agent failed: black-hat-001: timed out
//!
//! Commands:
//!   /retry [note]  - Run the phase again
//!   /skip  [note]  - Continue without this phase
//!   /abort [note]  - Fail the run
//!
//! resume>
//! ```
//!
//! | Command | Aliases |
//! |---------|---------|
//! | `/retry` | `retry`, `r` |
//! | `/skip` | `skip`, `s` |
//! | `/abort` | `abort`, `a`, `q` |

use async_trait::async_trait;
use colored::Colorize;
use sixhats_application::{ResumeSignalError, ResumeSignalPort};
use sixhats_domain::core::string::truncate;
use sixhats_domain::{ResumeAction, ResumeSignal, Suspension, Workspace};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use tokio::sync::mpsc;

type Lines = mpsc::UnboundedReceiver<Result<String, ResumeSignalError>>;

/// Terminal prompt implementing [`ResumeSignalPort`]
///
/// Input is read on a dedicated thread rather than the blocking pool, so a
/// prompt abandoned by the resume timeout never holds up runtime shutdown.
pub struct StdinResumePrompt {
    actor: String,
    source: Mutex<Option<Box<dyn BufRead + Send>>>,
    lines: tokio::sync::Mutex<Option<Lines>>,
}

impl StdinResumePrompt {
    pub fn new(actor: impl Into<String>) -> Self {
        Self::from_reader(actor, io::BufReader::new(io::stdin()))
    }

    /// Prompt reading its answers from `reader` instead of stdin
    pub fn from_reader(actor: impl Into<String>, reader: impl BufRead + Send + 'static) -> Self {
        Self {
            actor: actor.into(),
            source: Mutex::new(Some(Box::new(reader))),
            lines: tokio::sync::Mutex::new(None),
        }
    }

    fn display_prompt(workspace: &Workspace, suspension: &Suspension) {
        let rule = "═══════════════════════════════════════════════════════════════";
        println!();
        println!("{}", rule.yellow().bold());
        println!("{}", "  Run Waiting For Human".yellow().bold());
        println!("{}", rule.yellow().bold());
        println!();
        println!(
            "{} {}",
            "Scenario:".cyan().bold(),
            workspace.scenario().title
        );
        println!(
            "Phase {} ({}) failed: {}",
            suspension.phase_index + 1,
            suspension.role.display_name(),
            suspension.kind.as_str().red()
        );
        println!("  {}", truncate(&suspension.message, 200).dimmed());
        println!();
        println!("{}", "Commands:".cyan().bold());
        println!("  {} [note]  - Run the phase again", "/retry".green());
        println!("  {}  [note]  - Continue without this phase", "/skip".yellow());
        println!("  {} [note]  - Fail the run", "/abort".red());
        println!();
    }

    /// Parse one input line; `None` for unknown commands
    fn parse(line: &str) -> Option<(ResumeAction, Option<String>)> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        let action = match command.to_lowercase().as_str() {
            "/retry" | "retry" | "r" => ResumeAction::Retry,
            "/skip" | "skip" | "s" => ResumeAction::Skip,
            "/abort" | "abort" | "a" | "q" => ResumeAction::Abort,
            _ => return None,
        };
        let note = (!rest.is_empty()).then(|| rest.to_string());
        Some((action, note))
    }

    /// Forward lines from `source` until end of input or a read error
    fn spawn_reader(mut source: Box<dyn BufRead + Send>) -> Lines {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            loop {
                let mut line = String::new();
                match source.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(ResumeSignalError::IoError(format!(
                            "Failed to read input: {}",
                            e
                        ))));
                        break;
                    }
                }
            }
        });
        rx
    }

    /// Next input line; `None` at end of input
    async fn read_line(&self) -> Result<Option<String>, ResumeSignalError> {
        print!("{} ", "resume>".magenta().bold());
        io::stdout()
            .flush()
            .map_err(|e| ResumeSignalError::IoError(format!("Failed to flush stdout: {}", e)))?;

        let mut lines = self.lines.lock().await;
        if lines.is_none() {
            let source = self
                .source
                .lock()
                .map_err(|_| ResumeSignalError::IoError("input reader poisoned".to_string()))?
                .take();
            *lines = source.map(Self::spawn_reader);
        }
        match lines.as_mut() {
            Some(rx) => rx.recv().await.transpose(),
            None => Ok(None),
        }
    }
}

impl Default for StdinResumePrompt {
    fn default() -> Self {
        Self::new("human")
    }
}

#[async_trait]
impl ResumeSignalPort for StdinResumePrompt {
    async fn wait_for_signal(
        &self,
        workspace: &Workspace,
        suspension: &Suspension,
    ) -> Result<ResumeSignal, ResumeSignalError> {
        Self::display_prompt(workspace, suspension);

        loop {
            let Some(line) = self.read_line().await? else {
                return Err(ResumeSignalError::Cancelled);
            };
            if line.trim().is_empty() {
                continue;
            }
            match Self::parse(&line) {
                Some((action, note)) => {
                    let mut signal = ResumeSignal::new(action).with_actor(&self.actor);
                    if let Some(note) = note {
                        signal = signal.with_note(note);
                    }
                    return Ok(signal);
                }
                None => {
                    println!(
                        "{} Unknown command. Use /retry, /skip or /abort.",
                        "!".yellow()
                    );
                }
            }
        }
    }
}
