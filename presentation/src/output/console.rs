//! Console output formatter for runs

use colored::Colorize;
use sixhats_application::{DeadLetter, RunSummary};
use sixhats_domain::core::string::truncate;
use sixhats_domain::{OutputFormat, PhaseState, RunStatus, Synthesis, Workspace};

/// Formats workspaces for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn render(workspace: &Workspace, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => Self::format(workspace),
            OutputFormat::Summary => Self::format_summary(workspace),
            OutputFormat::Json => Self::format_json(workspace),
        }
    }

    /// Every phase with its raw contributions
    pub fn format(workspace: &Workspace) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&workspace.scenario().title));
        output.push('\n');
        output.push_str(&Self::run_line(workspace));
        output.push_str(&format!(
            "{} {}\n",
            "Problem:".cyan().bold(),
            workspace.scenario().problem_statement
        ));

        for (index, phase) in workspace.phases().iter().enumerate() {
            output.push_str(&Self::section_header(&format!(
                "Phase {}: {}",
                index + 1,
                phase.role().display_name()
            )));
            if phase.raw().is_empty() {
                output.push_str(&format!("{}\n", "  (no contributions)".dimmed()));
            }
            for contribution in phase.raw() {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!(
                        "── {} ({}) ──",
                        contribution.agent_info.agent_id, contribution.agent_info.persona
                    )
                    .yellow()
                    .bold(),
                    contribution.content
                ));
            }
            if let Some(synthesis) = phase.synthesis() {
                output.push('\n');
                output.push_str(&Self::synthesis_block(synthesis));
            }
        }

        output.push_str(&Self::artifacts(workspace));
        output.push_str(&Self::metrics(workspace));
        output.push_str(&Self::footer());
        output
    }

    /// Status, one synthesis per phase and the artifacts
    pub fn format_summary(workspace: &Workspace) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n\n",
            format!("=== {} ===", workspace.scenario().title).cyan().bold()
        ));
        output.push_str(&Self::run_line(workspace));
        output.push('\n');

        for phase in workspace.phases() {
            output.push_str(&Self::phase_line(phase));
        }
        output.push_str(&Self::artifacts(workspace));
        output
    }

    /// Format as JSON
    pub fn format_json(workspace: &Workspace) -> String {
        serde_json::to_string_pretty(workspace).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn format_runs(runs: &[RunSummary]) -> String {
        if runs.is_empty() {
            return format!("{}\n", "No runs stored.".dimmed());
        }
        let mut output = format!(
            "{}\n",
            format!(
                "{:<36}  {:<18}  {:>5}  {:<20}  {}",
                "RUN", "STATUS", "PHASE", "UPDATED", "TITLE"
            )
            .bold()
        );
        for run in runs {
            output.push_str(&format!(
                "{:<36}  {:<18}  {:>5}  {:<20}  {}\n",
                run.run_id,
                Self::status(run.status),
                format!("{}/{}", run.cursor.min(run.phases), run.phases),
                run.updated_at.format("%Y-%m-%d %H:%M:%S"),
                truncate(&run.title, 50)
            ));
        }
        output
    }

    pub fn format_dead_letter(letter: &DeadLetter) -> String {
        format!(
            "{} {} at {}\n  {}\n",
            "Dead letter:".red().bold(),
            letter.run_id,
            letter.dead_lettered_at.format("%Y-%m-%d %H:%M:%S"),
            letter.error_context
        )
    }

    fn run_line(workspace: &Workspace) -> String {
        let run = workspace.run();
        let mut line = format!(
            "{} {}  {} {}  {} {}\n",
            "Run:".cyan().bold(),
            run.run_id,
            "Protocol:".cyan().bold(),
            run.protocol,
            "Status:".cyan().bold(),
            Self::status(run.status)
        );
        if let Some(suspension) = &run.suspension {
            line.push_str(&format!(
                "{} phase {} ({}) {}: {}\n",
                "Waiting:".yellow().bold(),
                suspension.phase_index + 1,
                suspension.role,
                suspension.kind,
                suspension.message
            ));
        }
        line
    }

    fn phase_line(phase: &PhaseState) -> String {
        let name = format!("{:<12}", phase.role().display_name());
        match phase.synthesis() {
            Some(synthesis) => {
                let marker = if synthesis.is_fallback() {
                    "!".yellow()
                } else {
                    "v".green()
                };
                let mut line = format!("{} {} {}\n", marker, name.bold(), synthesis.summary);
                for point in &synthesis.key_points {
                    line.push_str(&format!("      * {}\n", point));
                }
                line
            }
            None if phase.raw().is_empty() => format!("{} {}\n", "-".dimmed(), name.dimmed()),
            None => format!(
                "{} {} {} contribution(s), no synthesis\n",
                "?".yellow(),
                name.bold(),
                phase.raw().len()
            ),
        }
    }

    fn synthesis_block(synthesis: &Synthesis) -> String {
        let title = if synthesis.is_fallback() {
            "Synthesis (fallback):".yellow().bold()
        } else {
            "Synthesis:".green().bold()
        };
        let mut block = format!(
            "{} {}\n{} {:.2}\n",
            title,
            synthesis.summary,
            "Confidence:".dimmed(),
            synthesis.confidence
        );
        if !synthesis.key_points.is_empty() {
            block.push_str(&format!("{}\n", "Key Points:".cyan().bold()));
            for point in &synthesis.key_points {
                block.push_str(&format!("  * {}\n", point));
            }
        }
        if !synthesis.contradictions.is_empty() {
            block.push_str(&format!("{}\n", "Contradictions:".yellow().bold()));
            for point in &synthesis.contradictions {
                block.push_str(&format!("  * {}\n", point));
            }
        }
        block
    }

    fn artifacts(workspace: &Workspace) -> String {
        let artifacts = workspace.artifacts();
        if artifacts.is_empty() && artifacts.global_summary.is_none() {
            return String::new();
        }
        let mut output = Self::section_header("Artifacts");
        if let Some(summary) = &artifacts.global_summary {
            output.push_str(&format!("{} {}\n", "Summary:".cyan().bold(), summary));
        }
        for decision in &artifacts.decisions {
            output.push_str(&format!(
                "  {} {} ({})\n",
                "Decision:".green().bold(),
                decision.statement,
                decision.rationale
            ));
        }
        for item in &artifacts.action_items {
            output.push_str(&format!(
                "  {} {} [{}]\n",
                "Action:".cyan().bold(),
                item.task,
                item.owner
            ));
        }
        for question in &artifacts.open_questions {
            output.push_str(&format!("  {} {}\n", "Open:".yellow().bold(), question.question));
        }
        output
    }

    fn metrics(workspace: &Workspace) -> String {
        let m = workspace.metrics();
        format!(
            "\n{} {} agent call(s), {} aggregation(s), {} tokens in / {} out\n",
            "Metrics:".dimmed(),
            m.agent_call_count,
            m.aggregation_call_count,
            m.total_tokens_in,
            m.total_tokens_out
        )
    }

    fn status(status: RunStatus) -> String {
        let label = status.as_str();
        match status {
            RunStatus::Completed => label.green().to_string(),
            RunStatus::Failed => label.red().to_string(),
            RunStatus::WaitingForHuman => label.yellow().to_string(),
            _ => label.to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
