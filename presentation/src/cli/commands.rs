//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every phase with its contributions and synthesis
    Full,
    /// Status, syntheses and artifacts
    Summary,
    /// The workspace as JSON
    Json,
}

impl From<OutputFormat> for sixhats_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => Self::Full,
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// Human-in-the-loop mode override
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HilModeArg {
    /// Ask on the terminal when a phase fails critically
    Interactive,
    /// Persist the suspension and exit; answer later with `resume`
    Detached,
    /// Dead-letter immediately
    AutoFail,
}

impl From<HilModeArg> for sixhats_domain::HilMode {
    fn from(mode: HilModeArg) -> Self {
        match mode {
            HilModeArg::Interactive => Self::Interactive,
            HilModeArg::Detached => Self::Detached,
            HilModeArg::AutoFail => Self::AutoFail,
        }
    }
}

/// Answer to a suspended run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResumeActionArg {
    /// Re-run the suspended phase
    Retry,
    /// Move past the suspended phase
    Skip,
    /// Fail the run
    Abort,
}

impl From<ResumeActionArg> for sixhats_domain::ResumeAction {
    fn from(action: ResumeActionArg) -> Self {
        match action {
            ResumeActionArg::Retry => Self::Retry,
            ResumeActionArg::Skip => Self::Skip,
            ResumeActionArg::Abort => Self::Abort,
        }
    }
}

/// CLI arguments for sixhats
#[derive(Parser, Debug)]
#[command(name = "sixhats")]
#[command(author, version, about = "Six Thinking Hats - parallel agents evaluate a scenario hat by hat")]
#[command(long_about = r#"
sixhats runs a scenario through an ordered protocol of roles (by default the
six thinking hats: white, red, black, yellow, green, blue). Each phase fans out
to several agents in parallel, merges their contributions into a synthesis,
and checkpoints the run so nothing completed is ever lost.

When every agent of a phase fails, the run waits for a human decision:
retry the phase, skip it, or abort the run.

Configuration files are loaded from (in priority order):
1. --config <path>          Explicit config file
2. ./sixhats.toml           Project-level config
3. ~/.config/sixhats/config.toml   Global config

Example:
  sixhats run scenario.toml
  sixhats --hil detached run scenario.toml
  sixhats resume 3f2c... --action retry --note "provider is back"
  sixhats show 3f2c... --output full
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Override the configured human-in-the-loop mode
    #[arg(long, value_enum, global = true)]
    pub hil: Option<HilModeArg>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new run from a scenario file (.toml or .json)
    Run {
        scenario: PathBuf,

        /// Tag the run (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Who started the run
        #[arg(long, default_value = "cli")]
        initiator: String,
    },

    /// Answer a run that is waiting for a human
    Resume {
        run_id: String,

        #[arg(long, value_enum)]
        action: ResumeActionArg,

        #[arg(long)]
        note: Option<String>,

        #[arg(long, default_value = "human")]
        actor: String,
    },

    /// Continue a run that stopped mid-phase (crash or Ctrl-C)
    Continue { run_id: String },

    /// Print a run
    Show { run_id: String },

    /// List stored runs
    List,

    /// Add a human contribution to a phase
    Contribute {
        run_id: String,

        /// Role (phase) to contribute to, e.g. `green`
        #[arg(long)]
        role: String,

        #[arg(long)]
        content: String,

        #[arg(long, default_value = "human")]
        actor: String,
    },

    /// Record a decision backed by contributions or syntheses
    Decide {
        run_id: String,

        #[arg(long)]
        statement: String,

        #[arg(long)]
        rationale: String,

        /// Contribution or synthesis id the decision rests on (repeatable)
        #[arg(long = "based-on", value_name = "ID", required = true)]
        based_on: Vec<String>,

        #[arg(long, default_value = "human")]
        actor: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resume() {
        let cli = Cli::parse_from([
            "sixhats", "-vv", "resume", "abc", "--action", "skip", "--note", "late",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Command::Resume {
                run_id,
                action,
                note,
                ..
            }) => {
                assert_eq!(run_id, "abc");
                assert_eq!(action, ResumeActionArg::Skip);
                assert_eq!(note.as_deref(), Some("late"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["sixhats", "run", "s.toml", "--hil", "auto-fail", "-o", "json"]);
        assert_eq!(cli.hil, Some(HilModeArg::AutoFail));
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }
}
