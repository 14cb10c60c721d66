//! Progress reporting for runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sixhats_application::ProgressNotifier;
use sixhats_domain::{Role, Suspension};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress during a run with one bar per phase
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn phase_label(index: usize, role: &Role) -> String {
        format!("Phase {}: {}", index + 1, role.display_name())
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.phase_bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, index: usize, role: &Role, total_agents: usize) {
        let pb = self.multi.add(ProgressBar::new(total_agents as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(Self::phase_label(index, role));
        pb.set_message("Starting...");
        pb.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut slot) = self.phase_bar.lock() {
            if let Some(previous) = slot.replace(pb) {
                previous.abandon();
            }
        }
    }

    fn on_agent_complete(&self, _role: &Role, agent_id: &str, success: bool) {
        self.with_bar(|pb| {
            let status = if success {
                format!("{} {}", "v".green(), agent_id)
            } else {
                format!("{} {}", "x".red(), agent_id)
            };
            pb.set_message(status);
            pb.inc(1);
        });
    }

    fn on_agent_retry(&self, _role: &Role, agent_id: &str, attempt: u32, delay: Duration) {
        self.with_bar(|pb| {
            pb.set_message(format!(
                "{} {} attempt {} failed, retrying in {:.1}s",
                "~".yellow(),
                agent_id,
                attempt,
                delay.as_secs_f64()
            ));
        });
    }

    fn on_phase_complete(&self, role: &Role, fallback: bool) {
        let taken = self.phase_bar.lock().ok().and_then(|mut slot| slot.take());
        if let Some(pb) = taken {
            let message = if fallback {
                format!("{} done (fallback synthesis)", role.display_name().yellow())
            } else {
                format!("{} done", role.display_name().green())
            };
            pb.finish_with_message(message);
        }
    }

    fn on_suspended(&self, suspension: &Suspension) {
        let taken = self.phase_bar.lock().ok().and_then(|mut slot| slot.take());
        if let Some(pb) = taken {
            pb.abandon_with_message(format!(
                "{} {}",
                "suspended:".red().bold(),
                suspension.kind
            ));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, index: usize, role: &Role, total_agents: usize) {
        eprintln!(
            "{} {} ({} agents)",
            "->".cyan(),
            ProgressReporter::phase_label(index, role).bold(),
            total_agents
        );
    }

    fn on_agent_complete(&self, _role: &Role, agent_id: &str, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), agent_id);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), agent_id);
        }
    }

    fn on_agent_retry(&self, _role: &Role, agent_id: &str, attempt: u32, delay: Duration) {
        eprintln!(
            "  {} {} attempt {} failed, retrying in {:.1}s",
            "~".yellow(),
            agent_id,
            attempt,
            delay.as_secs_f64()
        );
    }

    fn on_phase_complete(&self, _role: &Role, fallback: bool) {
        if fallback {
            eprintln!("  {}", "fallback synthesis".yellow());
        }
    }
}
