//! Progress display for the apply loop.
//!
//! On a terminal each change gets a spinner line; otherwise (pipes, CI)
//! results are printed one per line. JSON output disables both.

use colored::Colorize;
use declarative::{ActionResult, Outcome, PlanAction, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Spinner,
    Lines,
    Silent,
}

impl Mode {
    /// Pick a mode for the current stdout
    pub fn detect(silent: bool) -> Self {
        if silent {
            Self::Silent
        } else if console::Term::stdout().is_term() {
            Self::Spinner
        } else {
            Self::Lines
        }
    }
}

pub struct TerminalProgress {
    mode: Mode,
    changes: usize,
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            changes: 0,
            bar: None,
        }
    }

    /// Started on the first change so it never draws over the confirmation prompt
    fn bar(&mut self) -> Option<&ProgressBar> {
        if self.bar.is_none() && self.mode == Mode::Spinner && self.changes > 0 {
            let pb = ProgressBar::new(self.changes as u64);
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            self.bar = Some(pb);
        }
        self.bar.as_ref()
    }

    fn emit(&self, line: String) {
        match (&self.bar, self.mode) {
            (Some(bar), _) => bar.println(line),
            (None, Mode::Silent) => {}
            (None, _) => println!("{line}"),
        }
    }
}

/// Spinner for a single blocking step (probing)
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render one finished action, e.g. `✓ install clang 3.4`
pub fn result_line(result: &ActionResult) -> String {
    let action = &result.action;
    let target = match action.target_version() {
        Some(v) => format!("{} {}", action.name(), v.dimmed()),
        None => action.name().to_string(),
    };

    match &result.outcome {
        Outcome::Success => format!("  {} {} {}", "✓".green(), action.kind.verb(), target),
        Outcome::Unchanged => format!("  {} {} {}", "○".dimmed(), action.kind.verb(), target),
        Outcome::Failed { reason } => format!(
            "  {} {} {}: {}",
            "✗".red(),
            action.kind.verb(),
            target,
            reason.red()
        ),
        Outcome::Skipped { reason } => format!(
            "  {} {} {} ({})",
            "⊘".yellow(),
            action.kind.verb(),
            target,
            reason.dimmed()
        ),
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_start(&mut self, total: usize, changes: usize) {
        log::info!("applying {changes} change(s) across {total} package(s)");
        self.changes = changes;
    }

    fn on_action_start(&mut self, index: usize, action: &PlanAction) {
        log::info!("[{}] {} {}", index + 1, action.kind.verb(), action.name());
        if let Some(bar) = self.bar() {
            bar.set_message(format!("{} {}", action.kind.verb(), action.name()));
        }
    }

    fn on_action_complete(&mut self, _index: usize, result: &ActionResult) {
        if !result.action.kind.is_change() {
            return;
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        self.emit(result_line(result));
    }

    fn on_finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
