use colored::Colorize;
use declarative::ConfirmCallback;

use crate::sudo::SudoContext;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Confirmation
// ============================================================================

/// Asks before the first change and takes sudo once the user agrees
///
/// Holds the sudo context until dropped, so credentials live exactly as
/// long as the run.
///
/// Notices go to stderr; stdout is reserved for the command's output.
pub struct ApplyGate {
    assume_yes: bool,
    interactive: bool,
    sudo_reason: Option<String>,
    sudo: Option<SudoContext>,
}

impl ApplyGate {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            interactive: console::user_attended(),
            sudo_reason: None,
            sudo: None,
        }
    }

    /// Gate that never prompts, as if no terminal were attached
    #[cfg(test)]
    pub fn detached(assume_yes: bool) -> Self {
        Self {
            interactive: false,
            ..Self::new(assume_yes)
        }
    }

    /// Acquire sudo after confirmation
    pub fn with_sudo(mut self, reason: impl Into<String>) -> Self {
        self.sudo_reason = Some(reason.into());
        self
    }

    fn ask(&self, prompt: &str) -> bool {
        if !self.interactive {
            warn("Not a terminal; pass --yes to apply changes");
            return false;
        }

        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .unwrap_or_else(|e| {
                log::debug!("confirmation prompt failed: {e}");
                false
            })
    }
}

impl ConfirmCallback for ApplyGate {
    fn confirm(&mut self, prompt: &str) -> bool {
        if !self.assume_yes && !self.ask(prompt) {
            eprintln!();
            eprintln!("  {} Aborted", "✗".red());
            return false;
        }

        if let Some(reason) = self.sudo_reason.take() {
            match SudoContext::acquire(&reason) {
                Ok(ctx) => self.sudo = Some(ctx),
                Err(e) => {
                    error(&format!("{e:#}"));
                    return false;
                }
            }
        }

        true
    }
}
