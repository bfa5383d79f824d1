//! Terminal output for commands.
//!
//! Each call renders one complete line under the stdout lock, so lines
//! from different callers never interleave. Logs go to stderr through
//! `tracing` and are independent of this.

use std::io::{self, Write};

use crossterm::style::Stylize;
use hubsync_core::Reporter;
use hubsync_schema::LibraryVersion;

use super::theme::Theme;

/// A cloneable handle for user-facing output.
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
    quiet: bool,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only warnings, errors and failures are printed when quiet.
    pub fn quiet(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
        }
    }

    fn line(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{text}");
    }

    fn name(&self, name: &str) -> String {
        let padded = format!("{name: <width$}", width = self.theme.layout.name_width);
        padded.with(self.theme.colors.library_name).to_string()
    }

    fn version(&self, version: &str) -> String {
        let padded = format!("{version: <width$}", width = self.theme.layout.version_width);
        padded.with(self.theme.colors.version).to_string()
    }

    /// Prints a visual section header for an operation phase.
    pub fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        self.line("");
        self.line(&format!(
            "{} {}",
            title,
            "─".repeat(40).with(self.theme.colors.header)
        ));
    }

    pub fn installing(&self, name: &str, from: &LibraryVersion, to: &LibraryVersion) {
        if self.quiet {
            return;
        }
        let icon = self.theme.icons.active.with(self.theme.colors.active);
        let versions = format!("{from} → {to}");
        self.line(&format!("{icon} {} {}", self.name(name), versions.dark_grey()));
    }

    pub fn done(&self, name: &str, version: &LibraryVersion, detail: &str) {
        if self.quiet {
            return;
        }
        let icon = self.theme.icons.success.with(self.theme.colors.success);
        self.line(&format!(
            "{icon} {} {} {}",
            self.name(name),
            self.version(&version.to_string()),
            detail.with(self.theme.colors.secondary)
        ));
    }

    pub fn skipped(&self, name: &str, reason: &str) {
        if self.quiet {
            return;
        }
        let icon = self.theme.icons.pending.with(self.theme.colors.secondary);
        self.line(&format!(
            "{icon} {} {}",
            self.name(name),
            reason.with(self.theme.colors.secondary)
        ));
    }

    pub fn failed(&self, name: &str, reason: &str) {
        let icon = self.theme.icons.error.with(self.theme.colors.error);
        self.line(&format!(
            "{icon} {} {}",
            self.name(name),
            reason.with(self.theme.colors.error)
        ));
    }

    /// Prints an informational message to the console.
    pub fn info(&self, msg: &str) {
        if self.quiet {
            return;
        }
        let icon = self.theme.icons.info.with(self.theme.colors.secondary);
        self.line(&format!("{icon} {msg}"));
    }

    pub fn success(&self, msg: &str) {
        if self.quiet {
            return;
        }
        let icon = self.theme.icons.success.with(self.theme.colors.success);
        self.line(&format!("{icon} {msg}"));
    }

    pub fn warning(&self, msg: &str) {
        let icon = self.theme.icons.warning.with(self.theme.colors.warning);
        self.line(&format!("{icon} {}", msg.with(self.theme.colors.warning)));
    }

    pub fn error(&self, msg: &str) {
        let icon = self.theme.icons.error.with(self.theme.colors.error);
        self.line(&format!("{icon} {}", msg.with(self.theme.colors.error)));
    }

    /// Prints the pass summary including the total elapsed time.
    pub fn summary(&self, installed: usize, skipped: usize, failed: usize, elapsed_secs: f64) {
        let text = format!(
            "{installed} updated, {skipped} skipped, {failed} failed in {elapsed_secs:.1}s"
        );
        if failed > 0 {
            self.line("");
            self.warning(&text);
        } else if !self.quiet {
            self.line("");
            self.success(&text);
        }
    }

    /// One row of a library table: name, version, and a dimmed note.
    pub fn row(&self, name: &str, version: &str, note: &str) {
        self.line(&format!(
            "  {} {} {}",
            self.name(name),
            self.version(version),
            note.with(self.theme.colors.secondary)
        ));
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        self.section(title);
    }

    fn installing(&self, name: &str, from: &LibraryVersion, to: &LibraryVersion) {
        self.installing(name, from, to);
    }

    fn done(&self, name: &str, version: &LibraryVersion, detail: &str) {
        self.done(name, version, detail);
    }

    fn skipped(&self, name: &str, reason: &str) {
        self.skipped(name, reason);
    }

    fn failed(&self, name: &str, reason: &str) {
        self.failed(name, reason);
    }

    fn info(&self, msg: &str) {
        self.info(msg);
    }

    fn warning(&self, msg: &str) {
        self.warning(msg);
    }

    fn error(&self, msg: &str) {
        self.error(msg);
    }

    fn summary(&self, installed: usize, skipped: usize, failed: usize, elapsed_secs: f64) {
        self.summary(installed, skipped, failed, elapsed_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_creation() {
        let output = Output::new();
        output.info("test");
    }

    #[test]
    fn test_name_is_padded() {
        let output = Output::new();
        let rendered = output.name("H5P.Example");
        assert!(rendered.contains("H5P.Example                 "));
    }

    #[test]
    fn test_quiet_reporter() {
        let output: Box<dyn Reporter> = Box::new(Output::quiet(true));
        output.section("hidden");
        output.failed("H5P.Example", "shown anyway");
        output.summary(0, 1, 0, 0.2);
    }
}
