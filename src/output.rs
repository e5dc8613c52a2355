//! Output sinks and styled console helpers.
//!
//! The organizer only ever talks to a [`MessageWriter`]. The console
//! implementation routes lines through an `indicatif` spinner so progress
//! and log lines never interleave; [`BufferedMessageWriter`] keeps lines in
//! memory for tests and reports.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::time::Duration;

/// Line-oriented log sink. No levels, no structure.
pub trait MessageWriter {
    fn write_line(&self, line: &str);
}

/// Writes each line above a spinner that ticks once per line.
pub struct ConsoleMessageWriter {
    spinner: ProgressBar,
}

impl ConsoleMessageWriter {
    pub fn new() -> Self {
        let spinner = OutputFormatter::create_spinner();
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self { spinner }
    }

    /// Sets the text shown next to the spinner.
    pub fn set_status(&self, status: &str) {
        self.spinner.set_message(status.to_string());
    }

    /// Stops and clears the spinner. Later lines go straight to stdout.
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Default for ConsoleMessageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageWriter for ConsoleMessageWriter {
    fn write_line(&self, line: &str) {
        // A hidden bar (stdout not a terminal) swallows println.
        if self.spinner.is_hidden() || self.spinner.is_finished() {
            println!("{}", line);
        } else {
            self.spinner.println(line);
            self.spinner.tick();
        }
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct BufferedMessageWriter {
    lines: RefCell<Vec<String>>,
}

impl BufferedMessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|line| line.contains(needle))
    }
}

impl MessageWriter for BufferedMessageWriter {
    fn write_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Styled one-off messages for the command-line front end.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortfold::output::OutputFormatter;
    /// OutputFormatter::success("Source directory fully processed");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortfold::output::OutputFormatter;
    /// OutputFormatter::warning("Files with extensions .tmp will be deleted");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a bold section header preceded by a blank line.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates the spinner used while a run is in progress.
    pub fn create_spinner() -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {elapsed} {msg}")
                .expect("Invalid spinner template"),
        );
        spinner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_writer_keeps_order() {
        let writer = BufferedMessageWriter::new();
        writer.write_line("first");
        writer.write_line("second");

        assert_eq!(writer.lines(), vec!["first".to_string(), "second".to_string()]);
        assert!(writer.contains("sec"));
        assert!(!writer.contains("third"));
    }

    #[test]
    fn test_writer_is_usable_as_trait_object() {
        let writer = BufferedMessageWriter::new();
        let sink: &dyn MessageWriter = &writer;
        sink.write_line("via trait");
        assert_eq!(writer.lines().len(), 1);
    }
}
