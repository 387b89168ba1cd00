//! Coloured terminal output for the run summary.
//!
//! Progress logging goes through `log`; this is only for the human-facing
//! summary printed at the end of a run.

use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Writes styled messages to stdout (and warnings to stderr).
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    color: ColorChoice,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        let color = if std::env::var_os("NO_COLOR").is_some() {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Self {
            verbose,
            quiet,
            color,
        }
    }

    fn styled(
        &self,
        mut stream: StandardStream,
        color: Option<Color>,
        bold: bool,
        prefix: &str,
        message: &str,
    ) -> io::Result<()> {
        stream.set_color(ColorSpec::new().set_fg(color).set_bold(bold))?;
        write!(stream, "{prefix}")?;
        stream.reset()?;
        writeln!(stream, "{message}")
    }

    fn stdout(&self) -> StandardStream {
        StandardStream::stdout(self.color)
    }

    /// Bold section header.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut out = self.stdout();
        writeln!(out)?;
        self.styled(out, Some(Color::Cyan), true, "", title)
    }

    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.styled(self.stdout(), Some(Color::Blue), true, "→ ", message)
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.styled(self.stdout(), Some(Color::Green), true, "✓ ", message)
    }

    /// Warnings are printed even in quiet mode.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        self.styled(
            StandardStream::stderr(self.color),
            Some(Color::Yellow),
            true,
            "⚠ ",
            message,
        )
    }

    pub fn error(&self, message: &str) -> io::Result<()> {
        self.styled(
            StandardStream::stderr(self.color),
            Some(Color::Red),
            true,
            "✗ ",
            message,
        )
    }

    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.stdout(), "  {message}")
    }

    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if self.verbose && !self.quiet {
            self.styled(self.stdout(), Some(Color::White), false, "  ", message)
        } else {
            Ok(())
        }
    }
}
