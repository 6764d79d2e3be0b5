use std::io::{self, Write};

use termcolor::{Color, ColorSpec, StandardStream, WriteColor};
use tracing::debug;
use udise_core::Notifier;

use crate::formatters::color_choice;

/// Prints sync notifications as coloured lines on stdout
pub struct TerminalNotifier;

impl TerminalNotifier {
    fn print(&self, color: Color, prefix: &str, message: &str) -> io::Result<()> {
        let mut stdout = StandardStream::stdout(color_choice());
        stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(stdout, "{}", prefix)?;
        stdout.reset()?;
        writeln!(stdout, " {}", message)
    }
}

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        if let Err(e) = self.print(Color::Green, "✔", message) {
            debug!(error = %e, "failed to print notification");
        }
    }

    fn error(&self, message: &str) {
        if let Err(e) = self.print(Color::Red, "✘", message) {
            debug!(error = %e, "failed to print notification");
        }
    }
}
