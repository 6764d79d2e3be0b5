use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use udise_core::{QuerySnapshot, SchoolRecord, SyncSnapshot, SyncStage, SyncState, SyncStatus};

use crate::args::OutputFormat;

pub fn color_choice() -> ColorChoice {
    if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

#[derive(Serialize)]
struct SchoolRow<'a> {
    #[serde(flatten)]
    record: &'a SchoolRecord,
    sync_state: SyncState,
}

#[derive(Serialize)]
struct SchoolListing<'a> {
    total: u64,
    has_more: bool,
    page: u32,
    schools: Vec<SchoolRow<'a>>,
}

pub struct SchoolListFormatter {
    output: OutputFormat,
    stdout: StandardStream,
}

impl SchoolListFormatter {
    pub fn new(output: OutputFormat) -> Self {
        SchoolListFormatter {
            output,
            stdout: StandardStream::stdout(color_choice()),
        }
    }

    /// `next_query` is printed as a hint when more pages exist
    pub fn print_schools(
        &mut self,
        snapshot: &QuerySnapshot,
        next_query: Option<&str>,
    ) -> io::Result<()> {
        match self.output {
            OutputFormat::Json => self.print_json(snapshot),
            OutputFormat::Plain => self.print_plain(&snapshot.results.records),
            OutputFormat::Pretty => self.print_pretty(snapshot, next_query),
        }
    }

    fn print_json(&mut self, snapshot: &QuerySnapshot) -> io::Result<()> {
        let listing = SchoolListing {
            total: snapshot.results.total_count,
            has_more: snapshot.results.has_more,
            page: snapshot.loaded_page,
            schools: snapshot
                .results
                .records
                .iter()
                .map(|record| SchoolRow {
                    record,
                    sync_state: record.sync_state(),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&listing).map_err(io::Error::other)?;
        writeln!(self.stdout, "{}", json)
    }

    fn print_plain(&mut self, records: &[SchoolRecord]) -> io::Result<()> {
        for record in records {
            writeln!(
                self.stdout,
                "{}\t{}\t{}\t{}\t{}",
                record.udise_code,
                record.name,
                record.block.as_deref().unwrap_or(""),
                record.pincode.as_deref().unwrap_or(""),
                state_label(record.sync_state()),
            )?;
        }
        Ok(())
    }

    fn print_pretty(
        &mut self,
        snapshot: &QuerySnapshot,
        next_query: Option<&str>,
    ) -> io::Result<()> {
        let results = &snapshot.results;

        for record in &results.records {
            self.stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            write!(self.stdout, "{}", record.udise_code)?;
            self.stdout.reset()?;
            write!(self.stdout, "  {}", record.name)?;

            let place: Vec<&str> = [record.block.as_deref(), record.pincode.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !place.is_empty() {
                write!(self.stdout, " ({})", place.join(", "))?;
            }

            let (color, label) = match record.sync_state() {
                SyncState::Synced => (Color::Green, "report available"),
                SyncState::DirectoryOnly => (Color::Yellow, "directory only"),
            };
            self.stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
            writeln!(self.stdout, "  [{}]", label)?;
            self.stdout.reset()?;
        }

        self.stdout.set_color(ColorSpec::new().set_dimmed(true))?;
        writeln!(
            self.stdout,
            "Showing {} of {} schools",
            results.records.len(),
            results.total_count
        )?;
        if let Some(query) = next_query {
            writeln!(self.stdout, "More results: udise schools --query '{}'", query)?;
        }
        self.stdout.reset()
    }
}

fn state_label(state: SyncState) -> &'static str {
    match state {
        SyncState::Synced => "synced",
        SyncState::DirectoryOnly => "directory_only",
    }
}

/// One line per sync stage
pub fn print_sync_statuses(snapshot: &SyncSnapshot) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());

    for stage in SyncStage::ALL {
        let status = snapshot.status(stage);
        let color = match status {
            SyncStatus::Idle => Color::White,
            SyncStatus::Syncing(_) => Color::Blue,
            SyncStatus::Success(_) => Color::Green,
            SyncStatus::Error(_) => Color::Red,
        };

        write!(stdout, "{:<10}", stage.label())?;
        stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(stdout, "{:<8}", status.label())?;
        stdout.reset()?;
        writeln!(stdout, " {}", status.message().unwrap_or(""))?;
    }

    Ok(())
}
