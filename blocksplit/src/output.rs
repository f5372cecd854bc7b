//! Report rendering: styled tables, JSON, and progress reporting.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::analyzer::FileReport;

fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);

    if cfg!(test) {
        table.set_width(120);
    }
    table
}

fn format_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print the analysis reports as styled tables with a summary line.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_reports(writer: &mut impl Write, reports: &[FileReport]) -> Result<()> {
    writeln!(writer, "\n{}", "Split lines".bold().underline())?;
    let mut table = create_table(vec!["File", "Function", "Split lines", "Status"]);

    for report in reports {
        if let Some(error) = &report.error {
            table.add_row(vec![
                Cell::new(&report.file).add_attribute(Attribute::Dim),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(error).fg(Color::Red),
            ]);
            continue;
        }
        for function in &report.functions {
            let (status, color) = match &function.error {
                Some(error) => (format!("degraded: {error}"), Color::Yellow),
                None => ("ok".to_owned(), Color::Green),
            };
            table.add_row(vec![
                Cell::new(&report.file).add_attribute(Attribute::Dim),
                Cell::new(&function.name).add_attribute(Attribute::Bold),
                Cell::new(format_lines(&function.split_lines)),
                Cell::new(status).fg(color),
            ]);
        }
    }
    writeln!(writer, "{table}")?;

    let total_functions: usize = reports.iter().map(|r| r.functions.len()).sum();
    let failed_files = reports.iter().filter(|r| r.error.is_some()).count();
    let degraded: usize = reports
        .iter()
        .flat_map(|r| &r.functions)
        .filter(|f| f.error.is_some())
        .count();
    writeln!(
        writer,
        "{} {} file(s), {} function(s), {} degraded, {} failed",
        "Summary:".bold(),
        reports.len(),
        total_functions,
        degraded,
        failed_files
    )?;
    Ok(())
}

/// Print the analysis reports as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn print_json(writer: &mut impl Write, reports: &[FileReport]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, reports)?;
    writeln!(writer)?;
    Ok(())
}

/// Create a progress bar for a known file count.
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_progress_bar(total_files: u64) -> ProgressBar {
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let pb =
        ProgressBar::with_draw_target(Some(total_files), ProgressDrawTarget::stderr_with_hz(20));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message("analyzing...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.tick();
    pb
}
