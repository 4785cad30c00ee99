use crate::model::{RepositoryResult, Report};
use crate::util::percent;
use console::{measure_text_width, style};
use std::io::{self, Write};

const HEADER: [&str; 3] = ["DIRECTORY", "CHANGES", "AUTHORS"];
const PADDING: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    pub files: bool,
    pub messages: bool,
    pub color: bool,
}

enum Row {
    Cells([String; 3]),
    Line(String),
}

pub fn write_json<W: Write>(report: &Report, out: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

/// Writes the report as aligned columns, one row per repository and
/// optionally one per file and commit message beneath it.
pub fn write_table<W: Write>(report: &Report, options: TableOptions, out: &mut W) -> io::Result<()> {
    let mut rows = Vec::new();
    for repo in &report.repositories {
        rows.push(Row::Cells([
            repo.path.display().to_string(),
            changes_cell(repo.changes, report.total_changes),
            repo.authors.join(", "),
        ]));
        if options.files || options.messages {
            push_files(&mut rows, repo, options.messages);
        }
    }

    let mut widths = HEADER.map(measure_text_width);
    for row in &rows {
        if let Row::Cells(cells) = row {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(measure_text_width(cell));
            }
        }
    }

    let header = format_cells(&HEADER.map(String::from), &widths);
    if options.color {
        writeln!(out, "{}", style(header).bold().force_styling(true))?;
    } else {
        writeln!(out, "{header}")?;
    }

    for row in &rows {
        match row {
            Row::Cells(cells) => writeln!(out, "{}", format_cells(cells, &widths))?,
            Row::Line(line) => writeln!(out, "{line}")?,
        }
    }
    Ok(())
}

fn push_files(rows: &mut Vec<Row>, repo: &RepositoryResult, messages: bool) {
    for file in &repo.files {
        rows.push(Row::Cells([
            format!("  {}", file.path),
            changes_cell(file.changes, repo.changes),
            file.authors.join(", "),
        ]));
        if messages {
            rows.extend(file.messages.iter().map(|m| Row::Line(format!("      {m}"))));
        }
    }
}

fn changes_cell(changes: u64, total: u64) -> String {
    format!("{:>2}% ({changes})", percent(changes, total))
}

/// Pads every cell but the last to its column width; the last is left ragged.
fn format_cells(cells: &[String; 3], widths: &[usize; 3]) -> String {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        line.push_str(cell);
        if i + 1 < cells.len() {
            let pad = widths[i] - measure_text_width(cell) + PADDING;
            line.push_str(&" ".repeat(pad));
        }
    }
    line.trim_end().to_string()
}
