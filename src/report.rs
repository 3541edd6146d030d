//! Text and JSON rendering of report views.

use std::io::{self, Write};

use serde::Serialize;

use twinscan_analyze::ReportRow;

use crate::settings::ReportStyle;

/// A titled list of rows.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub title: String,
    pub rows: Vec<ReportRow>,
}

impl View {
    pub fn new(title: impl Into<String>, rows: Vec<ReportRow>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }
}

/// Renders views as aligned text tables.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    style: ReportStyle,
}

impl TextRenderer {
    pub fn new(style: ReportStyle) -> Self {
        Self { style }
    }

    /// Write one view: heading, then a table or "None found.".
    pub fn render<W: Write>(&self, view: &View, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", view.title)?;
        writeln!(out, "{}", "─".repeat(view.title.chars().count()))?;

        if view.rows.is_empty() {
            writeln!(out, "None found.")?;
            return writeln!(out);
        }

        let cells: Vec<[String; 5]> = view.rows.iter().map(|row| self.cells(row)).collect();
        let header = ["digest", "kind", "size", "name", "parent name"].map(String::from);

        let mut widths = header.clone().map(|h| h.chars().count());
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        self.write_line(out, &header, &widths)?;
        for row in &cells {
            self.write_line(out, row, &widths)?;
        }
        writeln!(out)
    }

    fn cells(&self, row: &ReportRow) -> [String; 5] {
        let digest = match self.style.digest_chars {
            0 => row.digest.clone(),
            n => row.digest.chars().take(n).collect(),
        };
        let size = if self.style.human_sizes {
            humansize::format_size(row.size, humansize::BINARY)
        } else {
            row.size.to_string()
        };
        [
            digest,
            row.kind.to_string(),
            size,
            truncate(&row.name, self.style.max_width),
            truncate(&row.parent_name, self.style.max_width),
        ]
    }

    fn write_line<W: Write>(&self, out: &mut W, cells: &[String; 5], widths: &[usize; 5]) -> io::Result<()> {
        let [digest, kind, size, name, parent] = cells;
        let line = format!(
            "{digest:<w0$}  {kind:<w1$}  {size:>w2$}  {name:<w3$}  {parent}",
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        );
        writeln!(out, "{}", line.trim_end())
    }
}

/// Write every view as one pretty JSON array.
pub fn render_json<W: Write>(views: &[View], out: &mut W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, views)?;
    writeln!(out).map_err(serde_json::Error::io)
}

/// Truncate a string to `max_len` characters; 0 disables truncation.
fn truncate(s: &str, max_len: usize) -> String {
    if max_len == 0 || s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_len.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
