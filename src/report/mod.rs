//! Formatted terminal output for the one-shot commands.
//!
//! We keep formatting code in one place so:
//! - the load/filter/materialize code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::Frame;
use crate::frame::date_bounds;

/// Number of rows shown by the preview table by default.
pub const PREVIEW_ROWS: usize = 5;

/// Format the load summary line: rows, columns, and the date bounds.
pub fn format_load_summary(frame: &Frame, source: &str) -> String {
    let bounds = match date_bounds(frame) {
        Some((min, max)) => format!("dates=[{}, {}]", min.date(), max.date()),
        None => "dates=none".to_string(),
    };
    format!(
        "Loaded '{source}': {} rows x {} columns | {bounds}\n",
        frame.n_rows(),
        frame.n_cols(),
    )
}

/// Format the first `n` rows as an aligned text table (the preview).
pub fn format_preview(frame: &Frame, n: usize) -> String {
    let head = frame.head(n);

    // Column widths: max of header, type label, and cell contents.
    let mut widths: Vec<usize> = head
        .columns
        .iter()
        .map(|c| c.name.len().max(format!("{:?}", c.ty).len()))
        .collect();
    let cells: Vec<Vec<String>> = head
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.display()).collect())
        .collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();

    for (column, w) in head.columns.iter().zip(&widths) {
        out.push_str(&format!("{:<width$}  ", column.name, width = *w));
    }
    out.push('\n');
    for (column, w) in head.columns.iter().zip(&widths) {
        out.push_str(&format!("{:<width$}  ", format!("{:?}", column.ty), width = *w));
    }
    out.push('\n');

    for row in &cells {
        for (cell, w) in row.iter().zip(&widths) {
            out.push_str(&format!("{:<width$}  ", cell, width = *w));
        }
        out.push('\n');
    }

    if frame.n_rows() > n {
        out.push_str(&format!("... ({} more rows)\n", frame.n_rows() - n));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_frame_from_reader;

    #[test]
    fn preview_shows_header_types_and_truncation() {
        let mut csv = String::from("Date,Close\n");
        for day in 1..=8 {
            csv.push_str(&format!("2024-01-{day:02},{}\n", 100 + day));
        }
        let frame = load_frame_from_reader(csv.as_bytes(), "test.csv").unwrap();

        let preview = format_preview(&frame, 5);
        assert!(preview.contains("Date"));
        assert!(preview.contains("Timestamp"));
        assert!(preview.contains("2024-01-05"));
        assert!(!preview.contains("2024-01-06"));
        assert!(preview.contains("(3 more rows)"));
    }

    #[test]
    fn load_summary_includes_bounds() {
        let frame =
            load_frame_from_reader("Date,Close\n2024-01-01,1\n2024-02-01,2\n".as_bytes(), "t.csv")
                .unwrap();
        let summary = format_load_summary(&frame, "t.csv");
        assert!(summary.contains("2 rows x 2 columns"));
        assert!(summary.contains("dates=[2024-01-01, 2024-02-01]"));
    }
}
