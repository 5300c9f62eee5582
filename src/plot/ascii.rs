//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Two charts, mirroring the interactive surface:
//! - `Close` as a line chart (`-` segments between observations)
//! - `Volume` as filled bars (`#` columns from the baseline)
//!
//! The x axis is the row index of the filtered view, with the first and last
//! dates shown in the header.

use crate::domain::Frame;
use crate::frame::date_bounds;

/// Render the price line chart for the frame's `Close` column.
///
/// An empty string is returned when there is nothing to draw (no `Close`
/// column, no rows, or a flat range too degenerate to scale).
pub fn render_price_chart(frame: &Frame, width: usize, height: usize) -> String {
    let series = frame.numeric_series("Close");
    render_line(frame, "Close", &series, width, height)
}

/// Render the volume bar chart for the frame's `Volume` column.
pub fn render_volume_chart(frame: &Frame, width: usize, height: usize) -> String {
    let series = frame.numeric_series("Volume");
    let Some((y_min, y_max)) = series_range(&series) else {
        return String::new();
    };
    // Bars always start from zero so relative volume stays readable.
    let y_min = y_min.min(0.0);

    let width = width.max(2);
    let height = height.max(2);
    let mut grid = vec![vec![' '; width]; height];

    for (i, &v) in series.iter().enumerate() {
        let x = map_x(i, series.len(), width);
        let top = map_y(v, y_min, y_max, height);
        for row in grid.iter_mut().take(height).skip(top) {
            row[x] = '#';
        }
    }

    finish(frame, "Volume", y_min, y_max, grid)
}

fn render_line(frame: &Frame, label: &str, series: &[f64], width: usize, height: usize) -> String {
    let Some((y_min, y_max)) = series_range(series) else {
        return String::new();
    };

    let width = width.max(2);
    let height = height.max(2);
    let mut grid = vec![vec![' '; width]; height];

    let mut prev: Option<(usize, usize)> = None;
    for (i, &v) in series.iter().enumerate() {
        let x = map_x(i, series.len(), width);
        let y = map_y(v, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(&mut grid, x0, y0, x, y, '-');
        }
        grid[y][x] = 'o';
        prev = Some((x, y));
    }

    finish(frame, label, y_min, y_max, grid)
}

fn finish(frame: &Frame, label: &str, y_min: f64, y_max: f64, grid: Vec<Vec<char>>) -> String {
    let span = match date_bounds(frame) {
        Some((min, max)) => format!("{} .. {}", min.date(), max.date()),
        None => "no dates".to_string(),
    };

    let mut out = String::new();
    out.push_str(&format!("{label}: [{y_min:.2}, {y_max:.2}] | {span}\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn series_range(series: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in series {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() {
        if max > min {
            Some((min, max))
        } else {
            // Flat series: pad so a single horizontal line still renders.
            Some((min - 1.0, max + 1.0))
        }
    } else {
        None
    }
}

fn map_x(i: usize, n: usize, width: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let u = i as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(v: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((v - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_frame_from_reader;

    fn frame() -> Frame {
        load_frame_from_reader(
            "Date,Close,Volume\n\
             2024-01-01,100,1000\n\
             2024-01-02,110,2000\n\
             2024-01-03,105,500\n"
                .as_bytes(),
            "t.csv",
        )
        .unwrap()
    }

    #[test]
    fn price_chart_is_deterministic_and_labeled() {
        let a = render_price_chart(&frame(), 20, 8);
        let b = render_price_chart(&frame(), 20, 8);
        assert_eq!(a, b);
        assert!(a.starts_with("Close: [100.00, 110.00] | 2024-01-01 .. 2024-01-03\n"));
        assert!(a.contains('o'));
    }

    #[test]
    fn volume_chart_draws_bars_from_baseline() {
        let chart = render_volume_chart(&frame(), 20, 8);
        assert!(chart.starts_with("Volume:"));
        // The tallest bar (2000) must reach the top row of the grid.
        let rows: Vec<&str> = chart.lines().skip(1).collect();
        assert!(rows[0].contains('#'));
        // Bars are filled down to the bottom row.
        assert!(rows[rows.len() - 1].contains('#'));
    }

    #[test]
    fn missing_column_renders_nothing() {
        let frame = load_frame_from_reader("Date,Open\n2024-01-01,1\n".as_bytes(), "t.csv").unwrap();
        assert!(render_price_chart(&frame, 20, 8).is_empty());
        assert!(render_volume_chart(&frame, 20, 8).is_empty());
    }
}
