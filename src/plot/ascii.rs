//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks of a reconstruction
//! - deterministic output
//!
//! Plot elements:
//! - observed days: `o`
//! - interpolated/extrapolated days: `*`
//! - line between consecutive filled days: `-`

use crate::domain::{Fill, ReconstructedRow};

/// Render a reconstructed series, one x-position per day.
pub fn render_series_plot(rows: &[ReconstructedRow], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut out = String::new();
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        out.push_str("Plot: no rows\n");
        return out;
    };

    let Some((data_min, data_max)) = y_range(rows) else {
        out.push_str(&format!("Plot: {}..{} | no values\n", first.date, last.date));
        return out;
    };
    let (y_min, y_max) = pad_range(data_min, data_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let n = rows.len();

    // Line first so points can overlay.
    let mut prev = None;
    for (i, row) in rows.iter().enumerate() {
        match row.reconstructed {
            Some(v) => {
                let x = map_x(i, n, width);
                let y = map_y(v, y_min, y_max, height);
                if let Some((x0, y0)) = prev {
                    draw_line(&mut grid, x0, y0, x, y, '-');
                }
                prev = Some((x, y));
            }
            None => prev = None,
        }
    }

    for (i, row) in rows.iter().enumerate() {
        let Some(v) = row.reconstructed else {
            continue;
        };
        let ch = match row.fill {
            Fill::Observed => 'o',
            _ => '*',
        };
        grid[map_y(v, y_min, y_max, height)][map_x(i, n, width)] = ch;
    }

    out.push_str(&format!(
        "Plot: {}..{} | tvl=[{data_min:.2}, {data_max:.2}]\n",
        first.date, last.date
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out.push_str("o observed  * filled\n");
    out
}

fn y_range(rows: &[ReconstructedRow]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for v in rows.iter().filter_map(|r| r.reconstructed) {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }
    if min_y.is_finite() && max_y.is_finite() {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(idx: usize, n: usize, width: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let u = idx as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
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
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn plot_marks_observed_and_filled_days() {
        let rows = vec![
            ReconstructedRow::observed(day(1), 100.0),
            ReconstructedRow::filled(day(2), 150.0, Fill::Interpolated),
            ReconstructedRow::observed(day(3), 200.0),
        ];
        let txt = render_series_plot(&rows, 10, 5);
        let lines: Vec<&str> = txt.lines().collect();

        assert_eq!(lines[0], "Plot: 2025-01-01..2025-01-03 | tvl=[100.00, 200.00]");
        assert_eq!(lines.len(), 1 + 5 + 1);
        // Highest value top-right, lowest bottom-left, midpoint in the middle row.
        assert_eq!(lines[1].chars().nth(9), Some('o'));
        assert_eq!(lines[5].chars().next(), Some('o'));
        assert_eq!(lines[3].chars().nth(5), Some('*'));
        assert!(lines[1..=5].iter().any(|l| l.contains('-')));
    }

    #[test]
    fn plot_breaks_line_on_missing_days() {
        let rows = vec![
            ReconstructedRow::observed(day(1), 100.0),
            ReconstructedRow::missing(day(2)),
            ReconstructedRow::observed(day(3), 100.0),
        ];
        let txt = render_series_plot(&rows, 10, 5);
        let grid: Vec<&str> = txt.lines().skip(1).take(5).collect();
        assert!(grid.iter().all(|l| !l.contains('-')));
        assert_eq!(grid.iter().map(|l| l.matches('o').count()).sum::<usize>(), 2);
    }

    #[test]
    fn plot_without_values() {
        let rows = vec![ReconstructedRow::missing(day(1))];
        assert_eq!(
            render_series_plot(&rows, 10, 5),
            "Plot: 2025-01-01..2025-01-01 | no values\n"
        );
        assert_eq!(render_series_plot(&[], 10, 5), "Plot: no rows\n");
    }
}
