//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each country's series is drawn with its own marker character, joined by
//! `.` segments; a legend follows the grid.

use crate::domain::IndicatorTable;

/// Per-country markers, assigned in table country order.
const MARKERS: [char; 10] = ['J', 'U', 'C', 'D', 'G', 'I', 'A', 'B', 'E', 'F'];

/// Render one indicator over time, one series per country.
pub fn render_ascii_plot(table: &IndicatorTable, label: &str, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let series: Vec<(&str, Vec<(i32, f64)>)> = table
        .countries()
        .into_iter()
        .map(|c| (c, table.series(label, c)))
        .collect();

    let Some((x_min, x_max)) = x_range(&series) else {
        return format!("Plot: {label} | (no data)\n");
    };
    let (y_min, y_max) = y_range(&series).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Connectors first so markers overlay them.
    for (_, points) in &series {
        for pair in points.windows(2) {
            draw_segment(&mut grid, pair[0], pair[1], (x_min, x_max), (y_min, y_max));
        }
    }
    for (idx, (_, points)) in series.iter().enumerate() {
        let marker = marker_for(idx);
        for &(year, value) in points {
            let x = map_x(year as f64, x_min as f64, x_max as f64, width);
            let y = map_y(value, y_min, y_max, height);
            grid[y][x] = marker;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {label} | years=[{x_min}, {x_max}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(idx, (country, _))| format!("{}={country}", marker_for(idx)))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join("  ")));
    out
}

fn marker_for(idx: usize) -> char {
    MARKERS.get(idx).copied().unwrap_or('*')
}

fn x_range(series: &[(&str, Vec<(i32, f64)>)]) -> Option<(i32, i32)> {
    let years = series.iter().flat_map(|(_, pts)| pts.iter().map(|(y, _)| *y));
    let min = years.clone().min()?;
    let max = years.max()?;
    Some((min, max))
}

fn y_range(series: &[(&str, Vec<(i32, f64)>)]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (_, pts) in series {
        for &(_, v) in pts {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo.is_finite() && hi.is_finite() {
        Some((lo, hi))
    } else {
        None
    }
}

fn pad_range(lo: f64, hi: f64, frac: f64) -> (f64, f64) {
    if (hi - lo).abs() < 1e-12 {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * frac;
    (lo - pad, hi + pad)
}

fn draw_segment(
    grid: &mut [Vec<char>],
    a: (i32, f64),
    b: (i32, f64),
    (x_min, x_max): (i32, i32),
    (y_min, y_max): (f64, f64),
) {
    let height = grid.len();
    let width = grid.first().map(Vec::len).unwrap_or(0);
    let x0 = map_x(a.0 as f64, x_min as f64, x_max as f64, width);
    let x1 = map_x(b.0 as f64, x_min as f64, x_max as f64, width);
    if x1 <= x0 + 1 {
        return;
    }
    for x in (x0 + 1)..x1 {
        let u = (x - x0) as f64 / (x1 - x0) as f64;
        let v = a.1 + u * (b.1 - a.1);
        let y = map_y(v, y_min, y_max, height);
        if grid[y][x] == ' ' {
            grid[y][x] = '.';
        }
    }
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    if (x_max - x_min).abs() < 1e-12 {
        return width / 2;
    }
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top of the plot.
    let row = ((1.0 - u) * (height as f64 - 1.0)).round() as usize;
    row.min(height - 1)
}
