//! Plotters-powered indicator chart widget for Ratatui.
//!
//! One line per country over the observed years. Plotters output is rendered
//! into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// High-contrast palette shared by the plot lines and the legend.
const PALETTE: [(u8, u8, u8); 8] = [
    (0, 255, 255),
    (255, 215, 0),
    (255, 80, 80),
    (0, 255, 0),
    (200, 120, 255),
    (255, 160, 0),
    (120, 170, 255),
    (255, 255, 255),
];

/// Colour of the `idx`-th series as a Plotters colour.
pub fn series_rgb(idx: usize) -> RGBColor {
    let (r, g, b) = PALETTE[idx % PALETTE.len()];
    RGBColor(r, g, b)
}

/// Same colour as `series_rgb`, for Ratatui text.
pub fn series_color(idx: usize) -> Color {
    let (r, g, b) = PALETTE[idx % PALETTE.len()];
    Color::Rgb(r, g, b)
}

/// A render-only chart description; all series and bounds are computed
/// outside the render call.
pub struct IndicatorPlottersChart<'a> {
    /// `(country, points)` where points are `(year, value)`.
    pub series: &'a [(String, Vec<(f64, f64)>)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: String,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for IndicatorPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for (idx, (_, points)) in self.series.iter().enumerate() {
                let color = series_rgb(idx);
                chart.draw_series(LineSeries::new(points.iter().copied(), &color))?;
                // Pixels rather than `Circle`: the backend maps circle radii
                // to canvas units and draws them far too large. Pixels also
                // keep single-year series visible.
                chart.draw_series(points.iter().map(|&(x, y)| Pixel::new((x, y), color)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
