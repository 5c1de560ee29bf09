//! PNG chart rendering with plotters: grouped bar charts with per-bar
//! value labels, and multi-series line charts.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::info;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 540;

const SERIES_COLORS: [RGBColor; 6] = [
    RGBColor(114, 158, 206),
    RGBColor(255, 158, 74),
    RGBColor(103, 191, 92),
    RGBColor(237, 102, 93),
    RGBColor(173, 139, 201),
    RGBColor(168, 120, 110),
];

fn series_color(index: usize) -> RGBColor {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

fn chart_err<E: std::fmt::Display>(err: E) -> anyhow::Error {
    anyhow::anyhow!("chart rendering failed: {err}")
}

pub struct GroupedBars {
    pub x_label: String,
    pub y_label: String,
    /// X-axis groups, in display order.
    pub categories: Vec<String>,
    /// Bars within each group, in display (and legend) order.
    pub series: Vec<String>,
    /// Bar heights keyed by (category, series); missing cells read as 0.
    pub values: BTreeMap<(String, String), f64>,
    pub y_max: Option<f64>,
}

impl GroupedBars {
    fn height(&self, category: &str, series: &str) -> f64 {
        self.values
            .get(&(category.to_string(), series.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

pub fn draw_grouped_bars(spec: &GroupedBars, out: &Path) -> Result<()> {
    let root = BitMapBackend::new(out, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    // One slot per bar plus a separator slot between groups.
    let group_width = spec.series.len() + 1;
    let x_max = (spec.categories.len() * group_width) as f64;
    let y_max = spec.y_max.unwrap_or_else(|| {
        let tallest = spec.values.values().cloned().fold(0.0, f64::max);
        if tallest > 0.0 { tallest * 1.2 } else { 1.0 }
    });

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_x_axis()
        .y_desc(spec.y_label.clone())
        .y_label_style(("sans-serif", 16).into_font())
        .axis_desc_style(("sans-serif", 18).into_font())
        .draw()
        .map_err(chart_err)?;

    for (si, series) in spec.series.iter().enumerate() {
        let color = series_color(si);
        chart
            .draw_series(spec.categories.iter().enumerate().map(|(ci, category)| {
                let x0 = (ci * group_width + si) as f64;
                let height = spec.height(category, series);
                let mut bar = Rectangle::new([(x0, 0.0), (x0 + 1.0, height)], color.filled());
                bar.set_margin(0, 0, 2, 2);
                bar
            }))
            .map_err(chart_err)?
            .label(series.clone())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
    }

    // Bar height labels, as in the study's figures; zero bars stay bare.
    let label_style = ("sans-serif", 13)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    for (si, series) in spec.series.iter().enumerate() {
        for (ci, category) in spec.categories.iter().enumerate() {
            let height = spec.height(category, series);
            if height <= 0.0 {
                continue;
            }
            let x_center = (ci * group_width + si) as f64 + 0.5;
            chart
                .plotting_area()
                .draw(&Text::new(
                    format!("{height:.0}"),
                    (x_center, height),
                    label_style.clone(),
                ))
                .map_err(chart_err)?;
        }
    }

    // Category names centered under each group, x-axis title below them.
    for (ci, category) in spec.categories.iter().enumerate() {
        let center = (ci * group_width) as f64 + spec.series.len() as f64 / 2.0;
        let (px, py) = chart.plotting_area().map_coordinate(&(center, 0.0));
        root.draw(&Text::new(
            category.clone(),
            (px, py + 8),
            ("sans-serif", 16)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        ))
        .map_err(chart_err)?;
    }
    root.draw(&Text::new(
        spec.x_label.clone(),
        ((WIDTH / 2) as i32, (HEIGHT - 22) as i32),
        ("sans-serif", 18)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top)),
    ))
    .map_err(chart_err)?;

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 15).into_font())
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!(chart = %out.display(), "chart written");
    Ok(())
}

pub struct LineChart {
    pub x_label: String,
    pub y_label: String,
    /// (legend label, points) per line.
    pub series: Vec<(String, Vec<(f64, f64)>)>,
}

pub fn draw_lines(spec: &LineChart, out: &Path) -> Result<()> {
    let root = BitMapBackend::new(out, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let points = spec.series.iter().flat_map(|(_, pts)| pts.iter());
    let x_hi = points
        .clone()
        .map(|(x, _)| *x)
        .fold(f64::MIN, f64::max)
        .max(1.0);
    let y_hi = points.map(|(_, y)| *y).fold(0.0, f64::max).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..x_hi * 1.05, 0f64..y_hi * 1.15)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_label.clone())
        .y_desc(spec.y_label.clone())
        .label_style(("sans-serif", 15).into_font())
        .axis_desc_style(("sans-serif", 18).into_font())
        .draw()
        .map_err(chart_err)?;

    for (index, (label, points)) in spec.series.iter().enumerate() {
        let color = series_color(index);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(chart_err)?
            .label(label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
            });
        chart
            .draw_series(
                points
                    .iter()
                    .map(|point| Circle::new(*point, 3, color.filled())),
            )
            .map_err(chart_err)?;
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .label_font(("sans-serif", 15).into_font())
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!(chart = %out.display(), "chart written");
    Ok(())
}
