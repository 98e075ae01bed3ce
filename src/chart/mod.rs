//! SVG chart rendering.
//!
//! Both chart paths funnel into one line-chart renderer: the batch path
//! feeds it registry series averaged per image size, the standalone path
//! feeds it raw per-group series built from caller-named columns.

use crate::models::{Measurement, Metric};
use anyhow::{anyhow, bail, Context, Result};
use plotters::coord::ranged1d::Ranged;
use plotters::coord::types::RangedCoordf64;
use plotters::element::DashedPathElement;
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Written verbatim when the standalone renderer has no data. Automation
/// downstream always expects an image artifact at the output path.
pub const PLACEHOLDER_SVG: &str = "<svg width=\"500\" height=\"50\" xmlns=\"http://www.w3.org/2000/svg\"><text x=\"10\" y=\"30\" font-family=\"sans-serif\" font-size=\"16px\" fill=\"grey\">No data to plot yet.</text></svg>";

const CHART_SIZE: (u32, u32) = (1000, 600);

/// Maximum grid lines (and axis labels) per axis.
const GRID_LINE_COUNT: usize = 10;

/// Named series of (x, y) points, one per group, plotted as a line.
pub type Series = Vec<(String, Vec<(f64, f64)>)>;

/// Build one series per registry with the metric averaged within each
/// (registry, size) pair, points ordered by size ascending.
pub fn averaged_series(rows: &[Measurement], metric: Metric) -> Series {
    let mut groups: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.registry.clone())
            .or_default()
            .push((row.size_mb, metric.value(row)));
    }

    groups
        .into_iter()
        .map(|(name, mut points)| {
            points.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut averaged = Vec::new();
            let mut i = 0;
            while i < points.len() {
                let x = points[i].0;
                let mut sum = 0.0;
                let mut count = 0usize;
                while i < points.len() && points[i].0.to_bits() == x.to_bits() {
                    sum += points[i].1;
                    count += 1;
                    i += 1;
                }
                averaged.push((x, sum / count as f64));
            }

            (name, averaged)
        })
        .collect()
}

/// Build one raw (non-averaged) series per distinct value of the group
/// column, points ordered by the x column ascending. The x and y columns
/// must name numeric schema columns.
pub fn grouped_series(
    rows: &[Measurement],
    x_col: &str,
    y_col: &str,
    group_col: &str,
) -> Result<Series> {
    let mut groups: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();

    for row in rows {
        let key = row
            .text_field(group_col)
            .with_context(|| format!("Unknown group column: {}", group_col))?;
        let x = row
            .numeric_field(x_col)
            .with_context(|| format!("Not a numeric column: {}", x_col))?;
        let y = row
            .numeric_field(y_col)
            .with_context(|| format!("Not a numeric column: {}", y_col))?;
        groups.entry(key).or_default().push((x, y));
    }

    Ok(groups
        .into_iter()
        .map(|(name, mut points)| {
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            (name, points)
        })
        .collect())
}

/// Render a line chart with point markers, one colored series per group,
/// to an SVG file. Parent directories are created as needed.
pub fn render_line_chart(
    output: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    legend_title: &str,
    series: &Series,
) -> Result<()> {
    let ((x_min, x_max), (y_min, y_max)) = axis_ranges(series)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let root = SVGBackend::new(output, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("Failed to clear chart background: {}", e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| anyhow!("Failed to build chart axes: {}", e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(GRID_LINE_COUNT)
        .y_labels(GRID_LINE_COUNT)
        .x_desc(x_label)
        .y_desc(y_label)
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 13))
        .draw()
        .map_err(|e| anyhow!("Failed to draw chart axes: {}", e))?;

    // Mesh lines can't be dashed, so the grid is drawn by hand at the same
    // key points the axis labels use.
    let grid_style = RGBColor(200, 200, 200).stroke_width(1);
    for x in RangedCoordf64::from(x_min..x_max).key_points(GRID_LINE_COUNT) {
        chart
            .draw_series(std::iter::once(DashedPathElement::new(
                vec![(x, y_min), (x, y_max)],
                5,
                4,
                grid_style,
            )))
            .map_err(|e| anyhow!("Failed to draw chart grid: {}", e))?;
    }
    for y in RangedCoordf64::from(y_min..y_max).key_points(GRID_LINE_COUNT) {
        chart
            .draw_series(std::iter::once(DashedPathElement::new(
                vec![(x_min, y), (x_max, y)],
                5,
                4,
                grid_style,
            )))
            .map_err(|e| anyhow!("Failed to draw chart grid: {}", e))?;
    }

    for (idx, (name, points)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let style = color.stroke_width(2);

        chart
            .draw_series(LineSeries::new(points.iter().copied(), style))
            .map_err(|e| anyhow!("Failed to draw series {}: {}", name, e))?
            .label(name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], style));

        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, 3, color.filled())))
            .map_err(|e| anyhow!("Failed to draw markers for {}: {}", name, e))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .draw()
        .map_err(|e| anyhow!("Failed to draw legend: {}", e))?;

    // The legend box itself has no title slot, so the grouping-field name
    // goes just above it.
    root.draw(&Text::new(
        legend_title.to_string(),
        (CHART_SIZE.0 as i32 - 170, 55),
        ("sans-serif", 14).into_font().color(&BLACK),
    ))
    .map_err(|e| anyhow!("Failed to draw legend title: {}", e))?;

    root.present()
        .map_err(|e| anyhow!("Failed to write {}: {}", output.display(), e))?;

    Ok(())
}

/// Write the fixed "no data yet" placeholder image.
pub fn write_placeholder(output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(output, PLACEHOLDER_SVG)
        .with_context(|| format!("Failed to write placeholder to {}", output.display()))
}

/// Padded (x, y) axis ranges covering every point in every series.
fn axis_ranges(series: &Series) -> Result<((f64, f64), (f64, f64))> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for (_, points) in series {
        for &(x, y) in points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }

    if !x_min.is_finite() || !y_min.is_finite() {
        bail!("No data points to plot");
    }

    Ok((pad_range(x_min, x_max), pad_range(y_min, y_max)))
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    let mut pad = (max - min) * 0.05;
    if pad == 0.0 {
        pad = 1.0;
    }
    (min - pad, max + pad)
}
