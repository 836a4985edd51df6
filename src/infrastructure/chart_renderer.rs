//! SVG chart rendering on top of plotters
//!
//! Categorical charts use a segmented integer axis: category `i` sits at the
//! centre of segment `i`, and strip plots offset each point by a few pixels
//! around that centre.

#![allow(clippy::cast_possible_truncation)]

use plotters::prelude::*;
use polars::prelude::PolarsError;
use std::error::Error as StdError;
use std::fmt::Display;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const CAPTION_FONT_SIZE: i32 = 22;
const LABEL_FONT_SIZE: i32 = 13;
const POINT_RADIUS: i32 = 3;
/// Share of a category's width that strip plot jitter may use
const JITTER_SPREAD: f64 = 0.35;

type DrawResult = Result<(), Box<dyn StdError>>;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to render '{chart}': {message}")]
    Render { chart: String, message: String },

    #[error("Dataset has no rows to plot")]
    EmptyDataset,

    #[error("Failed to prepare chart data: {0}")]
    Data(#[from] PolarsError),

    #[error("Failed to prepare output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ChartError {
    fn render(chart: &str, error: impl Display) -> Self {
        Self::Render {
            chart: chart.to_string(),
            message: error.to_string(),
        }
    }
}

/// Titles and canvas size shared by every chart
#[derive(Debug, Clone)]
pub struct ChartFrame<'a> {
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
    pub size: (u32, u32),
}

/// One labelled category and its score values
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub label: String,
    pub values: Vec<f64>,
}

/// Straight line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitLine {
    pub slope: f64,
    pub intercept: f64,
}

pub fn render_scatter(
    path: &Path,
    frame: &ChartFrame<'_>,
    x_range: Range<f64>,
    y_range: Range<f64>,
    points: &[(f64, f64)],
) -> Result<(), ChartError> {
    draw_scatter(path, frame, x_range, y_range, points, None).map_err(|e| ChartError::render(frame.title, e))
}

/// Scatter plot with an optional fitted line drawn across the x range
pub fn render_regression(
    path: &Path,
    frame: &ChartFrame<'_>,
    x_range: Range<f64>,
    y_range: Range<f64>,
    points: &[(f64, f64)],
    fit: Option<FitLine>,
) -> Result<(), ChartError> {
    draw_scatter(path, frame, x_range, y_range, points, fit).map_err(|e| ChartError::render(frame.title, e))
}

pub fn render_box_plot(
    path: &Path,
    frame: &ChartFrame<'_>,
    groups: &[CategoryGroup],
    rotate_labels: bool,
) -> Result<(), ChartError> {
    draw_box_plot(path, frame, groups, rotate_labels).map_err(|e| ChartError::render(frame.title, e))
}

/// Categorical scatter; points are spread horizontally by a seeded jitter
pub fn render_strip_plot(
    path: &Path,
    frame: &ChartFrame<'_>,
    groups: &[CategoryGroup],
    rotate_labels: bool,
    jitter_seed: u64,
) -> Result<(), ChartError> {
    draw_strip_plot(path, frame, groups, rotate_labels, jitter_seed).map_err(|e| ChartError::render(frame.title, e))
}

fn draw_scatter(
    path: &Path,
    frame: &ChartFrame<'_>,
    x_range: Range<f64>,
    y_range: Range<f64>,
    points: &[(f64, f64)],
    fit: Option<FitLine>,
) -> DrawResult {
    let root = SVGBackend::new(path, frame.size).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_min, x_max) = (x_range.start, x_range.end);
    let visible = visible_points(points, &x_range, &y_range);
    let mut chart = ChartBuilder::on(&root)
        .caption(frame.title, ("sans-serif", CAPTION_FONT_SIZE).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(frame.x_desc)
        .y_desc(frame.y_desc)
        .draw()?;

    if visible.len() < points.len() {
        debug!("{} of {} points lie outside the axes", points.len() - visible.len(), points.len());
    }
    chart.draw_series(visible.iter().map(|&(x, y)| Circle::new((x, y), POINT_RADIUS, GREEN.filled())))?;

    if let Some(line) = fit {
        let ends = [x_min, x_max].map(|x| (x, line.slope.mul_add(x, line.intercept)));
        chart.draw_series(LineSeries::new(ends, &RED))?;
    }

    root.present()?;
    debug!("Rendered {:?}", path);
    Ok(())
}

fn draw_box_plot(path: &Path, frame: &ChartFrame<'_>, groups: &[CategoryGroup], rotate_labels: bool) -> DrawResult {
    let root = SVGBackend::new(path, frame.size).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
    let mut chart = ChartBuilder::on(&root)
        .caption(frame.title, ("sans-serif", CAPTION_FONT_SIZE).into_font())
        .margin(15)
        .x_label_area_size(if rotate_labels { 140 } else { 45 })
        .y_label_area_size(55)
        .build_cartesian_2d(category_axis(labels.len()).into_segmented(), -0.1f32..5.1f32)?;

    let formatter = |value: &SegmentValue<i32>| category_label(&labels, value);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().max(1))
        .x_desc(frame.x_desc)
        .y_desc(frame.y_desc)
        .x_label_formatter(&formatter)
        .x_label_style(label_font(rotate_labels))
        .draw()?;

    chart.draw_series(groups.iter().zip(0i32..).filter(|(g, _)| !g.values.is_empty()).map(|(g, i)| {
        let quartiles = Quartiles::new(&g.values);
        Boxplot::new_vertical(SegmentValue::CenterOf(i), &quartiles).width(18).style(BLUE)
    }))?;

    root.present()?;
    debug!("Rendered {:?}", path);
    Ok(())
}

fn draw_strip_plot(
    path: &Path,
    frame: &ChartFrame<'_>,
    groups: &[CategoryGroup],
    rotate_labels: bool,
    jitter_seed: u64,
) -> DrawResult {
    let root = SVGBackend::new(path, frame.size).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
    let mut chart = ChartBuilder::on(&root)
        .caption(frame.title, ("sans-serif", CAPTION_FONT_SIZE).into_font())
        .margin(15)
        .x_label_area_size(if rotate_labels { 140 } else { 45 })
        .y_label_area_size(55)
        .build_cartesian_2d(category_axis(labels.len()).into_segmented(), -0.1f64..5.1f64)?;

    let formatter = |value: &SegmentValue<i32>| category_label(&labels, value);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().max(1))
        .x_desc(frame.x_desc)
        .y_desc(frame.y_desc)
        .x_label_formatter(&formatter)
        .x_label_style(label_font(rotate_labels))
        .draw()?;

    let (plot_width, _) = chart.plotting_area().dim_in_pixel();
    let spread = f64::from(plot_width) / labels.len().max(1) as f64 * JITTER_SPREAD;
    let mut rng = fastrand::Rng::with_seed(jitter_seed);
    let points: Vec<(i32, f64, i32)> = groups
        .iter()
        .zip(0i32..)
        .flat_map(|(g, i)| g.values.iter().map(move |&v| (i, v)))
        .map(|(i, y)| (i, y, ((rng.f64() - 0.5) * spread).round() as i32))
        .collect();

    chart.draw_series(points.iter().map(|&(i, y, offset)| {
        EmptyElement::at((SegmentValue::CenterOf(i), y))
            + Circle::new((offset, 0), POINT_RADIUS, BLUE.mix(0.6).filled())
    }))?;

    root.present()?;
    debug!("Rendered {:?}", path);
    Ok(())
}

/// Category indices `0..count`, at least one so an empty chart still has an axis
fn category_axis(count: usize) -> Range<i32> {
    0..i32::try_from(count.max(1)).unwrap_or(i32::MAX)
}

fn category_label(labels: &[&str], value: &SegmentValue<i32>) -> String {
    match value {
        SegmentValue::CenterOf(index) => usize::try_from(*index)
            .ok()
            .and_then(|index| labels.get(index))
            .map(ToString::to_string)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Points inside both ranges, bounds included
fn visible_points(points: &[(f64, f64)], x_range: &Range<f64>, y_range: &Range<f64>) -> Vec<(f64, f64)> {
    let inside = |range: &Range<f64>, v: f64| v >= range.start && v <= range.end;
    points
        .iter()
        .copied()
        .filter(|&(x, y)| inside(x_range, x) && inside(y_range, y))
        .collect()
}

fn label_font(rotate: bool) -> FontDesc<'static> {
    let font = ("sans-serif", LABEL_FONT_SIZE).into_font();
    if rotate { font.transform(FontTransform::Rotate90) } else { font }
}
