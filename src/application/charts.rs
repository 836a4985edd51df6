//! Exploratory charts over an exported dataset
//!
//! Each chart is split into a preparation step, a polars query over the
//! dataset that is tested directly, and a render step that writes one SVG
//! file through [`chart_renderer`](crate::infrastructure::chart_renderer).

#![allow(clippy::uninlined_format_args, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::columns::{APP_SIZE, CONTENT_RATING, FREE, GENRE, PRICE, SCORE, SIZE};
use crate::domain::{Dataset, SizedDataset};
use crate::infrastructure::chart_renderer::{self, ChartFrame, FitLine};
use crate::infrastructure::config::defaults;

pub use crate::infrastructure::chart_renderer::{CategoryGroup, ChartError};

/// Aggregate columns produced by the preparation queries
const SCORES: &str = "scores";
const COUNT: &str = "count";
const BUCKET: &str = "bucket";
const MEAN_SCORE: &str = "meanScore";

const SCORE_RANGE: std::ops::Range<f64> = -0.1..5.1;

/// Chart thresholds and output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// A genre is plotted only with strictly more rows than this
    pub genre_min_count: usize,

    /// Sizes (MB) at or above this are left out of the size chart
    pub size_cap: f64,

    /// Width (MB) of a size bucket
    pub size_bucket_width: f64,

    /// Upper end of the price axis
    pub price_axis_max: f64,

    pub width: u32,
    pub height: u32,

    /// Directory `render_all` writes into when none is given
    pub output_dir: PathBuf,

    /// Seed for strip plot jitter
    pub jitter_seed: u64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            genre_min_count: defaults::GENRE_MIN_COUNT,
            size_cap: defaults::SIZE_CAP,
            size_bucket_width: defaults::SIZE_BUCKET_WIDTH,
            price_axis_max: defaults::PRICE_AXIS_MAX,
            width: defaults::CHART_WIDTH,
            height: defaults::CHART_HEIGHT,
            output_dir: PathBuf::from(defaults::CHART_OUTPUT_DIR),
            jitter_seed: defaults::JITTER_SEED,
        }
    }
}

impl ChartConfig {
    fn frame<'a>(&self, title: &'a str, x_desc: &'a str, y_desc: &'a str) -> ChartFrame<'a> {
        ChartFrame {
            title,
            x_desc,
            y_desc,
            size: (self.width, self.height),
        }
    }
}

/// Mean score of the rows whose size falls in `(lower, upper]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBucket {
    pub lower: f64,
    pub upper: f64,
    pub mean_score: f64,
    pub count: usize,
}

impl SizeBucket {
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Ordinary least squares fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// `None` when every y is the same
    pub r2: Option<f64>,
}

/// (price, score) of paid applications that have a score
pub fn paid_price_points(dataset: &Dataset) -> PolarsResult<Vec<(f64, f64)>> {
    let paid = dataset
        .lazy()
        .filter(col(PRICE).gt(lit(0.0)).and(col(SCORE).is_not_null()))
        .select([col(PRICE), col(SCORE)])
        .collect()?;

    let prices = paid.column(PRICE)?.f64()?;
    let scores = paid.column(SCORE)?.f64()?;
    Ok(prices.into_no_null_iter().zip(scores.into_no_null_iter()).collect())
}

/// Scores per genre for genres with more than `min_count` rows, most common first
pub fn genre_score_groups(dataset: &Dataset, min_count: usize) -> PolarsResult<Vec<CategoryGroup>> {
    let groups = dataset
        .lazy()
        .filter(col(GENRE).is_not_null())
        .group_by([col(GENRE)])
        .agg([
            col(GENRE).count().cast(DataType::UInt64).alias(COUNT),
            col(SCORE).drop_nulls().alias(SCORES),
        ])
        .filter(col(COUNT).gt(lit(min_count as u64)))
        .sort_by_exprs(
            [col(COUNT), col(GENRE)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?;

    category_groups(&groups, GENRE)
}

/// Scores per content rating, in order of first appearance
pub fn content_rating_groups(dataset: &Dataset) -> PolarsResult<Vec<CategoryGroup>> {
    let groups = dataset
        .lazy()
        .filter(col(CONTENT_RATING).is_not_null())
        .group_by_stable([col(CONTENT_RATING)])
        .agg([col(SCORE).drop_nulls().alias(SCORES)])
        .collect()?;

    category_groups(&groups, CONTENT_RATING)
}

/// Scores of paid (`False`) then free (`True`) applications
pub fn free_paid_groups(dataset: &Dataset) -> PolarsResult<Vec<CategoryGroup>> {
    let groups = dataset
        .lazy()
        .filter(col(FREE).is_not_null())
        .group_by([col(FREE)])
        .agg([col(SCORE).drop_nulls().alias(SCORES)])
        .sort_by_exprs([col(FREE)], SortMultipleOptions::default())
        .with_column(when(col(FREE)).then(lit("True")).otherwise(lit("False")).alias(FREE))
        .collect()?;

    category_groups(&groups, FREE)
}

/// One [`CategoryGroup`] per row of a frame with a string `key` column and a list-of-f64 `scores` column
fn category_groups(frame: &DataFrame, key: &str) -> PolarsResult<Vec<CategoryGroup>> {
    let labels = frame.column(key)?.str()?;
    let scores = frame.column(SCORES)?.list()?;

    let mut groups = Vec::with_capacity(frame.height());
    for (label, values) in labels.into_iter().zip(scores.into_iter()) {
        let Some(label) = label else { continue };
        let values = match values {
            Some(series) => series.f64()?.into_no_null_iter().collect(),
            None => Vec::new(),
        };
        groups.push(CategoryGroup {
            label: label.to_string(),
            values,
        });
    }
    Ok(groups)
}

/// Keep rows whose size is given in megabytes (`"29M"`) and parse it into `appSize`.
///
/// `"Varies with device"`, `"512k"` and values that do not parse to a finite
/// number are dropped.
pub fn normalize_sizes(dataset: &Dataset) -> PolarsResult<SizedDataset> {
    let size = col(SIZE).str().strip_chars(lit(NULL));
    let frame = dataset
        .lazy()
        .filter(size.clone().str().ends_with(lit("M")))
        .with_column(
            size.str()
                .strip_suffix(lit("M"))
                .str()
                .strip_chars(lit(NULL))
                .cast(DataType::Float64)
                .alias(APP_SIZE),
        )
        .filter(col(APP_SIZE).is_finite())
        .collect()?;

    Ok(SizedDataset::new(frame))
}

/// Average score per right-closed size bucket below `cap`.
///
/// Bucket edges are `0, width, 2*width, ...` up to (excluding) `cap`, so with
/// the defaults the last bucket is `(294, 297]`. Buckets without scores are
/// dropped.
pub fn size_score_buckets(sized: &SizedDataset, cap: f64, width: f64) -> PolarsResult<Vec<SizeBucket>> {
    if !width.is_finite() || !cap.is_finite() || width <= 0.0 || cap <= 0.0 {
        warn!("Invalid size bucketing (cap {}, width {}); no buckets", cap, width);
        return Ok(Vec::new());
    }

    let bucket_count = ((cap / width).ceil() as i64 - 1).max(0);
    let frame = sized
        .lazy()
        .filter(
            col(SCORE)
                .is_not_null()
                .and(col(APP_SIZE).gt(lit(0.0)))
                .and(col(APP_SIZE).lt(lit(cap))),
        )
        .with_column(((col(APP_SIZE) / lit(width)).ceil().cast(DataType::Int64) - lit(1i64)).alias(BUCKET))
        .filter(col(BUCKET).lt(lit(bucket_count)))
        .group_by([col(BUCKET)])
        .agg([
            col(SCORE).mean().alias(MEAN_SCORE),
            col(SCORE).count().cast(DataType::UInt64).alias(COUNT),
        ])
        .sort_by_exprs([col(BUCKET)], SortMultipleOptions::default())
        .collect()?;

    let buckets = frame.column(BUCKET)?.i64()?;
    let means = frame.column(MEAN_SCORE)?.f64()?;
    let counts = frame.column(COUNT)?.u64()?;

    Ok(buckets
        .into_no_null_iter()
        .zip(means.into_no_null_iter())
        .zip(counts.into_no_null_iter())
        .map(|((k, mean_score), count)| SizeBucket {
            lower: k as f64 * width,
            upper: (k + 1) as f64 * width,
            mean_score,
            count: count as usize,
        })
        .collect())
}

/// Least squares line through `points`; `None` for no points or a constant x
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for &(x, y) in points {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
    }

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;

    let ss_tot = sum_y2 - sum_y * sum_y / n;
    let ss_res: f64 = points.iter().map(|&(x, y)| (y - slope.mul_add(x, intercept)).powi(2)).sum();
    let r2 = (ss_tot.abs() > f64::EPSILON).then(|| 1.0 - ss_res / ss_tot);

    Some(LinearFit { slope, intercept, r2 })
}

pub fn render_price_vs_rating(dataset: &Dataset, config: &ChartConfig, path: &Path) -> Result<PathBuf, ChartError> {
    let points = paid_price_points(dataset)?;
    chart_renderer::render_scatter(
        path,
        &config.frame("Price vs. rating (paid apps)", "price", "score"),
        0.0..config.price_axis_max,
        SCORE_RANGE,
        &points,
    )?;
    info!("Price chart: {} paid apps -> {:?}", points.len(), path);
    Ok(path.to_path_buf())
}

pub fn render_genre_vs_rating(dataset: &Dataset, config: &ChartConfig, path: &Path) -> Result<PathBuf, ChartError> {
    let groups = genre_score_groups(dataset, config.genre_min_count)?;
    if groups.is_empty() {
        warn!("No genre has more than {} apps; genre chart will be empty", config.genre_min_count);
    }
    chart_renderer::render_box_plot(path, &config.frame("Genre vs. rating", "genre", "score"), &groups, true)?;
    info!("Genre chart: {} genres -> {:?}", groups.len(), path);
    Ok(path.to_path_buf())
}

pub fn render_content_rating_vs_rating(
    dataset: &Dataset,
    config: &ChartConfig,
    path: &Path,
) -> Result<PathBuf, ChartError> {
    let groups = content_rating_groups(dataset)?;
    chart_renderer::render_strip_plot(
        path,
        &config.frame("Content rating vs. rating", "contentRating", "score"),
        &groups,
        true,
        config.jitter_seed,
    )?;
    info!("Content rating chart: {} buckets -> {:?}", groups.len(), path);
    Ok(path.to_path_buf())
}

pub fn render_size_vs_rating(sized: &SizedDataset, config: &ChartConfig, path: &Path) -> Result<PathBuf, ChartError> {
    let buckets = size_score_buckets(sized, config.size_cap, config.size_bucket_width)?;
    let points: Vec<(f64, f64)> = buckets.iter().map(|b| (b.midpoint(), b.mean_score)).collect();
    let fit = linear_fit(&points);

    chart_renderer::render_regression(
        path,
        &config.frame("Size vs. rating", "appSize (MB)", "mean score"),
        0.0..config.size_cap,
        SCORE_RANGE,
        &points,
        fit.map(|f| FitLine {
            slope: f.slope,
            intercept: f.intercept,
        }),
    )?;

    match fit {
        Some(f) => info!(
            "Size chart: {} buckets, slope {:.4}, intercept {:.3} -> {:?}",
            buckets.len(),
            f.slope,
            f.intercept,
            path
        ),
        None => info!("Size chart: {} buckets, no fit -> {:?}", buckets.len(), path),
    }
    Ok(path.to_path_buf())
}

pub fn render_free_vs_paid(dataset: &Dataset, config: &ChartConfig, path: &Path) -> Result<PathBuf, ChartError> {
    let groups = free_paid_groups(dataset)?;
    chart_renderer::render_strip_plot(
        path,
        &config.frame("Free vs. paid", "free", "score"),
        &groups,
        false,
        config.jitter_seed,
    )?;
    info!("Free/paid chart -> {:?}", path);
    Ok(path.to_path_buf())
}

/// Render every chart into `out_dir`, normalizing sizes first
pub fn render_all(dataset: &Dataset, config: &ChartConfig, out_dir: &Path) -> Result<Vec<PathBuf>, ChartError> {
    if dataset.is_empty() {
        return Err(ChartError::EmptyDataset);
    }

    std::fs::create_dir_all(out_dir).map_err(|source| ChartError::OutputDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let sized = normalize_sizes(dataset)?;
    info!("{} of {} rows have a size in MB", sized.len(), dataset.len());

    Ok(vec![
        render_price_vs_rating(dataset, config, &out_dir.join("price_vs_rating.svg"))?,
        render_genre_vs_rating(dataset, config, &out_dir.join("genre_vs_rating.svg"))?,
        render_content_rating_vs_rating(dataset, config, &out_dir.join("content_rating_vs_rating.svg"))?,
        render_size_vs_rating(&sized, config, &out_dir.join("size_vs_rating.svg"))?,
        render_free_vs_paid(dataset, config, &out_dir.join("free_vs_paid.svg"))?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AppRow;

    fn sized(rows: &[(Option<f64>, &str)]) -> SizedDataset {
        let rows: Vec<AppRow> = rows
            .iter()
            .map(|&(score, size)| AppRow {
                score,
                size: Some(size.to_string()),
                ..AppRow::default()
            })
            .collect();
        normalize_sizes(&Dataset::from_rows(&rows).unwrap()).unwrap()
    }

    fn app_sizes(sized: &SizedDataset) -> Vec<f64> {
        sized.frame().column(APP_SIZE).unwrap().f64().unwrap().into_no_null_iter().collect()
    }

    #[test]
    fn test_normalize_sizes_keeps_megabytes_only() {
        let sized = sized(&[(Some(4.0), "29M"), (Some(3.0), "Varies with device"), (None, "512k"), (None, " 1.5M ")]);

        assert_eq!(app_sizes(&sized), vec![29.0, 1.5]);
        assert_eq!(sized.frame().column(SCORE).unwrap().f64().unwrap().get(0), Some(4.0));
    }

    #[test]
    fn test_non_finite_sizes_are_dropped() {
        let sized = sized(&[(Some(4.0), "NaNM"), (Some(4.0), "infM"), (Some(2.0), "abcM"), (Some(3.0), "6M")]);
        assert_eq!(app_sizes(&sized), vec![6.0]);

        let buckets = size_score_buckets(&sized, 300.0, 3.0).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!((buckets[0].lower, buckets[0].upper, buckets[0].count), (3.0, 6.0, 1));
    }

    #[test]
    fn test_size_buckets_are_right_closed() {
        let sized = sized(&[
            (Some(4.0), "3M"),
            (Some(2.0), "3.5M"),
            (Some(3.0), "6M"),
            (Some(1.0), "0M"),
            (Some(5.0), "298M"),
            (None, "4M"),
        ]);

        let buckets = size_score_buckets(&sized, 300.0, 3.0).unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!((buckets[0].lower, buckets[0].upper, buckets[0].mean_score), (0.0, 3.0, 4.0));
        assert_eq!((buckets[1].lower, buckets[1].upper, buckets[1].count), (3.0, 6.0, 2));
        assert!((buckets[1].mean_score - 2.5).abs() < 1e-9);
        assert!((buckets[1].midpoint() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_bucketing_yields_nothing() {
        let sized = sized(&[(Some(4.0), "3M")]);
        assert!(size_score_buckets(&sized, 300.0, 0.0).unwrap().is_empty());
        assert!(size_score_buckets(&sized, f64::NAN, 3.0).unwrap().is_empty());
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let fit = linear_fit(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!((fit.r2.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_fit_degenerate_inputs() {
        assert!(linear_fit(&[]).is_none());
        assert!(linear_fit(&[(1.0, 2.0), (1.0, 3.0)]).is_none());
        assert_eq!(linear_fit(&[(0.0, 2.0), (1.0, 2.0)]).unwrap().r2, None);
    }
}
