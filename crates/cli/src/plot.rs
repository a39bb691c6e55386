//! SVG figures of a nitrogen time series

use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use wheatn_algorithms::nitrogen::DatedEstimationResult;

use crate::report::methods_present;

pub const N_CONTENT_PLOT: &str = "n_content_analysis.svg";
pub const METHOD_PLOT: &str = "method_comparison.svg";
pub const UNCERTAINTY_PLOT: &str = "uncertainty_analysis.svg";

const HISTOGRAM_BINS: usize = 10;

/// Padded `[min, max]` of `values`; a flat or empty set still yields a
/// drawable range
fn padded_range(values: impl Iterator<Item = f64>, pad: f64) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return 0.0..1.0;
    }
    if hi - lo < f64::EPSILON {
        return (lo - pad.max(0.5))..(hi + pad.max(0.5));
    }
    (lo - pad)..(hi + pad)
}

fn day_offset(start: NaiveDate, date: NaiveDate) -> f64 {
    (date - start).num_days() as f64
}

fn series_color(i: usize) -> RGBAColor {
    Palette99::pick(i + 1).to_rgba()
}

/// Ensemble N over time with a ±RMSE band and one line per method estimate
pub fn plot_n_content(path: &Path, results: &[DatedEstimationResult]) -> Result<()> {
    let Some(start) = results.iter().map(|r| r.date).min() else {
        return Ok(());
    };
    let x = |r: &DatedEstimationResult| day_offset(start, r.date);
    let methods = methods_present(results);

    let y_values = results.iter().flat_map(|r| {
        let n = r.result.n_content;
        let rmse = r.result.uncertainty.rmse;
        [n - rmse, n + rmse]
            .into_iter()
            .chain(r.result.confidence_intervals.values().map(|c| c.estimate))
    });
    let x_range = padded_range(results.iter().map(x), 1.0);
    let y_range = padded_range(y_values, 0.2);

    let root = SVGBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Above-ground N Content Time Series", ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    let date_label = |d: &f64| (start + Duration::days(d.round() as i64)).format("%Y-%m-%d").to_string();
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("N Content (%)")
        .x_label_formatter(&date_label)
        .draw()?;

    let mut band: Vec<(f64, f64)> = results
        .iter()
        .map(|r| (x(r), r.result.n_content + r.result.uncertainty.rmse))
        .collect();
    band.extend(
        results
            .iter()
            .rev()
            .map(|r| (x(r), r.result.n_content - r.result.uncertainty.rmse)),
    );
    chart
        .draw_series(std::iter::once(Polygon::new(band, BLUE.mix(0.2))))?
        .label("± RMSE")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.2).filled()));

    chart
        .draw_series(LineSeries::new(
            results.iter().map(|r| (x(r), r.result.n_content)),
            BLUE.stroke_width(2),
        ))?
        .label("Ensemble N")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    for (i, method) in methods.iter().enumerate() {
        let color = series_color(i);
        let points: Vec<(f64, f64)> = results
            .iter()
            .filter_map(|r| r.result.confidence_intervals.get(method).map(|c| (x(r), c.estimate)))
            .collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color))?
            .label(format!("{} estimate", method))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Each method's estimate against the ensemble N, with a 1:1 line
pub fn plot_method_comparison(path: &Path, results: &[DatedEstimationResult]) -> Result<()> {
    let methods = methods_present(results);
    let all = results.iter().flat_map(|r| {
        std::iter::once(r.result.n_content)
            .chain(r.result.confidence_intervals.values().map(|c| c.estimate))
    });
    let range = padded_range(all, 0.2);

    let root = SVGBackend::new(path, (1000, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Comparison of Estimation Methods", ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(range.clone(), range.clone())?;
    chart
        .configure_mesh()
        .x_desc("Ensemble N Content Estimate (%)")
        .y_desc("Individual Method Estimates (%)")
        .draw()?;

    for (i, method) in methods.iter().enumerate() {
        let color = series_color(i);
        chart
            .draw_series(results.iter().filter_map(|r| {
                r.result
                    .confidence_intervals
                    .get(method)
                    .map(|c| Circle::new((r.result.n_content, c.estimate), 5, color.filled()))
            }))?
            .label(method.to_string())
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
    }

    chart
        .draw_series(LineSeries::new(
            [(range.start, range.start), (range.end, range.end)],
            BLACK.mix(0.6).stroke_width(1),
        ))?
        .label("1:1 Line")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.mix(0.6)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Equal-width bin counts over `range`
fn histogram(values: &[f64], range: &Range<f64>, bins: usize) -> Vec<usize> {
    let width = (range.end - range.start) / bins as f64;
    let mut counts = vec![0; bins];
    for &v in values.iter().filter(|v| v.is_finite()) {
        let bin = ((v - range.start) / width).floor().max(0.0) as usize;
        counts[bin.min(bins - 1)] += 1;
    }
    counts
}

fn draw_histogram(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    x_desc: &str,
    values: &[f64],
    color: RGBColor,
) -> Result<()> {
    let range = padded_range(values.iter().copied(), 0.01);
    let counts = histogram(values, &range, HISTOGRAM_BINS);
    let width = (range.end - range.start) / HISTOGRAM_BINS as f64;
    let top = counts.iter().copied().max().unwrap_or(0).max(1) as f64 + 0.5;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(50)
        .build_cartesian_2d(range.clone(), 0.0..top)?;
    chart.configure_mesh().x_desc(x_desc).y_desc("Count").draw()?;
    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let x0 = range.start + i as f64 * width;
        Rectangle::new([(x0, 0.0), (x0 + width, count as f64)], color.mix(0.6).filled())
    }))?;
    Ok(())
}

/// Distributions of the per-date ensemble RMSE and mean R²
pub fn plot_uncertainty(path: &Path, results: &[DatedEstimationResult]) -> Result<()> {
    let rmse: Vec<f64> = results.iter().map(|r| r.result.uncertainty.rmse).collect();
    let r2: Vec<f64> = results.iter().map(|r| r.result.uncertainty.r2_mean).collect();

    let root = SVGBackend::new(path, (1500, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));
    draw_histogram(&panels[0], "RMSE Distribution", "RMSE (%)", &rmse, RED)?;
    draw_histogram(&panels[1], "R² Distribution", "R²", &r2, GREEN)?;
    root.present()?;
    Ok(())
}

/// Write all figures into `dir`, returning their paths
pub fn write_plots(dir: &Path, results: &[DatedEstimationResult]) -> Result<Vec<PathBuf>> {
    let n_path = dir.join(N_CONTENT_PLOT);
    plot_n_content(&n_path, results).context("Failed to plot N content")?;

    let method_path = dir.join(METHOD_PLOT);
    plot_method_comparison(&method_path, results).context("Failed to plot method comparison")?;

    let uncertainty_path = dir.join(UNCERTAINTY_PLOT);
    plot_uncertainty(&uncertainty_path, results).context("Failed to plot uncertainty")?;

    Ok(vec![n_path, method_path, uncertainty_path])
}
