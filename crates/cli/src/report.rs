//! CSV, JSON and plain-text reports of a nitrogen time series

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use wheatn_algorithms::nitrogen::{references, DatedEstimationResult, EstimationQuality, RegressionMethod};

pub const CSV_FILE: &str = "nitrogen_analysis.csv";
pub const REPORT_FILE: &str = "technical_report.txt";
pub const JSON_FILE: &str = "nitrogen_analysis.json";

/// Methods that contributed on at least one date, in table order
pub fn methods_present(results: &[DatedEstimationResult]) -> Vec<RegressionMethod> {
    results
        .iter()
        .flat_map(|r| r.result.method_weights.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn csv_header(methods: &[RegressionMethod]) -> Vec<String> {
    let mut header: Vec<String> = ["date", "n_content", "rmse", "r2_mean", "estimation_quality"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(methods.iter().map(|m| format!("{}_weight", m)));
    for m in methods {
        header.push(format!("{}_estimate", m));
        header.push(format!("{}_rmse", m));
        header.push(format!("{}_r2", m));
    }
    header
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per date; per-method cells are blank when the method did not apply
pub fn write_csv<W: Write>(writer: W, results: &[DatedEstimationResult]) -> Result<()> {
    let methods = methods_present(results);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(csv_header(&methods))?;

    for dated in results {
        let r = &dated.result;
        let mut row = vec![
            dated.date.format("%Y-%m-%d").to_string(),
            r.n_content.to_string(),
            r.uncertainty.rmse.to_string(),
            r.uncertainty.r2_mean.to_string(),
            r.quality().to_string(),
        ];
        row.extend(methods.iter().map(|m| opt(r.method_weights.get(m).copied())));
        for m in &methods {
            let ci = r.confidence_intervals.get(m);
            row.push(opt(ci.map(|c| c.estimate)));
            row.push(opt(ci.map(|c| c.rmse)));
            row.push(opt(ci.map(|c| c.r2)));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(writer: W, results: &[DatedEstimationResult]) -> Result<()> {
    serde_json::to_writer_pretty(writer, results)?;
    Ok(())
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Plain-text technical report: period, overall statistics, per-method
/// performance, quality distribution and references.
pub fn write_technical_report<W: Write>(mut w: W, results: &[DatedEstimationResult]) -> Result<()> {
    writeln!(w, "Above-ground Nitrogen Content Analysis Technical Report")?;
    writeln!(w, "================================================")?;
    writeln!(w)?;

    writeln!(w, "1. Analysis Period")?;
    writeln!(w, "-----------------")?;
    match (results.iter().map(|r| r.date).min(), results.iter().map(|r| r.date).max()) {
        (Some(start), Some(end)) => {
            writeln!(w, "Start Date: {}", start)?;
            writeln!(w, "End Date: {}", end)?;
        }
        _ => writeln!(w, "No dated estimates")?,
    }
    writeln!(w, "Number of Observations: {}", results.len())?;
    writeln!(w)?;

    let n_values = || results.iter().map(|r| r.result.n_content);
    let n_min = n_values().fold(f64::INFINITY, f64::min);
    let n_max = n_values().fold(f64::NEG_INFINITY, f64::max);
    let rmse_mean = mean(results.iter().map(|r| r.result.uncertainty.rmse));

    writeln!(w, "2. Overall Statistics")?;
    writeln!(w, "-------------------")?;
    writeln!(w, "Mean N Content: {:.2}% ± {:.2}%", mean(n_values()), rmse_mean)?;
    writeln!(w, "Range: {:.2}% - {:.2}%", n_min, n_max)?;
    writeln!(w, "Average RMSE: {:.3}%", rmse_mean)?;
    writeln!(
        w,
        "Average R²: {:.3}",
        mean(results.iter().map(|r| r.result.uncertainty.r2_mean))
    )?;
    writeln!(w)?;

    writeln!(w, "3. Method Performance")?;
    writeln!(w, "-------------------")?;
    for method in methods_present(results) {
        let cis = || {
            results
                .iter()
                .filter_map(move |r| r.result.confidence_intervals.get(&method))
        };
        let weights = results
            .iter()
            .filter_map(|r| r.result.method_weights.get(&method).copied());
        writeln!(w)?;
        writeln!(w, "{}:", method)?;
        writeln!(w, "  - Mean Estimate: {:.2}%", mean(cis().map(|c| c.estimate)))?;
        writeln!(w, "  - RMSE: {:.3}%", mean(cis().map(|c| c.rmse)))?;
        writeln!(w, "  - R²: {:.3}", mean(cis().map(|c| c.r2)))?;
        writeln!(w, "  - Average Weight: {:.2}", mean(weights))?;
    }

    writeln!(w)?;
    writeln!(w, "4. Estimation Quality Distribution")?;
    writeln!(w, "-------------------------------")?;
    for quality in [
        EstimationQuality::High,
        EstimationQuality::Moderate,
        EstimationQuality::Low,
    ] {
        let count = results.iter().filter(|r| r.result.quality() == quality).count();
        if count == 0 {
            continue;
        }
        let percentage = count as f64 / results.len() as f64 * 100.0;
        writeln!(w, "{}: {} measurements ({:.1}%)", quality, count, percentage)?;
    }

    writeln!(w)?;
    writeln!(w, "5. References")?;
    writeln!(w, "------------")?;
    for (i, reference) in references().iter().enumerate() {
        writeln!(w, "{}. {}", i + 1, reference)?;
    }

    w.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write all report files into `dir`, returning their paths
pub fn write_reports(dir: &Path, results: &[DatedEstimationResult], json: bool) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let csv_path = dir.join(CSV_FILE);
    write_csv(create(&csv_path)?, results).context("Failed to write CSV results")?;
    written.push(csv_path);

    let report_path = dir.join(REPORT_FILE);
    write_technical_report(create(&report_path)?, results)
        .context("Failed to write technical report")?;
    written.push(report_path);

    if json {
        let json_path = dir.join(JSON_FILE);
        write_json(create(&json_path)?, results).context("Failed to write JSON results")?;
        written.push(json_path);
    }

    Ok(written)
}
