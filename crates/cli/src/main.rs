//! wheatn CLI - winter wheat nitrogen estimation from drone imagery

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use wheatn_algorithms::imagery::{index_time_series, SaviParams};
use wheatn_algorithms::nitrogen::{predict_time_series, EstimatorParams, Prediction};
use wheatn_core::io::load_time_series;

mod plot;
mod report;

#[derive(Parser)]
#[command(name = "wheatn")]
#[command(author, version, about = "Above-ground nitrogen content of winter wheat from multispectral imagery", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory containing multispectral GeoTIFF files
    #[arg(long, alias = "data_dir")]
    data_dir: PathBuf,

    /// Directory for CSV results, plots and the technical report
    #[arg(long, alias = "output_dir")]
    output_dir: PathBuf,

    /// Also write results as JSON
    #[arg(long)]
    json: bool,

    /// SAVI soil brightness factor, within [0, 1]
    #[arg(long, default_value = "0.5", allow_hyphen_values = true)]
    savi_l: f64,

    /// Lower bound of plausible N content (%)
    #[arg(long, default_value = "1.5")]
    n_min: f64,

    /// Upper bound of plausible N content (%)
    #[arg(long, default_value = "6.0")]
    n_max: f64,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Create the output directory if missing; reject a path that is not a directory
fn prepare_output_dir(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("Output path is not a directory: {}", path.display());
        }
        return Ok(());
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create output directory {}", path.display()))
}

fn print_latest(prediction: &Prediction) {
    let Some(latest) = prediction.latest() else {
        return;
    };
    let r = &latest.result;
    println!("\nLatest Estimation:");
    println!("Date: {}", latest.date);
    println!("N Content: {:.2}% ± {:.2}%", r.n_content, r.uncertainty.rmse);
    println!("Estimation Quality: {}", r.quality());
    println!("Average R²: {:.3}", r.uncertainty.r2_mean);
}

fn run(cli: Cli) -> Result<()> {
    let params = EstimatorParams {
        n_min: cli.n_min,
        n_max: cli.n_max,
        ..Default::default()
    };
    params.validate().context("Invalid estimator parameters")?;
    let savi = SaviParams { l_factor: cli.savi_l };
    savi.validate().context("Invalid SAVI parameters")?;
    prepare_output_dir(&cli.output_dir)?;

    let start = Instant::now();

    info!("Loading time series data...");
    let pb = spinner("Reading imagery");
    let series = load_time_series(&cli.data_dir)
        .with_context(|| format!("Failed to load imagery from {}", cli.data_dir.display()))?;
    pb.finish_and_clear();
    info!("Loaded {} observations", series.len());

    info!("Calculating vegetation indices...");
    let indices = index_time_series(&series, savi);

    info!("Estimating above-ground nitrogen content...");
    let prediction =
        predict_time_series(&indices, params).context("Failed to estimate N content")?;
    if !prediction.skipped.is_empty() {
        info!(
            "Skipped {} of {} observations",
            prediction.skipped.len(),
            prediction.total_observations()
        );
    }

    if prediction.is_empty() {
        println!("No valid nitrogen estimates could be produced; no reports written.");
        return Ok(());
    }

    let mut written = report::write_reports(&cli.output_dir, &prediction.estimates, cli.json)?;

    info!("Generating plots...");
    written.extend(plot::write_plots(&cli.output_dir, &prediction.estimates)?);
    for path in &written {
        println!("Saved: {}", path.display());
    }
    println!("  Processing time: {:.2?}", start.elapsed());

    print_latest(&prediction);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    run(cli)
}
