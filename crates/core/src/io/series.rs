//! Dated time series from a directory of multiband images

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::native::read_band_stack;
use crate::observation::{BandMeans, Observation};

/// Load band means for every TIFF in `dir`, sorted by acquisition date.
///
/// Each file must hold at least five bands (blue, green, red, NIR,
/// red-edge). The date comes from the GDAL metadata `date` item, or else
/// from a trailing `_YYYYMMDD` in the file stem.
pub fn load_time_series<P: AsRef<Path>>(dir: P) -> Result<Vec<Observation<BandMeans>>> {
    let dir = dir.as_ref();
    let files = list_tiffs(dir)?;

    let mut series = files
        .iter()
        .map(|path| load_observation(path))
        .collect::<Result<Vec<_>>>()?;

    series.sort_by_key(|obs| obs.date);
    Ok(series)
}

/// Load band means and date for a single image
pub fn load_observation(path: &Path) -> Result<Observation<BandMeans>> {
    let stack = read_band_stack(path)?;

    let means = stack.band_means().ok_or_else(|| Error::MissingBands {
        path: path.to_path_buf(),
        expected: BandMeans::BAND_COUNT,
        found: stack.band_count(),
    })?;

    let date = stack
        .metadata_date()
        .or_else(|| date_from_file_name(path))
        .ok_or_else(|| Error::MissingDate(path.to_path_buf()))?;

    let (rows, cols) = stack.shape();
    debug!(
        "{}: {} bands, {}x{}, date {}",
        path.display(),
        stack.band_count(),
        cols,
        rows,
        date
    );

    Ok(Observation::new(date, means))
}

/// Sorted `.tif`/`.tiff` files directly inside `dir`
pub fn list_tiffs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::DataDirNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_tiff = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
            .unwrap_or(false);
        if is_tiff && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(Error::NoInputFiles(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// Parse `YYYYMMDD` from the last `_`-separated token of the file stem,
/// e.g. `field_a_20240201.tif`.
pub fn date_from_file_name(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    let token = stem.rsplit('_').next()?;
    NaiveDate::parse_from_str(token, "%Y%m%d").ok()
}
