//! End-to-end: TIFF directory → band means → indices → N time series.
//!
//! Fixtures are written to a temporary directory with the same layout a
//! five-band drone orthomosaic has (blue, green, red, NIR, red-edge).

use std::path::Path;

use chrono::NaiveDate;
use ndarray::{s, Array3};
use wheatn_algorithms::imagery::{index_time_series, SaviParams};
use wheatn_algorithms::nitrogen::{predict_time_series, EstimatorParams};
use wheatn_core::io::{load_time_series, write_band_stack, BandStack};
use wheatn_core::{Error, VegetationIndex};

const SIZE: usize = 10;

/// Write a 10x10 five-band image whose bands vary ±0.01 around `means`
fn write_flight(dir: &Path, name: &str, date: Option<NaiveDate>, means: [f64; 5]) {
    let mut bands = Array3::zeros((5, SIZE, SIZE));
    for (b, &mean) in means.iter().enumerate() {
        let mut band = bands.slice_mut(s![b, .., ..]);
        for ((row, col), v) in band.indexed_iter_mut() {
            // Symmetric pattern: averages back to `mean`
            let offset = if (row + col) % 2 == 0 { 0.01 } else { -0.01 };
            *v = mean + offset;
        }
    }
    write_band_stack(dir.join(name), &BandStack::new(bands), date).unwrap();
}

/// Pixel-interleaved five-sample float32 TIFF laid out the way GDAL's GTiff
/// driver writes a `count = 5` raster, assembled byte by byte.
fn gdal_style_tiff(size: u32, means: [f32; 5]) -> Vec<u8> {
    let pixels = (size * size) as usize;
    let mut data = Vec::new();
    for _ in 0..pixels {
        for v in means {
            data.extend_from_slice(&v.to_le_bytes());
        }
    }

    let ifd_offset = 8 + data.len() as u32;
    let entries: u32 = 11;
    let external = ifd_offset + 2 + 12 * entries + 4;
    // (tag, type, count, inline value or offset)
    let fields: [(u16, u16, u32, u32); 11] = [
        (256, 4, 1, size),
        (257, 4, 1, size),
        (258, 3, 5, external),
        (259, 3, 1, 1),
        (262, 3, 1, 1),
        (273, 4, 1, 8),
        (277, 3, 1, 5),
        (278, 4, 1, size),
        (279, 4, 1, data.len() as u32),
        (284, 3, 1, 1),
        (339, 3, 5, external + 10),
    ];

    let mut file = b"II".to_vec();
    file.extend_from_slice(&42u16.to_le_bytes());
    file.extend_from_slice(&ifd_offset.to_le_bytes());
    file.extend_from_slice(&data);
    file.extend_from_slice(&(entries as u16).to_le_bytes());
    for (tag, kind, count, value) in fields {
        file.extend_from_slice(&tag.to_le_bytes());
        file.extend_from_slice(&kind.to_le_bytes());
        file.extend_from_slice(&count.to_le_bytes());
        if kind == 3 && count == 1 {
            file.extend_from_slice(&(value as u16).to_le_bytes());
            file.extend_from_slice(&[0, 0]);
        } else {
            file.extend_from_slice(&value.to_le_bytes());
        }
    }
    file.extend_from_slice(&0u32.to_le_bytes());
    for v in [32u16; 5].into_iter().chain([3u16; 5]) {
        file.extend_from_slice(&v.to_le_bytes());
    }
    file
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn pipeline_from_tiff_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let wheat = [0.1, 0.2, 0.15, 0.45, 0.3];

    write_flight(tmp.path(), "synthetic_20240201.tif", Some(ymd(2024, 2, 1)), wheat);
    write_flight(tmp.path(), "synthetic_20240210.tif", None, wheat);
    // Red-edge band lost: only NDVI, SAVI, GNDVI can be formed
    write_flight(
        tmp.path(),
        "synthetic_20240205.tif",
        None,
        [0.1, 0.2, 0.15, 0.45, f64::NAN],
    );

    let series = load_time_series(tmp.path()).unwrap();
    let dates: Vec<_> = series.iter().map(|o| o.date).collect();
    assert_eq!(dates, vec![ymd(2024, 2, 1), ymd(2024, 2, 5), ymd(2024, 2, 10)]);
    for obs in [&series[0], &series[2]] {
        let b = obs.value;
        for v in [b.blue, b.green, b.red, b.nir, b.red_edge] {
            assert!((0.0..=1.0).contains(&v), "band mean {} out of [0, 1]", v);
        }
    }

    let indices = index_time_series(&series, SaviParams::default());
    assert_eq!(indices[0].value.len(), 6);
    assert_eq!(indices[1].value.len(), 3);
    let full = &indices[0].value;
    assert!(full.validate().is_ok());
    assert!(full.get(VegetationIndex::Mcari).unwrap() >= 0.0);
    assert!(full.get(VegetationIndex::CiRedEdge).unwrap() >= -1.0);

    let prediction = predict_time_series(&indices, EstimatorParams::default()).unwrap();
    assert_eq!(prediction.estimates.len(), 2);
    assert_eq!(prediction.skipped.len(), 1);
    assert_eq!(prediction.skipped[0].date, ymd(2024, 2, 5));
    assert!(matches!(prediction.skipped[0].error, Error::NoApplicableMethod));

    for dated in &prediction.estimates {
        let r = &dated.result;
        assert!((1.5..=6.0).contains(&r.n_content));
        assert!((0.0..=1.0).contains(&r.uncertainty.rmse));
        assert!((0.0..=1.0).contains(&r.uncertainty.r2_mean));
        assert_eq!(r.uncertainty.sample_size, 3);
    }
    assert_eq!(prediction.latest().unwrap().date, ymd(2024, 2, 10));
}

#[test]
fn pipeline_from_gdal_multiband_files() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("field_20240301.tif"),
        gdal_style_tiff(8, [0.1, 0.2, 0.15, 0.45, 0.3]),
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("field_20240215.tif"),
        gdal_style_tiff(8, [0.1, 0.2, 0.15, 0.40, 0.3]),
    )
    .unwrap();

    let series = load_time_series(tmp.path()).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, ymd(2024, 2, 15));
    assert!((series[1].value.nir - 0.45).abs() < 1e-6);

    let indices = index_time_series(&series, SaviParams::default());
    let prediction = predict_time_series(&indices, EstimatorParams::default()).unwrap();
    assert_eq!(prediction.estimates.len(), 2);
    assert!(prediction.skipped.is_empty());
    // Higher NIR over the same red-edge raises NDRE and CIred-edge
    assert!(prediction.estimates[1].result.n_content > prediction.estimates[0].result.n_content);
}

#[test]
fn pipeline_missing_directory() {
    let result = load_time_series("nonexistent_dir");
    assert!(matches!(result, Err(Error::DataDirNotFound(_))));
}

#[test]
fn pipeline_directory_without_images() {
    let tmp = tempfile::tempdir().unwrap();
    let result = load_time_series(tmp.path());
    assert!(matches!(result, Err(Error::NoInputFiles(_))));
}
