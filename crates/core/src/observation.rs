//! Dated observations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Mean reflectance of each band over one image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandMeans {
    pub blue: f64,
    pub green: f64,
    pub red: f64,
    pub nir: f64,
    pub red_edge: f64,
}

impl BandMeans {
    /// Band count of the expected multispectral layout
    pub const BAND_COUNT: usize = 5;

    /// Build from band values ordered blue, green, red, NIR, red-edge
    pub fn from_ordered(bands: [f64; Self::BAND_COUNT]) -> Self {
        let [blue, green, red, nir, red_edge] = bands;
        Self {
            blue,
            green,
            red,
            nir,
            red_edge,
        }
    }
}

/// A value tied to an acquisition date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation<T> {
    pub date: NaiveDate,
    pub value: T,
}

impl<T> Observation<T> {
    pub fn new(date: NaiveDate, value: T) -> Self {
        Self { date, value }
    }
}
