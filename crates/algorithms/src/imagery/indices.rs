//! Spectral vegetation indices
//!
//! Indices computed from per-image band means. Each function returns `None`
//! when the index is undefined for the input (near-zero denominator or a
//! non-finite result), so a missing band degrades the index set instead of
//! poisoning it with NaN.

use wheatn_core::{Algorithm, BandMeans, Error, IndexSet, Observation, Result, VegetationIndex};

/// Denominators smaller than this are treated as zero
const EPSILON: f64 = 1e-10;

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn ratio(num: f64, denom: f64) -> Option<f64> {
    if denom.abs() < EPSILON {
        return None;
    }
    finite(num / denom)
}

// ---------------------------------------------------------------------------
// Generic normalized difference
// ---------------------------------------------------------------------------

/// Compute the normalized difference between two reflectances:
///
/// `(a - b) / (a + b)`
///
/// Result is in the range [-1, 1] for non-negative inputs.
pub fn normalized_difference(a: f64, b: f64) -> Option<f64> {
    ratio(a - b, a + b)
}

// ---------------------------------------------------------------------------
// NDVI / NDRE / GNDVI
// ---------------------------------------------------------------------------

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
pub fn ndvi(bands: &BandMeans) -> Option<f64> {
    normalized_difference(bands.nir, bands.red)
}

/// Normalized Difference Red Edge Index (Gitelson & Merzlyak, 1994)
///
/// `NDRE = (NIR - RedEdge) / (NIR + RedEdge)`
///
/// Sensitive to leaf chlorophyll; keeps responding after NDVI saturates in
/// dense mid-season canopies.
pub fn ndre(bands: &BandMeans) -> Option<f64> {
    normalized_difference(bands.nir, bands.red_edge)
}

/// Green Normalized Difference Vegetation Index (Gitelson et al., 1996)
///
/// `GNDVI = (NIR - Green) / (NIR + Green)`
pub fn gndvi(bands: &BandMeans) -> Option<f64> {
    normalized_difference(bands.nir, bands.green)
}

// ---------------------------------------------------------------------------
// SAVI
// ---------------------------------------------------------------------------

/// Parameters for SAVI
#[derive(Debug, Clone, Copy)]
pub struct SaviParams {
    /// Soil brightness correction factor (0 = high vegetation, 1 = low vegetation)
    /// Default: 0.5
    pub l_factor: f64,
}

impl Default for SaviParams {
    fn default() -> Self {
        Self { l_factor: 0.5 }
    }
}

impl SaviParams {
    /// L must be a finite value in `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        if !(self.l_factor.is_finite() && (0.0..=1.0).contains(&self.l_factor)) {
            return Err(Error::InvalidParameter {
                name: "l_factor",
                value: self.l_factor.to_string(),
                reason: "SAVI soil factor must be within [0, 1]".into(),
            });
        }
        Ok(())
    }
}

/// Soil Adjusted Vegetation Index (Huete, 1988)
///
/// `SAVI = ((NIR - Red) / (NIR + Red + L)) * (1 + L)`
pub fn savi(bands: &BandMeans, params: SaviParams) -> Option<f64> {
    let l = params.l_factor;
    ratio(bands.nir - bands.red, bands.nir + bands.red + l).map(|v| v * (1.0 + l))
}

// ---------------------------------------------------------------------------
// MCARI
// ---------------------------------------------------------------------------

/// Modified Chlorophyll Absorption in Reflectance Index (Daughtry et al., 2000)
///
/// `MCARI = ((RedEdge - Red) - 0.2 * (RedEdge - Green)) * (RedEdge / Red)`
///
/// Not bounded and not sign-constrained.
pub fn mcari(bands: &BandMeans) -> Option<f64> {
    let re = bands.red_edge;
    let scale = ratio(re, bands.red)?;
    finite(((re - bands.red) - 0.2 * (re - bands.green)) * scale)
}

// ---------------------------------------------------------------------------
// CIred-edge
// ---------------------------------------------------------------------------

/// Red Edge Chlorophyll Index (Gitelson et al., 2003)
///
/// `CIred-edge = (NIR / RedEdge) - 1`
///
/// A ratio index, not bounded to [-1, 1]; typically 0 to 10 over crops.
pub fn ci_red_edge(bands: &BandMeans) -> Option<f64> {
    ratio(bands.nir, bands.red_edge).map(|v| v - 1.0)
}

// ---------------------------------------------------------------------------
// Index set
// ---------------------------------------------------------------------------

/// Compute one index by name
pub fn compute_index(index: VegetationIndex, bands: &BandMeans, params: SaviParams) -> Option<f64> {
    match index {
        VegetationIndex::Ndvi => ndvi(bands),
        VegetationIndex::Ndre => ndre(bands),
        VegetationIndex::Savi => savi(bands, params),
        VegetationIndex::Gndvi => gndvi(bands),
        VegetationIndex::Mcari => mcari(bands),
        VegetationIndex::CiRedEdge => ci_red_edge(bands),
    }
}

/// Compute every defined index for one set of band means
pub fn vegetation_indices(bands: &BandMeans, params: SaviParams) -> IndexSet {
    VegetationIndex::ALL
        .into_iter()
        .filter_map(|idx| compute_index(idx, bands, params).map(|v| (idx, v)))
        .collect()
}

/// Map a band-mean time series to an index time series, keeping order
pub fn index_time_series(
    series: &[Observation<BandMeans>],
    params: SaviParams,
) -> Vec<Observation<IndexSet>> {
    series
        .iter()
        .map(|obs| Observation::new(obs.date, vegetation_indices(&obs.value, params)))
        .collect()
}

/// Vegetation index calculator as an [`Algorithm`]
#[derive(Debug, Clone, Copy, Default)]
pub struct VegetationIndices;

impl Algorithm for VegetationIndices {
    type Input = BandMeans;
    type Output = IndexSet;
    type Params = SaviParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "VegetationIndices"
    }

    fn description(&self) -> &'static str {
        "Compute NDVI, NDRE, SAVI, GNDVI, MCARI and CIred-edge from band means"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        params.validate()?;
        Ok(vegetation_indices(&input, params))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
