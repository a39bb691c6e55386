//! Single-observation nitrogen estimation
//!
//! Every literature regression whose source index is present produces an
//! estimate. The estimates are fused by an R²-weighted mean, corrected for
//! soil background or canopy saturation via SAVI, and clamped to the range
//! that is physiologically possible for wheat.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wheatn_core::{Algorithm, Error, IndexSet, Result, VegetationIndex};

use super::quality::{classify_quality, EstimationQuality};
use super::regression::{LiteratureRegression, RegressionMethod, REGRESSION_TABLE};

/// Parameters for nitrogen estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorParams {
    /// Lower bound of plausible N content (%)
    pub n_min: f64,
    /// Upper bound of plausible N content (%)
    pub n_max: f64,
    /// SAVI below this marks sparse canopy with soil exposure
    pub savi_sparse_threshold: f64,
    /// SAVI above this marks a dense, saturating canopy
    pub savi_dense_threshold: f64,
    /// Multiplier applied for sparse canopy
    pub savi_sparse_factor: f64,
    /// Multiplier applied for dense canopy
    pub savi_dense_factor: f64,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            n_min: 1.5,
            n_max: 6.0,
            savi_sparse_threshold: 0.2,
            savi_dense_threshold: 0.7,
            savi_sparse_factor: 0.85,
            savi_dense_factor: 1.12,
        }
    }
}

impl EstimatorParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.n_min.is_finite() && self.n_max.is_finite() && self.n_min < self.n_max) {
            return Err(Error::InvalidParameter {
                name: "n_min..n_max",
                value: format!("{}..{}", self.n_min, self.n_max),
                reason: "bounds must be finite with n_min < n_max".into(),
            });
        }
        for (name, threshold) in [
            ("savi_sparse_threshold", self.savi_sparse_threshold),
            ("savi_dense_threshold", self.savi_dense_threshold),
        ] {
            if !threshold.is_finite() {
                return Err(Error::InvalidParameter {
                    name,
                    value: threshold.to_string(),
                    reason: "SAVI threshold must be finite".into(),
                });
            }
        }
        if self.savi_sparse_threshold > self.savi_dense_threshold {
            return Err(Error::InvalidParameter {
                name: "savi_sparse_threshold",
                value: self.savi_sparse_threshold.to_string(),
                reason: format!(
                    "must not exceed savi_dense_threshold ({})",
                    self.savi_dense_threshold
                ),
            });
        }
        for (name, factor) in [
            ("savi_sparse_factor", self.savi_sparse_factor),
            ("savi_dense_factor", self.savi_dense_factor),
        ] {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(Error::InvalidParameter {
                    name,
                    value: factor.to_string(),
                    reason: "must be a positive finite multiplier".into(),
                });
            }
        }
        Ok(())
    }

    /// Multiplicative SAVI correction; 1.0 when SAVI is absent or neutral
    pub fn savi_factor(&self, savi: Option<f64>) -> f64 {
        match savi {
            Some(s) if s < self.savi_sparse_threshold => self.savi_sparse_factor,
            Some(s) if s > self.savi_dense_threshold => self.savi_dense_factor,
            _ => 1.0,
        }
    }
}

/// One method's estimate with its published fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub estimate: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Aggregate uncertainty over the applicable methods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uncertainty {
    /// Root-mean-square of the per-method RMSEs
    pub rmse: f64,
    /// Mean of the per-method R²
    pub r2_mean: f64,
    /// Number of methods that contributed
    pub sample_size: usize,
}

impl Uncertainty {
    pub fn quality(&self) -> EstimationQuality {
        classify_quality(self)
    }
}

/// Fused nitrogen estimate for one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// Above-ground N content (%), clamped to the plausible range
    pub n_content: f64,
    pub confidence_intervals: BTreeMap<RegressionMethod, ConfidenceInterval>,
    pub uncertainty: Uncertainty,
    /// Normalized R² shares, summing to 1
    pub method_weights: BTreeMap<RegressionMethod, f64>,
    /// SAVI correction that was applied to the fused value
    pub savi_factor: f64,
}

impl EstimationResult {
    pub fn quality(&self) -> EstimationQuality {
        self.uncertainty.quality()
    }
}

/// Intermediate: one applicable regression and its prediction
struct MethodEstimate {
    regression: &'static LiteratureRegression,
    value: f64,
}

/// Nitrogen estimation algorithm
#[derive(Debug, Clone, Copy, Default)]
pub struct NitrogenEstimate;

impl Algorithm for NitrogenEstimate {
    type Input = IndexSet;
    type Output = EstimationResult;
    type Params = EstimatorParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "NitrogenEstimate"
    }

    fn description(&self) -> &'static str {
        "R²-weighted ensemble of literature regressions for winter wheat N content"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        estimate_nitrogen(&input, params)
    }
}

/// Estimate above-ground N content from one set of vegetation indices.
///
/// # Errors
/// - [`Error::EmptyIndexSet`] when `indices` is empty
/// - [`Error::IndexOutOfDomain`] when a value is outside its legal range
/// - [`Error::NoApplicableMethod`] when none of NDRE, CIred-edge, MCARI is present
/// - [`Error::InvalidParameter`] for inconsistent `params`
pub fn estimate_nitrogen(indices: &IndexSet, params: EstimatorParams) -> Result<EstimationResult> {
    params.validate()?;

    if indices.is_empty() {
        return Err(Error::EmptyIndexSet);
    }
    indices.validate()?;

    let estimates: Vec<MethodEstimate> = REGRESSION_TABLE
        .iter()
        .filter_map(|regression| {
            indices.get(regression.source).map(|x| MethodEstimate {
                regression,
                value: regression.predict(x),
            })
        })
        .collect();

    if estimates.is_empty() {
        return Err(Error::NoApplicableMethod);
    }

    let count = estimates.len() as f64;
    let total_weight: f64 = estimates.iter().map(|e| e.regression.r2).sum();
    let weighted_n = estimates
        .iter()
        .map(|e| e.value * e.regression.r2)
        .sum::<f64>()
        / total_weight;

    let savi_factor = params.savi_factor(indices.get(VegetationIndex::Savi));
    let n_content = (weighted_n * savi_factor).clamp(params.n_min, params.n_max);

    // Independent errors: combine as root-mean-square
    let rmse = (estimates
        .iter()
        .map(|e| e.regression.rmse * e.regression.rmse)
        .sum::<f64>()
        / count)
        .sqrt();
    let r2_mean = total_weight / count;

    let confidence_intervals = estimates
        .iter()
        .map(|e| {
            (
                e.regression.method,
                ConfidenceInterval {
                    estimate: e.value,
                    rmse: e.regression.rmse,
                    r2: e.regression.r2,
                },
            )
        })
        .collect();

    let method_weights = estimates
        .iter()
        .map(|e| (e.regression.method, e.regression.r2 / total_weight))
        .collect();

    debug!(
        "N estimate: fused {:.3}, SAVI factor {:.2}, clamped {:.3} from {} method(s)",
        weighted_n,
        savi_factor,
        n_content,
        estimates.len()
    );

    Ok(EstimationResult {
        n_content,
        confidence_intervals,
        uncertainty: Uncertainty {
            rmse,
            r2_mean,
            sample_size: estimates.len(),
        },
        method_weights,
        savi_factor,
    })
}
